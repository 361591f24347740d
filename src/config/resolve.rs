//! `${...}` reference expansion.
//!
//! Config layers can cross-reference values with `${section.field}` syntax.
//! The built-in default tables and file templates use the same syntax against
//! a flat scope. Use `$${...}` to escape and produce a literal `${...}`.

use super::ConfigError;
use toml::{Table, Value};

/// Resolves all `${path.to.field}` references in the configuration table.
///
/// Referenced strings are themselves resolved before substitution, so chains
/// work in any declaration order. Escaped `$${...}` sequences are never
/// re-expanded. Returns an error if a circular reference is detected or a
/// referenced path doesn't exist.
pub fn resolve_references(table: &mut Table) -> Result<(), ConfigError> {
    let root = table.clone();
    let mut stack = Vec::new();
    resolve_table(table, &root, &mut stack)
}

/// Expands `${key}` placeholders in `s` against a flat scope table.
///
/// Only top-level keys are looked up and substituted values are inserted
/// verbatim.
pub fn interpolate(s: &str, scope: &Table) -> Result<String, ConfigError> {
    expand(s, |key| {
        let value = scope
            .get(key)
            .ok_or_else(|| ConfigError::ReferenceNotFound(key.to_string()))?;
        scalar_to_string(value, key)
    })
}

/// Walks `s`, handing every `${...}` body to `lookup` and splicing in the result.
/// Handles `$$` escape sequences.
fn expand<F>(s: &str, mut lookup: F) -> Result<String, ConfigError>
where
    F: FnMut(&str) -> Result<String, ConfigError>,
{
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            match chars.peek() {
                Some('$') => {
                    // Escape sequence: $$ -> $
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next(); // consume '{'
                    let path = consume_until(&mut chars, '}')
                        .ok_or(ConfigError::UnclosedReference)?;
                    result.push_str(&lookup(path.trim())?);
                }
                _ => {
                    // Just a lone $
                    result.push('$');
                }
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_table(table: &mut Table, root: &Table, stack: &mut Vec<String>) -> Result<(), ConfigError> {
    for (_key, value) in table.iter_mut() {
        resolve_value(value, root, stack)?;
    }
    Ok(())
}

/// Resolves references in a single value (recursively for tables/arrays).
fn resolve_value(value: &mut Value, root: &Table, stack: &mut Vec<String>) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            *s = resolve_string(s, root, stack)?;
            Ok(())
        }
        Value::Table(t) => resolve_table(t, root, stack),
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                resolve_value(item, root, stack)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn resolve_string(s: &str, root: &Table, stack: &mut Vec<String>) -> Result<String, ConfigError> {
    expand(s, |path| lookup_path(root, path, stack))
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None // Delimiter not found
}

/// Looks up a dotted path in the TOML table and returns the resolved value as a string.
fn lookup_path(root: &Table, path: &str, stack: &mut Vec<String>) -> Result<String, ConfigError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidReferencePath(path.to_string()));
    }
    if stack.iter().any(|p| p == path) {
        return Err(ConfigError::CircularReference(path.to_string()));
    }

    let not_found = || ConfigError::ReferenceNotFound(path.to_string());

    let mut current = root.get(parts[0]).ok_or_else(not_found)?;
    for part in &parts[1..] {
        current = current
            .as_table()
            .and_then(|t| t.get(*part))
            .ok_or_else(not_found)?;
    }

    match current {
        Value::String(raw) => {
            stack.push(path.to_string());
            let resolved = resolve_string(raw, root, stack);
            stack.pop();
            resolved
        }
        other => scalar_to_string(other, path),
    }
}

/// Converts a scalar TOML value to its string representation.
fn scalar_to_string(value: &Value, path: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => Err(ConfigError::NonScalarReference(path.to_string())),
    }
}
