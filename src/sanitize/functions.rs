//! Named string sanitizers and their registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the generic safe-text sanitizer every field falls back to.
pub const TEXT_FIELD: &str = "sanitize_text_field";

type SanitizeFn = dyn Fn(&str) -> String + Send + Sync;

/// A pure `&str -> String` transformation with the name it was registered under.
#[derive(Clone)]
pub struct Sanitizer {
    name: Arc<str>,
    func: Arc<SanitizeFn>,
}

impl Sanitizer {
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The generic safe-text sanitizer.
    pub fn text_field() -> Self {
        Self::new(TEXT_FIELD, sanitize_text_field)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, input: &str) -> String {
        (self.func)(input)
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sanitizer").field(&self.name).finish()
    }
}

/// Sanitizers addressable by name from a field's `sanitize_func`.
///
/// `SanitizerRegistry::default()` holds the built-ins; hosts add their own
/// with [`register`](Self::register).
#[derive(Debug, Clone)]
pub struct SanitizerRegistry {
    entries: HashMap<String, Sanitizer>,
}

impl Default for SanitizerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(TEXT_FIELD, sanitize_text_field)
            .register("sanitize_textarea_field", sanitize_textarea_field)
            .register("sanitize_title", sanitize_title)
            .register("sanitize_key", sanitize_key)
            .register("sanitize_email", sanitize_email)
            .register("absint", absint);
        registry
    }
}

impl SanitizerRegistry {
    /// A registry without the built-ins.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `func` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        let sanitizer = Sanitizer::new(name.as_str(), func);
        self.entries.insert(name, sanitizer);
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.register(name, func);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Sanitizer> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Single-line safe text: tags removed, percent-encoded octets dropped,
/// control characters and whitespace runs collapsed to one space, trimmed.
pub fn sanitize_text_field(input: &str) -> String {
    let text = strip_percent_octets(&strip_tags(input));
    collapse_whitespace(&text)
}

/// Like [`sanitize_text_field`] but keeps line breaks.
pub fn sanitize_textarea_field(input: &str) -> String {
    let text = strip_percent_octets(&strip_tags(input)).replace("\r\n", "\n");
    let lines: Vec<String> = text.split(['\n', '\r']).map(collapse_whitespace).collect();
    lines.join("\n").trim().to_string()
}

/// Lowercase dash-separated slug: `"My App!"` becomes `"my-app"`.
pub fn sanitize_title(input: &str) -> String {
    let text = strip_entities(&strip_tags(input)).to_lowercase();
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        let ch = fold_accent(ch).unwrap_or(ch);
        match ch {
            'a'..='z' | '0'..='9' | '_' | '-' => slug.push(ch),
            '.' | '/' => slug.push('-'),
            c if c.is_whitespace() => slug.push('-'),
            _ => {}
        }
    }
    collapse_dashes(&slug)
}

/// Lowercase keys limited to `[a-z0-9_-]`.
pub fn sanitize_key(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
        .collect()
}

/// Strips characters not allowed in an address; anything that cannot be an
/// address becomes empty.
pub fn sanitize_email(input: &str) -> String {
    let input = input.trim();
    let Some((local, domain)) = input.split_once('@') else {
        return String::new();
    };

    let local: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(*c))
        .collect();
    if local.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = domain
        .split('.')
        .map(|label| {
            label
                .to_ascii_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .trim_matches('-')
                .to_string()
        })
        .filter(|label| !label.is_empty())
        .collect();
    if labels.len() < 2 {
        return String::new();
    }

    format!("{local}@{}", labels.join("."))
}

/// Non-negative integer from the leading digits, `0` when there are none.
pub fn absint(input: &str) -> String {
    let trimmed = input.trim_start();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    }
}

/// Removes markup. `<script>`/`<style>` lose their contents too; a `<` that
/// does not open a tag is kept as `&lt;`.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let opens_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));

        match after.find('>') {
            Some(end) if opens_tag => {
                let tag = &after[..end];
                rest = &after[end + 1..];
                if let Some(name) = raw_text_element(tag) {
                    rest = skip_past_closing(rest, name);
                }
            }
            _ => {
                out.push_str("&lt;");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn raw_text_element(tag: &str) -> Option<&'static str> {
    let name: String = tag
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match name.as_str() {
        "script" => Some("script"),
        "style" => Some("style"),
        _ => None,
    }
}

fn skip_past_closing<'a>(rest: &'a str, name: &str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let closing = format!("</{name}");
    let Some(start) = lower.find(&closing) else {
        return "";
    };
    match lower[start..].find('>') {
        Some(end) => &rest[start + end + 1..],
        None => "",
    }
}

/// Drops `%XX` sequences until none remain.
fn strip_percent_octets(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut out = String::with_capacity(current.len());
        let mut chars = current.chars().peekable();
        let mut removed = false;
        while let Some(ch) = chars.next() {
            if ch == '%' {
                let mut lookahead = chars.clone();
                if let (Some(a), Some(b)) = (lookahead.next(), lookahead.next()) {
                    if a.is_ascii_hexdigit() && b.is_ascii_hexdigit() {
                        chars = lookahead;
                        removed = true;
                        continue;
                    }
                }
            }
            out.push(ch);
        }
        if !removed {
            return out;
        }
        current = out;
    }
}

/// Removes `&name;` style entities.
fn strip_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) if end > 0 && !after[..end].contains(char::is_whitespace) => {
                rest = &after[end + 1..];
            }
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_dashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('-').to_string()
}

fn fold_accent(ch: char) -> Option<char> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}
