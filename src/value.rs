//! Current-value resolution over stored settings and field defaults.

use indexmap::IndexMap;
use toml::{Table, Value};

use crate::model::FieldModel;

/// Truthiness used by the resolver and the required check.
///
/// `""`, `"0"`, `0`, `0.0`, `false` and empty arrays or tables are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::String(s) => !is_blank(s),
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Boolean(b) => *b,
        Value::Array(a) => !a.is_empty(),
        Value::Table(t) => !t.is_empty(),
        Value::Datetime(_) => true,
    }
}

/// A submitted string that counts as "no value".
pub fn is_blank(s: &str) -> bool {
    s.is_empty() || s == "0"
}

/// Resolves the current value of `slug`.
///
/// A truthy stored value wins, then a truthy default, otherwise there is no
/// value. A falsy stored value (`0`, `false`, `""`) is indistinguishable from
/// an unset one and is masked by a truthy default.
pub fn resolve<'a>(stored: &'a Table, defaults: &'a IndexMap<String, Value>, slug: &str) -> Option<&'a Value> {
    if let Some(value) = stored.get(slug).filter(|v| is_truthy(v)) {
        return Some(value);
    }
    defaults.get(slug).filter(|v| is_truthy(v))
}

/// The value shown in the input of the field declared as `slug`: whatever is
/// stored, even when falsy, else the field default.
pub fn display_value<'a>(stored: &'a Table, slug: &str, field: &'a FieldModel) -> &'a Value {
    stored.get(slug).unwrap_or(&field.default)
}

/// Renders a value as the string a form input or sanitized blob carries.
///
/// Scalars use their natural text form; arrays and tables become JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(true) => "1".to_string(),
        Value::Boolean(false) => String::new(),
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(_) | Value::Table(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
