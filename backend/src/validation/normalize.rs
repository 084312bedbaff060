//! Pre-validation input normalization.
//!
//! Blank strings are converted to null first. After that each step only
//! touches its own field and is a no-op when that field is absent.
//! [`normalize`] runs them in a fixed order.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use super::operation::OperationKind;
use super::rules::InputBag;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*(?:>|$)").expect("valid regex"));

static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid regex")
});

const DEFAULT_SORT_DIRECTION: &str = "asc";
const FILTER_PARAMETER_KEYS: [&str; 5] = ["search", "orderBy", "sortedBy", "per_page", "filter"];

/// Applies every normalization step for `kind`, in order.
pub fn normalize(mut input: InputBag, kind: Option<OperationKind>) -> InputBag {
    trim_strings(&mut input);
    strip_search_markup(&mut input);
    coerce_per_page(&mut input);
    normalize_ordering(&mut input);
    normalize_roles(&mut input);
    drop_blank_password(&mut input, kind);
    input
}

/// Trims every string, nested ones included, and replaces strings left
/// empty with null.
pub fn trim_strings(input: &mut InputBag) {
    for value in input.values_mut() {
        trim_value(value);
    }
}

fn trim_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim().to_string();
            *value = if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed)
            };
        }
        Value::Array(items) => items.iter_mut().for_each(trim_value),
        Value::Object(map) => map.values_mut().for_each(trim_value),
        _ => {}
    }
}

/// Removes tag-like sequences from `search`. An unterminated tag swallows
/// the rest of the string.
pub fn strip_search_markup(input: &mut InputBag) {
    if let Some(Value::String(search)) = input.get_mut("search") {
        let stripped = MARKUP_RE.replace_all(search, "").into_owned();
        *search = stripped;
    }
}

pub fn coerce_per_page(input: &mut InputBag) {
    if let Some(per_page) = input.get_mut("per_page") {
        *per_page = Value::Number(Number::from(coerce_int(per_page)));
    }
}

/// Lower-cases `orderBy` and `sortedBy`, defaulting the direction to `asc`
/// when only a sort field was given.
pub fn normalize_ordering(input: &mut InputBag) {
    match input.get_mut("orderBy") {
        Some(Value::String(order_by)) => *order_by = order_by.to_lowercase(),
        Some(_) => {}
        None => return,
    }

    match input.get_mut("sortedBy") {
        Some(Value::String(sorted_by)) => *sorted_by = sorted_by.to_lowercase(),
        Some(Value::Null) | None => {
            input.insert(
                "sortedBy".to_string(),
                Value::String(DEFAULT_SORT_DIRECTION.to_string()),
            );
        }
        Some(_) => {}
    }
}

/// Coerces every role to an integer and drops non-positive identifiers,
/// keeping the original order.
pub fn normalize_roles(input: &mut InputBag) {
    let items: Vec<&Value> = match input.get("roles") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(items)) => items.values().collect(),
        _ => return,
    };

    let roles: Vec<Value> = items
        .into_iter()
        .map(coerce_int)
        .filter(|role| *role > 0)
        .map(|role| Value::Number(Number::from(role)))
        .collect();
    input.insert("roles".to_string(), Value::Array(roles));
}

/// On update, an empty password means "keep the current one", so the field
/// is removed before the optional password rule sees it.
pub fn drop_blank_password(input: &mut InputBag, kind: Option<OperationKind>) {
    if kind != Some(OperationKind::Update) {
        return;
    }
    if input.get("password").is_some_and(is_blank) {
        input.remove("password");
    }
}

/// The listing parameters a query layer cares about, with empty values
/// dropped.
pub fn filter_parameters(input: &InputBag) -> InputBag {
    FILTER_PARAMETER_KEYS
        .iter()
        .filter_map(|key| input.get(*key).map(|value| (key.to_string(), value)))
        .filter(|(_, value)| !is_falsy(value))
        .map(|(key, value)| (key, value.clone()))
        .collect()
}

/// Lenient integer conversion: leading numeric prefix of strings, truncated
/// floats, booleans as 0/1, anything unparseable as 0.
pub fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .unwrap_or_else(|| truncate(n.as_f64().unwrap_or(0.0))),
        Value::String(s) => parse_leading_int(s),
        Value::Bool(b) => i64::from(*b),
        Value::Null => 0,
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

fn parse_leading_int(s: &str) -> i64 {
    let Some(prefix) = LEADING_NUMBER_RE.captures(s).and_then(|c| c.get(1)) else {
        return 0;
    };
    let prefix = prefix.as_str();
    match prefix.parse::<i64>() {
        Ok(n) => n,
        Err(_) => truncate(prefix.parse::<f64>().unwrap_or(0.0)),
    }
}

fn truncate(f: f64) -> i64 {
    if f.is_finite() {
        // `as` saturates at the i64 bounds
        f.trunc() as i64
    } else {
        0
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
