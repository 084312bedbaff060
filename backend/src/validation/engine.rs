//! Generic constraint engine.
//!
//! Interprets a [`RuleSet`] against normalized input. Rules are evaluated in
//! declaration order; a field stops collecting errors after its `required`
//! check fails, otherwise every failing constraint is reported.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use validator::{ValidateEmail, ValidationError};

use super::errors::FieldErrors;
use super::messages::{AttributeLabels, MessageResolver, MessageTable, SizeKind};
use super::presence::PresenceVerifier;
use super::rules::{Constraint, FieldRule, InputBag, RuleSet};

pub struct Validator<'a> {
    rules: &'a RuleSet,
    resolver: MessageResolver<'a>,
    presence: &'a dyn PresenceVerifier,
}

impl<'a> Validator<'a> {
    pub fn new(
        rules: &'a RuleSet,
        messages: &'a MessageTable,
        labels: &'a AttributeLabels,
        presence: &'a dyn PresenceVerifier,
    ) -> Self {
        Self {
            rules,
            resolver: MessageResolver::new(messages, labels),
            presence,
        }
    }

    /// Returns the input restricted to the rule set's fields, or every
    /// failure keyed by concrete field path.
    pub fn validate(&self, input: &InputBag) -> Result<InputBag, FieldErrors> {
        let mut errors = FieldErrors::new();
        for rule in self.rules.iter() {
            for (path, value) in resolve_paths(input, &rule.field) {
                self.check_field(rule, &path, value, input, &mut errors);
            }
        }

        if errors.is_empty() {
            Ok(self.rules.sanitize(input))
        } else {
            Err(errors)
        }
    }

    fn check_field(
        &self,
        rule: &FieldRule,
        path: &str,
        value: Option<&Value>,
        input: &InputBag,
        errors: &mut FieldErrors,
    ) {
        if value.is_none() && rule.has("sometimes") {
            return;
        }
        if matches!(value, Some(Value::Null)) && rule.has("nullable") {
            return;
        }
        let skip_explicit = value.map_or(true, is_blank_string);

        for constraint in &rule.constraints {
            if matches!(constraint, Constraint::Sometimes | Constraint::Nullable) {
                continue;
            }
            if skip_explicit && !constraint.is_implicit() {
                continue;
            }
            if let Some(error) = self.evaluate(constraint, rule, path, value, input) {
                let kind = value
                    .filter(|_| constraint.is_size_sensitive())
                    .map(|v| size_kind(rule, v));
                let message = self.resolver.render(path, &rule.field, &error, kind);
                errors.add(path, message);
                if constraint.is_implicit() {
                    break;
                }
            }
        }
    }

    fn evaluate(
        &self,
        constraint: &Constraint,
        rule: &FieldRule,
        path: &str,
        value: Option<&Value>,
        input: &InputBag,
    ) -> Option<ValidationError> {
        let passes = match (constraint, value) {
            (Constraint::Required, value) => value.is_some_and(is_filled),
            (_, None) => true,
            (Constraint::Sometimes | Constraint::Nullable, _) => true,
            (Constraint::String, Some(v)) => v.is_string(),
            (Constraint::Integer, Some(v)) => is_integer(v),
            (Constraint::Numeric, Some(v)) => as_number(v).is_some(),
            (Constraint::Array, Some(v)) => v.is_array() || v.is_object(),
            (Constraint::Boolean, Some(v)) => is_boolean(v),
            (Constraint::Email, Some(v)) => v.as_str().is_some_and(|s| s.validate_email()),
            (Constraint::Date, Some(v)) => v.as_str().and_then(parse_date_value).is_some(),
            (Constraint::DateFormat(format), Some(v)) => {
                v.as_str().is_some_and(|s| matches_format(s, format))
            }
            (Constraint::Min(min), Some(v)) => size_of(rule, v) >= *min as f64,
            (Constraint::Max(max), Some(v)) => size_of(rule, v) <= *max as f64,
            (Constraint::Size(size), Some(v)) => size_of(rule, v) == *size as f64,
            (Constraint::In(allowed), Some(v)) => {
                scalar_text(v).is_some_and(|text| allowed.iter().any(|a| *a == text))
            }
            (Constraint::Confirmed, Some(v)) => {
                input.get(&format!("{path}_confirmation")) == Some(v)
            }
            (Constraint::Unique { table, column, ignore }, Some(v)) => {
                self.presence.count(table, column, v, *ignore) == 0
            }
            (Constraint::Exists { table, column }, Some(v)) => {
                self.presence.count(table, column, v, None) > 0
            }
        };

        if passes {
            return None;
        }
        let mut error = ValidationError::new(constraint.name());
        for (name, value) in constraint.params() {
            error.add_param(Cow::Borrowed(name), &value);
        }
        Some(error)
    }
}

/// Expands a declared path into the concrete paths present in `input`.
///
/// Named segments always yield a path (with no value when missing); `*`
/// yields one path per element and nothing when there is nothing to expand.
fn resolve_paths<'v>(input: &'v InputBag, pattern: &str) -> Vec<(String, Option<&'v Value>)> {
    let segments: Vec<&str> = pattern.split('.').collect();
    let mut out = Vec::new();
    let Some((head, tail)) = segments.split_first() else {
        return out;
    };

    if *head == "*" {
        for (key, value) in input {
            walk(key.clone(), Some(value), tail, &mut out);
        }
    } else {
        walk(head.to_string(), input.get(*head), tail, &mut out);
    }
    out
}

fn walk<'v>(
    path: String,
    value: Option<&'v Value>,
    segments: &[&str],
    out: &mut Vec<(String, Option<&'v Value>)>,
) {
    let Some((segment, tail)) = segments.split_first() else {
        out.push((path, value));
        return;
    };

    if *segment == "*" {
        match value {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    walk(format!("{path}.{index}"), Some(item), tail, out);
                }
            }
            Some(Value::Object(map)) => {
                for (key, item) in map {
                    walk(format!("{path}.{key}"), Some(item), tail, out);
                }
            }
            _ => {}
        }
        return;
    }

    let child = match value {
        Some(Value::Object(map)) => map.get(*segment),
        Some(Value::Array(items)) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    walk(format!("{path}.{segment}"), child, tail, out);
}

fn is_blank_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0 | 1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1"),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Numeric strings count as numbers only when the field is declared numeric.
fn size_kind(rule: &FieldRule, value: &Value) -> SizeKind {
    match value {
        Value::Number(_) => SizeKind::Numeric,
        Value::Array(_) | Value::Object(_) => SizeKind::Array,
        Value::String(_)
            if (rule.has("integer") || rule.has("numeric")) && as_number(value).is_some() =>
        {
            SizeKind::Numeric
        }
        _ => SizeKind::String,
    }
}

fn size_of(rule: &FieldRule, value: &Value) -> f64 {
    match (size_kind(rule, value), value) {
        (SizeKind::Numeric, v) => as_number(v).unwrap_or(0.0),
        (_, Value::Array(items)) => items.len() as f64,
        (_, Value::Object(map)) => map.len() as f64,
        (_, Value::String(s)) => s.chars().count() as f64,
        (_, Value::Bool(true)) => 1.0,
        _ => 0.0,
    }
}

/// Accepts RFC3339 timestamps, `YYYY-MM-DD HH:MM:SS` and plain dates.
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn matches_format(value: &str, format: &str) -> bool {
    NaiveDateTime::parse_from_str(value, format).is_ok()
        || NaiveDate::parse_from_str(value, format).is_ok()
        || NaiveTime::parse_from_str(value, format).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use crate::validation::presence::MockPresenceVerifier;
    use mockall::predicate::eq;
    use serde_json::json;

    fn bag(value: Value) -> InputBag {
        value.as_object().cloned().expect("object literal")
    }

    fn run(rules: &RuleSet, input: Value, presence: &dyn PresenceVerifier) -> Result<InputBag, FieldErrors> {
        let messages = MessageTable::defaults();
        let labels = AttributeLabels::new();
        Validator::new(rules, &messages, &labels, presence).validate(&bag(input))
    }

    fn no_lookups() -> MockPresenceVerifier {
        let mut presence = MockPresenceVerifier::new();
        presence.expect_count().never();
        presence
    }

    #[test]
    fn empty_rule_set_accepts_anything_and_keeps_nothing() {
        let validated = run(&RuleSet::new(), json!({"name": 1, "x": [1]}), &no_lookups())
            .expect("no rules, no errors");
        assert!(validated.is_empty());
    }

    #[test]
    fn required_failure_stops_the_field() {
        let rules = RuleSet::new().field(
            "name",
            [Constraint::Required, Constraint::String, Constraint::Max(3)],
        );
        let errors = run(&rules, json!({"name": ""}), &no_lookups()).expect_err("blank name");
        assert_eq!(
            errors.get("name"),
            Some(&["The name field is required.".to_string()][..])
        );
    }

    #[test]
    fn explicit_failures_accumulate_in_rule_order() {
        let rules = RuleSet::new().field(
            "code",
            [Constraint::String, Constraint::one_of(["a", "b"])],
        );
        let errors = run(&rules, json!({"code": 7}), &no_lookups()).expect_err("bad code");
        assert_eq!(
            errors.get("code"),
            Some(
                &[
                    "The code field must be a string.".to_string(),
                    "The selected code value is invalid.".to_string()
                ][..]
            )
        );
    }

    #[test]
    fn absent_optional_fields_are_skipped() {
        let rules = RuleSet::new()
            .field("status", [Constraint::Sometimes, Constraint::String])
            .field("nickname", [Constraint::String, Constraint::Max(5)]);
        assert!(run(&rules, json!({}), &no_lookups()).is_ok());
    }

    #[test]
    fn nullable_null_skips_remaining_constraints() {
        let rules = RuleSet::new().field(
            "search",
            [Constraint::Sometimes, Constraint::Nullable, Constraint::String],
        );
        let validated = run(&rules, json!({"search": null}), &no_lookups()).expect("null ok");
        assert_eq!(validated["search"], Value::Null);
    }

    #[test]
    fn size_rules_measure_by_runtime_type() {
        let rules = RuleSet::new()
            .field("per_page", [Constraint::Min(1), Constraint::Max(100)])
            .field("name", [Constraint::Max(3)])
            .field("tags", [Constraint::Min(2)]);
        let errors = run(
            &rules,
            json!({"per_page": 101, "name": "abcd", "tags": ["x"]}),
            &no_lookups(),
        )
        .expect_err("all out of bounds");

        assert_eq!(
            errors.first("per_page"),
            Some("The per page field may not be greater than 100.")
        );
        assert_eq!(
            errors.first("name"),
            Some("The name field may not be greater than 3 characters.")
        );
        assert_eq!(
            errors.first("tags"),
            Some("The tags field must contain at least 2 items.")
        );
    }

    #[test]
    fn numeric_strings_are_sized_as_numbers_on_numeric_fields() {
        let rules = RuleSet::new().field("age", [Constraint::Integer, Constraint::Min(18)]);
        let errors = run(&rules, json!({"age": "9"}), &no_lookups()).expect_err("too young");
        assert_eq!(errors.first("age"), Some("The age field must be at least 18."));
    }

    #[test]
    fn wildcard_rules_report_concrete_paths() {
        let rules = RuleSet::new().field("roles.*", [Constraint::Integer]);
        let errors = run(&rules, json!({"roles": [1, "x", 3]}), &no_lookups())
            .expect_err("non-integer role");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["roles.1"]);
    }

    #[test]
    fn nested_paths_reach_into_objects() {
        let rules = RuleSet::new().field(
            "filter.status",
            [Constraint::Sometimes, Constraint::one_of(["active", "inactive"])],
        );
        let errors = run(&rules, json!({"filter": {"status": "gone"}}), &no_lookups())
            .expect_err("bad status");
        assert!(errors.has("filter.status"));
        assert!(run(&rules, json!({"filter": {}}), &no_lookups()).is_ok());
    }

    #[test]
    fn unique_passes_ignore_through_to_the_verifier() {
        let own = UserId::new();
        let mut presence = MockPresenceVerifier::new();
        presence
            .expect_count()
            .withf(move |table, column, value, ignore| {
                table == "users" && column == "username" && value == &json!("ada") && *ignore == Some(own)
            })
            .times(1)
            .return_const(0usize);

        let rules = RuleSet::new().field(
            "username",
            [Constraint::unique("users", "username", Some(own))],
        );
        assert!(run(&rules, json!({"username": "ada"}), &presence).is_ok());
    }

    #[test]
    fn exists_fails_when_no_row_matches() {
        let mut presence = MockPresenceVerifier::new();
        presence
            .expect_count()
            .with(eq("roles"), eq("id"), eq(json!(9)), eq(None::<UserId>))
            .return_const(0usize);

        let rules = RuleSet::new().field("role", [Constraint::exists("roles", "id")]);
        let errors = run(&rules, json!({"role": 9}), &presence).expect_err("unknown role");
        assert_eq!(errors.first("role"), Some("The selected role value is invalid."));
    }

    #[test]
    fn scalar_checks() {
        let rules = RuleSet::new()
            .field("email", [Constraint::Email])
            .field("born", [Constraint::Date])
            .field("at", [Constraint::DateFormat("%H:%M".to_string())])
            .field("flag", [Constraint::Boolean])
            .field("score", [Constraint::Numeric])
            .field("pin", [Constraint::Size(4)])
            .field("secret", [Constraint::Confirmed]);

        let ok = json!({
            "email": "ada@example.com",
            "born": "1815-12-10",
            "at": "09:30",
            "flag": "1",
            "score": "4.5",
            "pin": "1234",
            "secret": "s3cret",
            "secret_confirmation": "s3cret"
        });
        assert!(run(&rules, ok, &no_lookups()).is_ok());

        let bad = json!({
            "email": "not-an-email",
            "born": "yesterday",
            "at": "half past nine",
            "flag": "yes",
            "score": "many",
            "pin": "123",
            "secret": "s3cret",
            "secret_confirmation": "other"
        });
        let errors = run(&rules, bad, &no_lookups()).expect_err("all invalid");
        assert_eq!(errors.len(), 7);
        assert_eq!(
            errors.first("at"),
            Some("The at field does not match the format %H:%M.")
        );
        assert_eq!(errors.first("pin"), Some("The pin field must be 4 characters."));
    }

    #[test]
    fn parse_date_value_supports_rfc3339_sql_and_plain_date() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 4).expect("valid date");
        assert_eq!(parse_date_value("2026-02-04T09:10:11+09:00"), Some(expected));
        assert_eq!(parse_date_value("2026-02-04 09:10:11"), Some(expected));
        assert_eq!(parse_date_value("2026-02-04"), Some(expected));
        assert!(parse_date_value("2026-13-01").is_none());
    }
}
