//! Declarative constraint data shared by the rule catalog and the engine.
//!
//! Rules are plain values: the catalog builds them, the engine interprets
//! them, and nothing here evaluates input on its own.

use std::fmt;

use serde_json::{Map, Value};

use crate::types::UserId;

/// Raw or normalized request parameters keyed by field name.
pub type InputBag = Map<String, Value>;

/// A single constraint specifier attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required,
    /// Only validate the field when it is present in the input.
    Sometimes,
    /// A `null` value short-circuits the remaining constraints.
    Nullable,
    String,
    Integer,
    Numeric,
    Array,
    Boolean,
    Email,
    Date,
    /// chrono format string, e.g. `%Y-%m-%d`.
    DateFormat(String),
    Min(i64),
    Max(i64),
    Size(i64),
    In(Vec<String>),
    /// Requires a matching `<field>_confirmation` value.
    Confirmed,
    Unique {
        table: String,
        column: String,
        ignore: Option<UserId>,
    },
    Exists {
        table: String,
        column: String,
    },
}

impl Constraint {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::In(values.into_iter().map(Into::into).collect())
    }

    pub fn unique(table: &str, column: &str, ignore: Option<UserId>) -> Self {
        Constraint::Unique {
            table: table.to_string(),
            column: column.to_string(),
            ignore,
        }
    }

    pub fn exists(table: &str, column: &str) -> Self {
        Constraint::Exists {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// Rule name used as the message-table key and the error code.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::Sometimes => "sometimes",
            Constraint::Nullable => "nullable",
            Constraint::String => "string",
            Constraint::Integer => "integer",
            Constraint::Numeric => "numeric",
            Constraint::Array => "array",
            Constraint::Boolean => "boolean",
            Constraint::Email => "email",
            Constraint::Date => "date",
            Constraint::DateFormat(_) => "date_format",
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::Size(_) => "size",
            Constraint::In(_) => "in",
            Constraint::Confirmed => "confirmed",
            Constraint::Unique { .. } => "unique",
            Constraint::Exists { .. } => "exists",
        }
    }

    /// Implicit constraints run even when the field is absent.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Constraint::Required)
    }

    /// Whether the message for this constraint depends on the value's type.
    pub fn is_size_sensitive(&self) -> bool {
        matches!(
            self,
            Constraint::Min(_) | Constraint::Max(_) | Constraint::Size(_)
        )
    }

    /// Placeholder values substituted into message templates.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Constraint::Min(n) => vec![("min", n.to_string())],
            Constraint::Max(n) => vec![("max", n.to_string())],
            Constraint::Size(n) => vec![("size", n.to_string())],
            Constraint::DateFormat(format) => vec![("format", format.clone())],
            Constraint::In(values) => vec![("values", values.join(", "))],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::DateFormat(format) => write!(f, "date_format:{format}"),
            Constraint::Min(n) => write!(f, "min:{n}"),
            Constraint::Max(n) => write!(f, "max:{n}"),
            Constraint::Size(n) => write!(f, "size:{n}"),
            Constraint::In(values) => write!(f, "in:{}", values.join(",")),
            Constraint::Unique {
                table,
                column,
                ignore: Some(id),
            } => write!(f, "unique:{table},{column},{id}"),
            Constraint::Unique { table, column, .. } => write!(f, "unique:{table},{column}"),
            Constraint::Exists { table, column } => write!(f, "exists:{table},{column}"),
            other => f.write_str(other.name()),
        }
    }
}

/// A field path mapped to its ordered constraints.
///
/// Paths are dotted; `*` matches every element of an array or object
/// (`roles.*`, `filter.status`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub constraints: Vec<Constraint>,
}

impl FieldRule {
    pub fn has(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.name() == name)
    }

    /// First path segment, i.e. the top-level input key this rule covers.
    pub fn root(&self) -> &str {
        self.field.split('.').next().unwrap_or(&self.field)
    }
}

/// Ordered field rules for one operation. Declaration order is preserved and
/// drives the order of reported errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule, replacing an earlier declaration for the same path.
    pub fn field<I>(mut self, field: &str, constraints: I) -> Self
    where
        I: IntoIterator<Item = Constraint>,
    {
        let rule = FieldRule {
            field: field.to_string(),
            constraints: constraints.into_iter().collect(),
        };
        match self.rules.iter_mut().find(|r| r.field == field) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule covers the given top-level input key.
    pub fn covers(&self, key: &str) -> bool {
        self.rules.iter().any(|r| r.root() == key)
    }

    /// Restricts `input` to the top-level keys named by this rule set.
    pub fn sanitize(&self, input: &InputBag) -> InputBag {
        input
            .iter()
            .filter(|(key, _)| self.covers(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
