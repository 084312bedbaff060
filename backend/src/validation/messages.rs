//! Error message templates, attribute labels and their rendering.
//!
//! A [`MessageTable`] maps either `field.rule` or a bare `rule` to a
//! template. Size-sensitive rules (`min`, `max`, `size`) may carry one
//! template per value type. Tables merge shallowly: an override replaces the
//! entry with the exact same key and nothing else.

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;
use validator::ValidationError;

use super::errors::{FieldErrors, FormattedFieldError};

/// Used when neither a field-specific nor a rule-wide template exists.
pub const FALLBACK_MESSAGE: &str = "The :attribute field is invalid.";

/// Runtime type of a value as far as size rules are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKind {
    Numeric,
    String,
    Array,
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageTemplate {
    Text(String),
    BySize(HashMap<SizeKind, String>),
}

impl MessageTemplate {
    pub fn by_size<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = (SizeKind, S)>,
        S: Into<String>,
    {
        MessageTemplate::BySize(
            variants
                .into_iter()
                .map(|(kind, text)| (kind, text.into()))
                .collect(),
        )
    }

    fn pick(&self, kind: Option<SizeKind>) -> Option<&str> {
        match self {
            MessageTemplate::Text(text) => Some(text),
            MessageTemplate::BySize(variants) => {
                kind.and_then(|k| variants.get(&k)).map(String::as_str)
            }
        }
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        MessageTemplate::Text(text.to_string())
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        MessageTemplate::Text(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageTable {
    entries: HashMap<String, MessageTemplate>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic messages for every rule the engine understands.
    pub fn defaults() -> Self {
        use SizeKind::{Array, File, Numeric};

        Self::new()
            .with("required", "The :attribute field is required.")
            .with("string", "The :attribute field must be a string.")
            .with("integer", "The :attribute field must be an integer.")
            .with("numeric", "The :attribute field must be a number.")
            .with("array", "The :attribute field must be an array.")
            .with("email", "The :attribute field must be a valid email address.")
            .with("unique", "The :attribute field value already exists.")
            .with("exists", "The selected :attribute value is invalid.")
            .with(
                "max",
                MessageTemplate::by_size([
                    (Numeric, "The :attribute field may not be greater than :max."),
                    (SizeKind::String, "The :attribute field may not be greater than :max characters."),
                    (Array, "The :attribute field may not contain more than :max items."),
                ]),
            )
            .with(
                "min",
                MessageTemplate::by_size([
                    (Numeric, "The :attribute field must be at least :min."),
                    (SizeKind::String, "The :attribute field must be at least :min characters."),
                    (Array, "The :attribute field must contain at least :min items."),
                ]),
            )
            .with("in", "The selected :attribute value is invalid.")
            .with("date", "The :attribute field is not a valid date.")
            .with(
                "date_format",
                "The :attribute field does not match the format :format.",
            )
            .with("boolean", "The :attribute field must be a boolean.")
            .with("confirmed", "The :attribute field confirmation does not match.")
            .with(
                "size",
                MessageTemplate::by_size([
                    (Numeric, "The :attribute field must be :size."),
                    (File, "The file size in the :attribute field must be :size KB."),
                    (SizeKind::String, "The :attribute field must be :size characters."),
                    (Array, "The :attribute field must contain :size items."),
                ]),
            )
    }

    pub fn with(mut self, key: &str, template: impl Into<MessageTemplate>) -> Self {
        self.insert(key, template);
        self
    }

    pub fn insert(&mut self, key: &str, template: impl Into<MessageTemplate>) {
        self.entries.insert(key.to_string(), template.into());
    }

    pub fn get(&self, key: &str) -> Option<&MessageTemplate> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layers `overrides` on top of `self` by exact key.
    pub fn merge(mut self, overrides: MessageTable) -> Self {
        self.entries.extend(overrides.entries);
        self
    }

    /// Picks the template for `rule` failing on the field declared as
    /// `pattern`: `pattern.rule` first, then `rule`, then the fallback.
    pub fn template_for(&self, pattern: &str, rule: &str, kind: Option<SizeKind>) -> &str {
        self.get(&format!("{pattern}.{rule}"))
            .and_then(|t| t.pick(kind))
            .or_else(|| self.get(rule).and_then(|t| t.pick(kind)))
            .unwrap_or(FALLBACK_MESSAGE)
    }
}

/// Display names substituted for `:attribute`, keyed by declared field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeLabels {
    labels: HashMap<String, String>,
}

impl AttributeLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, label: &str) -> Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    /// Label for a declared path, or the concrete field with underscores
    /// turned into spaces.
    pub fn label<'a>(&'a self, pattern: &str, field: &'a str) -> Cow<'a, str> {
        match self.labels.get(pattern) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None if field.contains('_') => Cow::Owned(field.replace('_', " ")),
            None => Cow::Borrowed(field),
        }
    }
}

/// Renders engine violations into human-readable messages.
#[derive(Debug, Clone, Copy)]
pub struct MessageResolver<'a> {
    messages: &'a MessageTable,
    labels: &'a AttributeLabels,
}

impl<'a> MessageResolver<'a> {
    pub fn new(messages: &'a MessageTable, labels: &'a AttributeLabels) -> Self {
        Self { messages, labels }
    }

    /// `field` is the concrete path (`roles.1`), `pattern` the declared one
    /// (`roles.*`).
    pub fn render(
        &self,
        field: &str,
        pattern: &str,
        error: &ValidationError,
        kind: Option<SizeKind>,
    ) -> String {
        let template = self.messages.template_for(pattern, &error.code, kind);
        let mut message = template.replace(":attribute", &self.labels.label(pattern, field));

        let mut params: Vec<_> = error.params.iter().collect();
        // longest names first so `:min` never clips `:minimum`
        params.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (name, value) in params {
            let placeholder = format!(":{name}");
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            message = message.replace(&placeholder, &text);
        }
        message
    }
}

/// Shapes field errors into response records, keeping field order and the
/// order of each field's messages.
pub fn format_errors(errors: &FieldErrors) -> Vec<FormattedFieldError> {
    errors
        .iter()
        .map(|(field, messages)| FormattedFieldError {
            field: field.to_string(),
            messages: messages.to_vec(),
            first_message: messages.first().cloned(),
        })
        .collect()
}
