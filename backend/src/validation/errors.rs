//! Failure types produced by the request pipeline.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Rendered messages per failing field, in the order fields were checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` to the messages already recorded for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F, M> FromIterator<(F, M)> for FieldErrors
where
    F: AsRef<str>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, M)>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for (field, message) in iter {
            errors.add(field.as_ref(), message);
        }
        errors
    }
}

/// Serializes as a `{field: [messages]}` map in check order.
impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// One failing field as rendered in an error response.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FormattedFieldError {
    pub field: String,
    pub messages: Vec<String>,
    pub first_message: Option<String>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("This action is unauthorized.")]
    Forbidden,

    #[error("The given data was invalid (failing field count: {}).", .0.len())]
    Validation(FieldErrors),

    /// The operation has no object to convert into. This is a caller bug,
    /// not a user input problem.
    #[error("Invalid route '{0}' for DTO conversion")]
    UnsupportedOperation(String),

    #[error("validated data does not fit the target object: {0}")]
    Conversion(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_accumulate_per_field_in_insertion_order() {
        let mut errors = FieldErrors::new();
        errors.add("roles", "The Roles field is required.");
        errors.add("name", "first");
        errors.add("name", "second");

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["roles", "name"]);
        assert_eq!(errors.get("name"), Some(&["first".to_string(), "second".to_string()][..]));
        assert_eq!(errors.first("name"), Some("first"));
        assert!(!errors.has("password"));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let errors: FieldErrors = [("username", "already taken"), ("name", "missing")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&errors).expect("serialize");
        assert_eq!(json, r#"{"username":["already taken"],"name":["missing"]}"#);
    }

    #[test]
    fn validation_error_reports_field_count() {
        let errors: FieldErrors = [("name", "missing")].into_iter().collect();
        let err = RequestError::Validation(errors);
        assert_eq!(
            err.to_string(),
            "The given data was invalid (failing field count: 1)."
        );
    }
}
