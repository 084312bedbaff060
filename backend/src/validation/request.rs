//! Request contract and the authorize → normalize → validate → convert
//! pipeline.

use super::engine::Validator;
use super::errors::RequestError;
use super::messages::{AttributeLabels, MessageTable};
use super::normalize;
use super::operation::OperationKind;
use super::presence::PresenceVerifier;
use super::rules::{InputBag, RuleSet};

/// Everything an endpoint declares about its input.
///
/// Rule sets and message tables are built fresh per call; implementors hold
/// only the operation identity and route parameters.
pub trait FormRequest {
    type Output;

    fn operation(&self) -> Option<OperationKind>;

    fn rules(&self) -> RuleSet;

    fn authorize(&self) -> bool {
        true
    }

    fn attributes(&self) -> AttributeLabels {
        AttributeLabels::new()
    }

    fn custom_messages(&self) -> MessageTable {
        MessageTable::new()
    }

    /// Default templates with [`FormRequest::custom_messages`] layered on top.
    fn messages(&self) -> MessageTable {
        MessageTable::defaults().merge(self.custom_messages())
    }

    fn prepare_for_validation(&self, input: InputBag) -> InputBag {
        normalize::normalize(input, self.operation())
    }

    /// Converts validated data into the endpoint's typed object.
    fn into_dto(&self, validated: InputBag) -> Result<Self::Output, RequestError>;
}

/// Runs the full pipeline and converts the result into the request's DTO.
pub fn handle<R: FormRequest>(
    request: &R,
    raw: InputBag,
    presence: &dyn PresenceVerifier,
) -> Result<R::Output, RequestError> {
    let validated = validated(request, raw, presence)?;
    request.into_dto(validated)
}

/// Authorizes, normalizes and validates, returning the sanitized input.
pub fn validated<R: FormRequest>(
    request: &R,
    raw: InputBag,
    presence: &dyn PresenceVerifier,
) -> Result<InputBag, RequestError> {
    if !request.authorize() {
        tracing::warn!(operation = ?request.operation(), "request not authorized");
        return Err(RequestError::Forbidden);
    }

    let input = request.prepare_for_validation(raw);
    tracing::debug!(
        operation = ?request.operation(),
        fields = input.len(),
        "normalized request input"
    );
    validate_and_transform(request, &input, presence)
}

/// Validates `data` as-is against the request's rules, skipping
/// normalization.
pub fn validate_and_transform<R: FormRequest>(
    request: &R,
    data: &InputBag,
    presence: &dyn PresenceVerifier,
) -> Result<InputBag, RequestError> {
    let rules = request.rules();
    let messages = request.messages();
    let labels = request.attributes();
    tracing::debug!(
        operation = ?request.operation(),
        rules = rules.len(),
        "resolved rule set"
    );

    Validator::new(&rules, &messages, &labels, presence)
        .validate(data)
        .map_err(|errors| {
            tracing::info!(
                operation = ?request.operation(),
                failed_fields = errors.len(),
                "request validation failed"
            );
            RequestError::Validation(errors)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::presence::InMemoryPresence;
    use crate::validation::rules::Constraint;
    use serde_json::json;

    struct Locked;

    impl FormRequest for Locked {
        type Output = InputBag;

        fn operation(&self) -> Option<OperationKind> {
            None
        }

        fn rules(&self) -> RuleSet {
            RuleSet::new().field("name", [Constraint::Required])
        }

        fn authorize(&self) -> bool {
            false
        }

        fn into_dto(&self, validated: InputBag) -> Result<InputBag, RequestError> {
            Ok(validated)
        }
    }

    struct Echo;

    impl FormRequest for Echo {
        type Output = InputBag;

        fn operation(&self) -> Option<OperationKind> {
            Some(OperationKind::List)
        }

        fn rules(&self) -> RuleSet {
            RuleSet::new().field("per_page", [Constraint::Required, Constraint::Min(1)])
        }

        fn into_dto(&self, validated: InputBag) -> Result<InputBag, RequestError> {
            Ok(validated)
        }
    }

    fn bag(value: serde_json::Value) -> InputBag {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn unauthorized_requests_are_rejected_before_validation() {
        let result = handle(&Locked, InputBag::new(), &InMemoryPresence::new());
        assert!(matches!(result, Err(RequestError::Forbidden)));
    }

    #[test]
    fn handle_normalizes_before_validating() {
        let out = handle(&Echo, bag(json!({"per_page": "5", "x": 1})), &InMemoryPresence::new())
            .expect("valid");
        assert_eq!(out, bag(json!({"per_page": 5})));
    }

    #[test]
    fn validate_and_transform_skips_normalization() {
        let result = validate_and_transform(
            &Echo,
            &bag(json!({"per_page": "5"})),
            &InMemoryPresence::new(),
        );
        // "5" is a one-character string without normalization
        assert!(result.is_ok());

        let result = validate_and_transform(
            &Echo,
            &bag(json!({"per_page": 0})),
            &InMemoryPresence::new(),
        );
        assert!(matches!(result, Err(RequestError::Validation(errors)) if errors.has("per_page")));
    }
}
