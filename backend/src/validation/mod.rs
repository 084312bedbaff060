//! Request validation for the user-management endpoints.
//!
//! Raw input flows through [`normalize`], is checked by the [`engine`]
//! against a rule set from the [`catalog`], and on success is converted into
//! a typed object by the [`FormRequest`] implementation.

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod messages;
pub mod normalize;
pub mod operation;
pub mod presence;
pub mod request;
pub mod rules;
pub mod user_request;

pub use errors::{FieldErrors, FormattedFieldError, RequestError};
pub use messages::{format_errors, AttributeLabels, MessageTable};
pub use operation::OperationKind;
pub use presence::{InMemoryPresence, PresenceVerifier};
pub use request::{handle, validate_and_transform, validated, FormRequest};
pub use rules::{Constraint, InputBag, RuleSet};
pub use user_request::UserRequest;
