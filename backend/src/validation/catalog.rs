//! Rule sets for the user-management operations.

use crate::types::UserId;

use super::operation::OperationKind;
use super::rules::{Constraint, RuleSet};

pub const VALID_STATUSES: [&str; 2] = ["active", "inactive"];
pub const VALID_SORT_DIRECTIONS: [&str; 2] = ["asc", "desc"];
pub const VALID_ORDER_FIELDS: [&str; 4] = ["id", "name", "username", "created_at"];
pub const PER_PAGE_MIN: i64 = 1;
pub const PER_PAGE_MAX: i64 = 100;
pub const MAX_STRING_LENGTH: i64 = 255;
pub const PASSWORD_MIN_LENGTH: i64 = 3;

/// How strictly the password field is demanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRequirement {
    Required,
    /// Checked only when the caller sent one.
    Sometimes,
}

impl PasswordRequirement {
    fn constraint(self) -> Constraint {
        match self {
            PasswordRequirement::Required => Constraint::Required,
            PasswordRequirement::Sometimes => Constraint::Sometimes,
        }
    }
}

/// Resolves the rule set for an operation. No operation means no rules.
pub fn rules_for(kind: Option<OperationKind>, target: Option<UserId>) -> RuleSet {
    match kind {
        Some(OperationKind::Create) => create_rules(),
        Some(OperationKind::Update) => update_rules(target),
        Some(OperationKind::List) => list_rules(),
        None => RuleSet::new(),
    }
}

pub fn create_rules() -> RuleSet {
    user_rules(PasswordRequirement::Required, None)
}

/// `target` is excluded from the username uniqueness check so a user can
/// keep their own username.
pub fn update_rules(target: Option<UserId>) -> RuleSet {
    user_rules(PasswordRequirement::Sometimes, target)
}

/// Rules shared by user creation and update.
pub fn user_rules(password: PasswordRequirement, ignore: Option<UserId>) -> RuleSet {
    RuleSet::new()
        .field(
            "name",
            [
                Constraint::Required,
                Constraint::String,
                Constraint::Max(MAX_STRING_LENGTH),
            ],
        )
        .field(
            "username",
            [
                Constraint::Required,
                Constraint::String,
                Constraint::Max(MAX_STRING_LENGTH),
                Constraint::unique("users", "username", ignore),
            ],
        )
        .field(
            "password",
            [
                password.constraint(),
                Constraint::String,
                Constraint::Min(PASSWORD_MIN_LENGTH),
            ],
        )
        .field(
            "roles",
            [Constraint::Required, Constraint::Array, Constraint::Min(1)],
        )
        .field(
            "roles.*",
            [
                Constraint::Required,
                Constraint::Integer,
                Constraint::exists("roles", "id"),
            ],
        )
        .field(
            "status",
            [
                Constraint::Sometimes,
                Constraint::String,
                Constraint::one_of(VALID_STATUSES),
            ],
        )
}

pub fn list_rules() -> RuleSet {
    RuleSet::new()
        .field(
            "search",
            [
                Constraint::Sometimes,
                Constraint::Nullable,
                Constraint::String,
                Constraint::Max(MAX_STRING_LENGTH),
            ],
        )
        .field(
            "orderBy",
            [
                Constraint::Sometimes,
                Constraint::String,
                Constraint::one_of(VALID_ORDER_FIELDS),
            ],
        )
        .field(
            "sortedBy",
            [
                Constraint::Sometimes,
                Constraint::String,
                Constraint::one_of(VALID_SORT_DIRECTIONS),
            ],
        )
        .field(
            "per_page",
            [
                Constraint::Required,
                Constraint::Min(PER_PAGE_MIN),
                Constraint::Max(PER_PAGE_MAX),
            ],
        )
        .field("filter", [Constraint::Sometimes, Constraint::Array])
        .field(
            "filter.status",
            [
                Constraint::Sometimes,
                Constraint::String,
                Constraint::one_of(VALID_STATUSES),
            ],
        )
}
