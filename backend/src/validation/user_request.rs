//! Input contract of the user-management endpoints.

use crate::models::user::{CreateUserData, UpdateUserData, UserData};
use crate::types::UserId;

use super::catalog;
use super::errors::RequestError;
use super::messages::{AttributeLabels, MessageTable};
use super::operation::OperationKind;
use super::request::FormRequest;
use super::rules::{InputBag, RuleSet};

/// Reported when a request was built from a route with no operation.
pub const NO_ROUTE: &str = "<none>";

/// Store, update and index requests for users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRequest {
    operation: Option<OperationKind>,
    /// Record being updated; excluded from the username uniqueness check.
    target: Option<UserId>,
}

impl UserRequest {
    pub fn new(operation: Option<OperationKind>, target: Option<UserId>) -> Self {
        Self { operation, target }
    }

    pub fn from_route(route_name: &str, target: Option<UserId>) -> Self {
        Self::new(OperationKind::from_route_name(route_name), target)
    }

    pub fn store() -> Self {
        Self::new(Some(OperationKind::Create), None)
    }

    pub fn update(target: UserId) -> Self {
        Self::new(Some(OperationKind::Update), Some(target))
    }

    pub fn index() -> Self {
        Self::new(Some(OperationKind::List), None)
    }
}

impl FormRequest for UserRequest {
    type Output = UserData;

    fn operation(&self) -> Option<OperationKind> {
        self.operation
    }

    fn rules(&self) -> RuleSet {
        catalog::rules_for(self.operation, self.target)
    }

    fn attributes(&self) -> AttributeLabels {
        AttributeLabels::new()
            .with("name", "Name")
            .with("username", "Username")
            .with("password", "Password")
            .with("roles", "Roles")
            .with("roles.*", "Role")
            .with("status", "Status")
            .with("search", "Search")
            .with("orderBy", "Sort by")
            .with("sortedBy", "Sort direction")
            .with("per_page", "Records per page")
            .with("filter.name", "Filter by name")
            .with("filter.username", "Filter by username")
            .with("filter.role", "Filter by role")
            .with("filter.status", "Filter by status")
            .with("force", "Force delete")
    }

    fn custom_messages(&self) -> MessageTable {
        MessageTable::new()
            .with("name.required", ":attribute is required.")
            .with("username.required", ":attribute is required.")
            .with("username.unique", ":attribute is already taken.")
            .with("password.required", ":attribute is required.")
            .with("password.min", ":attribute must be at least 3 characters long.")
            .with("roles.required", ":attribute are required.")
            .with("roles.min", "At least one :attribute must be specified.")
            .with("roles.*.exists", "The specified :attribute does not exist.")
    }

    fn into_dto(&self, validated: InputBag) -> Result<UserData, RequestError> {
        match self.operation {
            Some(OperationKind::Create) => Ok(UserData::Create(CreateUserData::from_validated(
                validated,
            )?)),
            Some(OperationKind::Update) => Ok(UserData::Update(UpdateUserData::from_validated(
                validated,
            )?)),
            Some(other) => Err(RequestError::UnsupportedOperation(
                other.route_name().to_string(),
            )),
            None => Err(RequestError::UnsupportedOperation(NO_ROUTE.to_string())),
        }
    }
}
