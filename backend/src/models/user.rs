//! Typed objects handed to user-management business logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RoleId;
use crate::validation::rules::InputBag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Account status accepted on create and update.
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Validated payload for creating a user account.
pub struct CreateUserData {
    pub name: String,
    pub username: String,
    /// Plain-text password; never serialized back out.
    #[serde(skip_serializing)]
    pub password: String,
    pub roles: Vec<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Validated payload for updating a user account. A missing password keeps
/// the current one.
pub struct UpdateUserData {
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub roles: Vec<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl CreateUserData {
    pub fn from_validated(data: InputBag) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(data))
    }
}

impl UpdateUserData {
    pub fn from_validated(data: InputBag) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(data))
    }

    /// Whether the update carries a new password.
    pub fn changes_password(&self) -> bool {
        self.password.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", content = "data", rename_all = "snake_case")]
/// Result of converting a validated user request.
pub enum UserData {
    Create(CreateUserData),
    Update(UpdateUserData),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> InputBag {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn create_data_builds_from_validated_input() {
        let data = CreateUserData::from_validated(bag(json!({
            "name": "Ada Lovelace",
            "username": "ada",
            "password": "secret",
            "roles": [2, 3],
            "status": "inactive"
        })))
        .expect("valid create payload");

        assert_eq!(data.roles, vec![RoleId(2), RoleId(3)]);
        assert_eq!(data.status, Some(UserStatus::Inactive));
    }

    #[test]
    fn update_data_treats_password_as_optional() {
        let data = UpdateUserData::from_validated(bag(json!({
            "name": "Ada Lovelace",
            "username": "ada",
            "roles": [1]
        })))
        .expect("valid update payload");

        assert!(!data.changes_password());
        assert_eq!(data.status, None);
    }

    #[test]
    fn passwords_are_not_serialized() {
        let data = UserData::Create(CreateUserData {
            name: "Ada".into(),
            username: "ada".into(),
            password: "secret".into(),
            roles: vec![RoleId(1)],
            status: None,
        });
        let json = serde_json::to_value(&data).expect("serialize");
        assert_eq!(json["operation"], "create");
        assert_eq!(json["data"]["username"], "ada");
        assert!(json["data"].get("password").is_none());
        assert!(json["data"].get("status").is_none());
    }

    #[test]
    fn status_serializes_in_snake_case() {
        assert_eq!(serde_json::to_value(UserStatus::Active).expect("serialize"), json!("active"));
        let parsed: UserStatus = serde_json::from_value(json!("inactive")).expect("deserialize");
        assert_eq!(parsed, UserStatus::Inactive);
    }
}
