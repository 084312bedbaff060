//! Record lookups behind the `unique` and `exists` rules.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::types::{RoleId, UserId};

/// Answers "how many rows match" for the engine's uniqueness and
/// foreign-key checks.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceVerifier: Send + Sync {
    /// Rows in `table` whose `column` equals `value`, not counting the row
    /// identified by `ignore`.
    fn count(&self, table: &str, column: &str, value: &Value, ignore: Option<UserId>) -> usize;
}

#[derive(Debug, Clone)]
struct Row {
    id: Option<UserId>,
    columns: Map<String, Value>,
}

/// Read-only table snapshot, built once and shared by every request.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPresence {
    tables: HashMap<String, Vec<Row>>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, table: &str, id: Option<UserId>, columns: Map<String, Value>) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(Row { id, columns });
        self
    }

    pub fn with_user(self, id: UserId, username: &str) -> Self {
        let mut columns = Map::new();
        columns.insert("id".to_string(), Value::String(id.to_string()));
        columns.insert("username".to_string(), Value::String(username.to_string()));
        self.with_row("users", Some(id), columns)
    }

    pub fn with_role(self, id: RoleId) -> Self {
        let mut columns = Map::new();
        columns.insert("id".to_string(), Value::from(id.0));
        self.with_row("roles", None, columns)
    }

    pub fn with_roles(self, ids: impl IntoIterator<Item = RoleId>) -> Self {
        ids.into_iter().fold(self, Self::with_role)
    }
}

impl PresenceVerifier for InMemoryPresence {
    fn count(&self, table: &str, column: &str, value: &Value, ignore: Option<UserId>) -> usize {
        self.tables.get(table).map_or(0, |rows| {
            rows.iter()
                .filter(|row| ignore.is_none() || row.id != ignore)
                .filter(|row| row.columns.get(column) == Some(value))
                .count()
        })
    }
}
