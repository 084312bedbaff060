//! Operation identities derived from matched route names.

use std::fmt;

pub const ROUTE_STORE: &str = "users.store";
pub const ROUTE_UPDATE: &str = "users.update";
pub const ROUTE_INDEX: &str = "users.index";

/// Selects the rule set, the DTO type and operation-specific preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Update,
    List,
}

impl OperationKind {
    /// Maps a route name to an operation; unknown routes have none.
    pub fn from_route_name(name: &str) -> Option<Self> {
        match name {
            ROUTE_STORE => Some(OperationKind::Create),
            ROUTE_UPDATE => Some(OperationKind::Update),
            ROUTE_INDEX => Some(OperationKind::List),
            _ => None,
        }
    }

    pub fn route_name(&self) -> &'static str {
        match self {
            OperationKind::Create => ROUTE_STORE,
            OperationKind::Update => ROUTE_UPDATE,
            OperationKind::List => ROUTE_INDEX,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_names_map_to_operations() {
        assert_eq!(
            OperationKind::from_route_name("users.store"),
            Some(OperationKind::Create)
        );
        assert_eq!(
            OperationKind::from_route_name("users.update"),
            Some(OperationKind::Update)
        );
        assert_eq!(
            OperationKind::from_route_name("users.index"),
            Some(OperationKind::List)
        );
        assert_eq!(OperationKind::from_route_name("users.destroy"), None);
        assert_eq!(OperationKind::from_route_name(""), None);
    }

    #[test]
    fn route_name_round_trips() {
        for kind in [
            OperationKind::Create,
            OperationKind::Update,
            OperationKind::List,
        ] {
            assert_eq!(OperationKind::from_route_name(kind.route_name()), Some(kind));
        }
    }
}
