use std::sync::Arc;

use crate::{
    config::Config,
    validation::{InMemoryPresence, PresenceVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub presence: Arc<dyn PresenceVerifier>,
}

impl AppState {
    pub fn new(config: Config, presence: Arc<dyn PresenceVerifier>) -> Self {
        Self { config, presence }
    }

    /// State backed by an in-memory store seeded with the configured roles.
    pub fn in_memory(config: Config) -> Self {
        let presence = InMemoryPresence::new().with_roles(config.known_role_ids.iter().copied());
        Self::new(config, Arc::new(presence))
    }
}
