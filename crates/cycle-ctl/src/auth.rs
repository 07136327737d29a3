//! Configuration-driven length-change authorization.

use cycle_clock::LengthChangeAuthorizer;
use cycle_common::config::AuthorizationConfig;
use std::collections::HashSet;

/// Permits a fixed set of actors.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    actors: HashSet<String>,
}

impl AllowList {
    /// Build from the `[authorization]` config section.
    #[must_use]
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self {
            actors: config.allowed_actors.iter().cloned().collect(),
        }
    }
}

impl LengthChangeAuthorizer for AllowList {
    fn authorize(&self, actor: &str) -> bool {
        self.actors.contains(actor)
    }
}
