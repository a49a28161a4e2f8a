// Mechanism registry: name -> mechanism lookup for exchange coordinators.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ClientAuth;
use crate::error::{AuthError, Result};

/// Registry of authentication mechanisms keyed by mechanism name.
///
/// Coordinators select a mechanism by the identifier negotiated (or
/// configured) for a peer; the registry itself carries no selection policy.
#[derive(Default)]
pub struct MechanismRegistry {
    mechanisms: HashMap<String, Arc<dyn ClientAuth>>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mechanism under its own name, replacing any previous
    /// registration for that name.
    pub fn register(&mut self, mechanism: Arc<dyn ClientAuth>) {
        self.mechanisms
            .insert(mechanism.mechanism().to_string(), mechanism);
    }

    /// Look up a mechanism by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ClientAuth>> {
        self.mechanisms
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::UnknownMechanism(name.to_string()))
    }

    /// Names of all registered mechanisms.
    pub fn names(&self) -> Vec<&str> {
        self.mechanisms.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }
}
