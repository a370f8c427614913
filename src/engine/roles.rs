// Speaker role resolution — mapping raw diarization labels to call roles.
//
// Diarization emits opaque labels like "Speaker_0"; which label is the
// agent and which is the customer is a deployment decision, so the map is
// injected rather than hardcoded. Anything not in the map is Unknown.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The semantic role behind a diarization speaker label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerRole {
    Agent,
    Customer,
    Unknown,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Agent => "Agent",
            SpeakerRole::Customer => "Customer",
            SpeakerRole::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invocation-scoped mapping from raw speaker labels to roles.
#[derive(Debug, Clone)]
pub struct RoleMap {
    roles: HashMap<String, SpeakerRole>,
}

impl RoleMap {
    /// The common two-party call shape: one agent label, one customer label.
    pub fn two_party(agent_label: &str, customer_label: &str) -> Self {
        let mut roles = HashMap::new();
        roles.insert(agent_label.to_string(), SpeakerRole::Agent);
        roles.insert(customer_label.to_string(), SpeakerRole::Customer);
        Self { roles }
    }

    /// Add or override a single label mapping.
    pub fn insert(&mut self, label: &str, role: SpeakerRole) {
        self.roles.insert(label.to_string(), role);
    }

    /// Resolve a raw label; labels with no entry are Unknown.
    pub fn resolve(&self, label: &str) -> SpeakerRole {
        self.roles
            .get(label)
            .copied()
            .unwrap_or(SpeakerRole::Unknown)
    }
}

impl Default for RoleMap {
    /// Historical deployment defaults.
    fn default() -> Self {
        Self::two_party("Speaker_1", "Speaker_0")
    }
}
