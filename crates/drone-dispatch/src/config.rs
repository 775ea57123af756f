//! Dispatch engine configuration

use serde::{Deserialize, Serialize};

use crate::selector::SelectionPolicy;

/// Default capacity of the fleet event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Engine settings shared by every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Ranking applied by automatic drone selection
    pub policy: SelectionPolicy,
    /// Buffered events per subscriber before the slowest one lags
    pub event_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub const fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}
