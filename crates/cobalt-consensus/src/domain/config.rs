//! Engine tunables

use serde::{Deserialize, Serialize};

/// Service configuration that is not consensus-critical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Verify header proof of work. Only ever disabled by tests.
    pub check_pow: bool,
    /// Rejected block hashes remembered before the oldest is forgotten.
    pub max_invalid_cache: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            check_pow: true,
            max_invalid_cache: 1_024,
        }
    }
}
