//! VM configuration

use serde::{Deserialize, Serialize};

/// Default call depth guard
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Default registry size before the first purge of dead entries
pub const DEFAULT_PURGE_THRESHOLD: usize = 64;

/// Options for creating a [`Vm`](super::Vm)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmOptions {
    /// Maximum number of nested calls (methods, constructors, initializers)
    pub max_call_depth: usize,

    /// Registry size that triggers the first purge of dead entries
    pub registry_purge_threshold: usize,

    /// Type name that declares an unconstrained parameter
    pub any_type_name: String,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            registry_purge_threshold: DEFAULT_PURGE_THRESHOLD,
            any_type_name: "any".to_string(),
        }
    }
}

impl VmOptions {
    /// Options with a specific call depth guard
    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            ..Default::default()
        }
    }

    /// Options with a specific registry purge threshold
    pub fn with_purge_threshold(registry_purge_threshold: usize) -> Self {
        Self {
            registry_purge_threshold,
            ..Default::default()
        }
    }
}
