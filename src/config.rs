//! Dispatch configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding [`DispatchConfig::max_alias_hops`].
pub const MAX_ALIAS_HOPS_ENV: &str = "GATE_DISPATCH_MAX_ALIAS_HOPS";

/// Default bound on alias hops.
pub const DEFAULT_MAX_ALIAS_HOPS: usize = 8;

/// Tunables for implementation resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of aliases followed before resolution fails.
    pub max_alias_hops: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_alias_hops: DEFAULT_MAX_ALIAS_HOPS,
        }
    }
}

impl DispatchConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the environment.
    ///
    /// Unset variables keep their defaults; unparsable values are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_ALIAS_HOPS_ENV) {
            match raw.trim().parse() {
                Ok(hops) => config.max_alias_hops = hops,
                Err(e) => warn!(
                    "Ignoring {}={:?}: {}, using {}",
                    MAX_ALIAS_HOPS_ENV, raw, e, config.max_alias_hops
                ),
            }
        }
        config
    }

    /// Set the alias hop bound.
    pub fn with_max_alias_hops(mut self, hops: usize) -> Self {
        self.max_alias_hops = hops;
        self
    }
}
