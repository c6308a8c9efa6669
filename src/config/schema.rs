//! Configuration schema definitions.
//!
//! This module defines the runtime options of a configuration tree. These
//! govern how the store behaves, not what it holds. All types derive Serde
//! traits so an embedding application can nest them in its own settings.

use serde::{Deserialize, Serialize};

/// Root options for a configuration tree.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// Change notification behaviour.
    pub notify: NotifyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Notification pass configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    /// Catch a panicking subscriber and keep notifying the rest.
    /// When disabled the panic unwinds out of the `set` that triggered it.
    pub isolate_panics: bool,

    /// Maximum nesting of `set` calls on one store issued from inside its
    /// own subscribers. Deeper writes still land in the tree but notify
    /// nobody.
    pub max_depth: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            isolate_panics: true,
            max_depth: 32,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Record counters through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
