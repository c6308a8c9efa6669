//! Tree configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TreeConfig (defaults or deserialized by the host)
//!     → validation.rs (semantic checks)
//!     → Store::with_config (rejects invalid configs)
//!     → held immutably by the store for its lifetime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a store is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod schema;
pub mod validation;

pub use schema::NotifyConfig;
pub use schema::ObservabilityConfig;
pub use schema::TreeConfig;
