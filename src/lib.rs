//! Typed, recursively navigable configuration tree.
//!
//! Declare the shape of a configuration with [`config_schema!`] and build a
//! tree of handles mirroring it with [`create`]. Every node, leaf or
//! composite, exposes `get`, `set` and `subscribe`, typed after the schema
//! at its path; composites also expose one child handle per field.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use config_tree::config_schema;
//!
//! config_schema! {
//!     pub struct User => UserNode {
//!         pub name: String,
//!         pub age: u32,
//!     }
//!
//!     pub struct Settings => SettingsNode {
//!         pub user: User,
//!     }
//! }
//!
//! let cfg = config_tree::create(Settings::default());
//! assert_eq!(cfg.user.name.get(), None);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let sub = cfg.user.subscribe(move |user| sink.lock().unwrap().push(user));
//!
//! cfg.user.name.set("Jane".to_string());
//! sub.unsubscribe();
//! cfg.user.name.set("Eve".to_string());
//!
//! let seen = seen.lock().unwrap();
//! assert_eq!(seen.len(), 1);
//! assert_eq!(seen[0].as_ref().and_then(|u| u.name.as_deref()), Some("Jane"));
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   build    ┌──────────────────────────────┐
//!   │ schema types │──────────▶│ node tree (one handle / path) │
//!   └──────────────┘            └──────────────┬───────────────┘
//!                                              │ get / set / subscribe
//!                                              ▼
//!                               ┌──────────────────────────────┐
//!                               │ Store: value tree + registry │
//!                               └──────────────────────────────┘
//! ```

// Core
pub mod tree;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::TreeConfig;
pub use error::{Result, TreeError};
pub use tree::{
    create, create_from_value, try_create_with, Handle, Leaf, Path, Shape, Store, Subscription,
};

/// Paths used by `config_schema!` expansions.
#[doc(hidden)]
pub mod __private {
    pub use serde_json::{Map, Value};
}
