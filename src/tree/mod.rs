//! Typed configuration tree.
//!
//! # Data Flow
//! ```text
//! config_schema! { .. }          (compile time: value + node types)
//!     → factory.rs create()      (adopt initial value into a Store)
//!     → shape.rs Shape::build    (recursive descent, one handle per path)
//!     → handle.rs Handle<T>      (typed get / set / subscribe at a path)
//!     → store.rs Store           (untyped tree + propagation)
//!     → registry.rs              (subscribers keyed by path)
//! ```
//!
//! # Design Decisions
//! - The static half (schema types) and the dynamic half (a JSON tree
//!   addressed by key paths) meet only in `Handle<T>`
//! - Handles hold a store clone and a path, never a copy of the value
//! - A write at P notifies subscribers at P and at every ancestor of P

pub mod factory;
pub mod handle;
pub mod path;
pub mod registry;
pub mod shape;
pub mod store;

pub use factory::{create, create_from_value, try_create_with};
pub use handle::{Handle, Leaf};
pub use path::Path;
pub use registry::{Callback, Subscription};
pub use shape::Shape;
pub use store::Store;
