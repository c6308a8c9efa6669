//! Entry points building a typed tree over a fresh store.

use serde_json::{Map, Value};

use crate::config::TreeConfig;
use crate::error::Result;
use crate::tree::handle::encode;
use crate::tree::{Path, Shape, Store};

/// Build the node tree for `S`, adopting `initial` as the live value.
///
/// `S::default()` starts from the empty object, where every `get` reads
/// `None` until something is written.
pub fn create<S: Shape>(initial: S) -> S::Node {
    match encode(&Path::root(), &initial) {
        Ok(value) => create_from_value::<S>(value),
        Err(err) => {
            tracing::error!(error = %err, "Initial value not encodable, starting empty");
            create_from_value::<S>(Value::Object(Map::new()))
        }
    }
}

/// Like [`create`] with explicit options; fails on an invalid config or an
/// unencodable initial value.
pub fn try_create_with<S: Shape>(initial: S, config: TreeConfig) -> Result<S::Node> {
    let value = encode(&Path::root(), &initial)?;
    let store = Store::with_config(value, config)?;
    Ok(S::build(&store, Path::root()))
}

/// Adopt an arbitrary JSON tree without checking it against `S`.
///
/// Fields unknown to the schema are kept and ignored by typed reads; values
/// of the wrong type read as `None`.
pub fn create_from_value<S: Shape>(initial: Value) -> S::Node {
    let store = Store::new(initial);
    tracing::debug!(schema = std::any::type_name::<S>(), "Configuration tree created");
    S::build(&store, Path::root())
}
