//! Typed per-path handles.
//!
//! A [`Handle<T>`] is a store reference plus a path, typed with the schema
//! type found at that path. Leaves use it directly (as [`Leaf<T>`]); every
//! composite node generated by `config_schema!` wraps one and derefs to it.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TreeError};
use crate::tree::{Path, Shape, Store, Subscription};

/// Accessor for the value of type `T` at one path.
pub struct Handle<T> {
    store: Store,
    path: Path,
    _type: PhantomData<fn() -> T>,
}

/// Handle of a terminal schema field.
pub type Leaf<T> = Handle<T>;

impl<T> Handle<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Store, path: Path) -> Self {
        Self {
            store,
            path,
            _type: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store shared by every handle of this tree.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Current value, `None` if unset.
    ///
    /// A stored value that does not decode as `T` is logged and read as `None`.
    pub fn get(&self) -> Option<T> {
        self.try_get().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Ignoring undecodable value");
            None
        })
    }

    pub fn try_get(&self) -> Result<Option<T>> {
        self.store.read(&self.path, |value| decode(&self.path, value))
    }

    /// Replace the value at this path and notify subscribers.
    pub fn set(&self, value: T) {
        if let Err(err) = self.try_set(value) {
            tracing::error!(error = %err, "Value not written");
        }
    }

    /// Like [`set`](Self::set), surfacing an encoding failure.
    /// Nothing is written or notified on error.
    ///
    /// Values that would not read back unchanged, such as `f64::NAN`, are
    /// rejected with [`TreeError::Unrepresentable`].
    pub fn try_set(&self, value: T) -> Result<()> {
        let value = encode(&self.path, &value)?;
        self.store.set(&self.path, value);
        Ok(())
    }

    /// Read-modify-write.
    pub fn update(&self, f: impl FnOnce(Option<T>) -> T) {
        self.set(f(self.get()));
    }

    /// Remove the value at this path and notify subscribers.
    pub fn clear(&self) {
        self.store.clear(&self.path);
    }

    /// Call `callback` with this path's value after every write to this path
    /// or below it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        T: 'static,
        F: Fn(Option<T>) + Send + Sync + 'static,
    {
        let path = self.path.clone();
        self.store.subscribe(self.path.clone(), move |value| {
            let value = decode(&path, value).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Delivering undecodable value as None");
                None
            });
            callback(value);
        })
    }
}

impl<T: Shape> Handle<T> {
    /// Merge `value` into the current one, then notify.
    ///
    /// On a composite, fields absent from `value` keep their stored
    /// contents and nested composites merge the same way. On a leaf, maps
    /// included, `value` replaces.
    pub fn merge(&self, value: T) {
        if let Err(err) = self.try_merge(value) {
            tracing::error!(error = %err, "Value not merged");
        }
    }

    pub fn try_merge(&self, value: T) -> Result<()> {
        let value = encode(&self.path, &value)?;
        self.store
            .merge_with(&self.path, |slot| T::merge_value(slot, value));
        Ok(())
    }
}

pub(crate) fn encode<T: Serialize + DeserializeOwned>(path: &Path, value: &T) -> Result<Value> {
    let encoded = serde_json::to_value(value).map_err(|source| TreeError::Encode {
        path: path.clone(),
        source,
    })?;
    // NaN and infinities serialize as null, and null reads as absent.
    if encoded.is_null() || !reads_back::<T>(&encoded) {
        return Err(TreeError::Unrepresentable { path: path.clone() });
    }
    Ok(encoded)
}

fn reads_back<T: Serialize + DeserializeOwned>(encoded: &Value) -> bool {
    T::deserialize(encoded)
        .ok()
        .and_then(|decoded| serde_json::to_value(decoded).ok())
        .as_ref()
        == Some(encoded)
}

fn decode<T: DeserializeOwned>(path: &Path, value: Option<&Value>) -> Result<Option<T>> {
    value
        .map(|value| T::deserialize(value))
        .transpose()
        .map_err(|source| TreeError::Decode {
            path: path.clone(),
            source,
        })
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            path: self.path.clone(),
            _type: PhantomData,
        }
    }
}

/// Equal iff same store and same path.
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.store.ptr_eq(&other.store)
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("path", &self.path)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
