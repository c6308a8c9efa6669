//! Shared value tree and change propagation.
//!
//! # Responsibilities
//! - Own the single value tree every handle reads and writes
//! - Resolve paths against it (missing keys read as absent)
//! - Create missing intermediate objects on write
//! - Run the notification pass after every write
//!
//! # Propagation
//! ```text
//! write at user.name
//!     → publish new tree snapshot
//!     → collect subscribers at: user.name, user, $   (exact, then ancestors)
//!     → run each with the post-write value at its own path
//! ```
//! Siblings and descendants of the written path are never notified.
//!
//! # Design Decisions
//! - Tree is an `ArcSwap<Value>`: reads are lock-free snapshots, writers are
//!   serialized and publish a fresh copy
//! - No lock is held while callbacks run, so callbacks may read, write and
//!   (un)subscribe reentrantly
//! - A JSON `null` reads as absent

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde_json::{Map, Value};

use crate::config::validation::validate_config;
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::observability::metrics;
use crate::tree::registry::{Registry, Subscription};
use crate::tree::Path;

thread_local! {
    /// Propagation passes on this thread's stack, per store address.
    /// Entries are removed when their count returns to zero.
    static NOTIFY_DEPTH: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
}

/// RAII marker for one propagation pass of one store on the current thread.
struct DepthGuard {
    store: usize,
}

impl DepthGuard {
    fn enter(store: usize) -> Self {
        NOTIFY_DEPTH.with(|depths| *depths.borrow_mut().entry(store).or_insert(0) += 1);
        DepthGuard { store }
    }

    fn current(store: usize) -> usize {
        NOTIFY_DEPTH.with(|depths| depths.borrow().get(&store).copied().unwrap_or(0))
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        NOTIFY_DEPTH.with(|depths| {
            let mut depths = depths.borrow_mut();
            if let Some(depth) = depths.get_mut(&self.store) {
                *depth -= 1;
                if *depth == 0 {
                    depths.remove(&self.store);
                }
            }
        });
    }
}

struct StoreInner {
    root: ArcSwap<Value>,
    write_lock: Mutex<()>,
    registry: Arc<Registry>,
    config: TreeConfig,
}

/// Cheap-to-clone handle to one value tree and its subscribers.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Adopt `initial` as the live tree, with default options.
    pub fn new(initial: Value) -> Self {
        Self::from_parts(initial, TreeConfig::default())
    }

    /// Adopt `initial` as the live tree after validating `config`.
    pub fn with_config(initial: Value, config: TreeConfig) -> Result<Self> {
        validate_config(&config).map_err(TreeError::InvalidConfig)?;
        Ok(Self::from_parts(initial, config))
    }

    fn from_parts(initial: Value, config: TreeConfig) -> Self {
        let registry = Arc::new(Registry::new(config.observability.metrics_enabled));
        Self {
            inner: Arc::new(StoreInner {
                root: ArcSwap::from_pointee(initial),
                write_lock: Mutex::new(()),
                registry,
                config,
            }),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.inner.config
    }

    /// The whole tree as of now.
    pub fn snapshot(&self) -> Arc<Value> {
        self.inner.root.load_full()
    }

    /// Owned copy of the value at `path`, `None` if absent.
    pub fn get(&self, path: &Path) -> Option<Value> {
        self.read(path, |value| value.cloned())
    }

    /// Borrow the value at `path` for the duration of `f`.
    pub fn read<R>(&self, path: &Path, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let root = self.inner.root.load();
        f(lookup(&root, path))
    }

    /// Replace the value at `path`, creating missing parents, then notify.
    pub fn set(&self, path: &Path, value: Value) {
        self.write("set", path, |root| *slot_mut(root, path) = value);
    }

    /// Remove the value at `path`, then notify. Clearing the root empties
    /// the tree.
    pub fn clear(&self, path: &Path) {
        self.write("clear", path, |root| match path.parent() {
            None => *root = Value::Object(Map::new()),
            Some(parent) => {
                if let (Some(map), Some(key)) =
                    (lookup_mut(root, &parent).and_then(Value::as_object_mut), path.last())
                {
                    map.remove(key);
                }
            }
        });
    }

    /// Deep-merge `value` into the sub-tree at `path`, then notify.
    ///
    /// Object members are merged key by key; anything else replaces. Typed
    /// handles merge by schema instead, see [`Handle::merge`](crate::Handle::merge).
    pub fn merge(&self, path: &Path, value: Value) {
        self.write("merge", path, |root| deep_merge(slot_mut(root, path), value));
    }

    /// Apply `fold` to the slot at `path`, creating missing parents, then
    /// notify as a merge.
    pub(crate) fn merge_with(&self, path: &Path, fold: impl FnOnce(&mut Value)) {
        self.write("merge", path, |root| fold(slot_mut(root, path)));
    }

    /// Register `callback` for writes at `path` or any descendant of it.
    pub fn subscribe<F>(&self, path: Path, callback: F) -> Subscription
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.registry.insert(path, Arc::new(callback))
    }

    /// Live registrations at exactly `path`.
    pub fn subscriber_count(&self, path: &Path) -> usize {
        self.inner.registry.count(path)
    }

    /// True if both handles address the same tree.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn write(&self, op: &'static str, path: &Path, mutate: impl FnOnce(&mut Value)) {
        let next = {
            let _guard = self
                .inner
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut next = Value::clone(&self.inner.root.load());
            mutate(&mut next);
            let next = Arc::new(next);
            self.inner.root.store(next.clone());
            next
        };

        if self.inner.config.observability.metrics_enabled {
            metrics::record_write(op);
        }
        self.notify(path, &next);
    }

    /// Identity for per-store bookkeeping; stable while any clone is alive.
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn notify(&self, path: &Path, root: &Value) {
        let max_depth = self.inner.config.notify.max_depth;
        if DepthGuard::current(self.addr()) >= max_depth {
            tracing::warn!(
                path = %path,
                max_depth,
                "Nested write exceeded notification depth, subscribers not notified"
            );
            return;
        }

        let scheduled = self.inner.registry.collect(path);
        let total: usize = scheduled.iter().map(|(_, regs)| regs.len()).sum();
        tracing::debug!(path = %path, subscribers = total, "Value written");
        if total == 0 {
            return;
        }

        let _depth = DepthGuard::enter(self.addr());
        let mut invoked = 0;
        for (target, registrations) in scheduled {
            let value = lookup(root, &target);
            for registration in registrations {
                // Unsubscribed by an earlier callback in this pass.
                if !registration.is_alive() {
                    continue;
                }
                invoked += 1;
                self.invoke(&target, || (registration.callback)(value));
            }
        }

        if self.inner.config.observability.metrics_enabled {
            metrics::record_notifications(invoked);
        }
    }

    fn invoke(&self, target: &Path, call: impl FnOnce()) {
        if !self.inner.config.notify.isolate_panics {
            call();
            return;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
            tracing::error!(
                path = %target,
                panic = panic_message(&*payload),
                "Subscriber panicked, continuing notification"
            );
            if self.inner.config.observability.metrics_enabled {
                metrics::record_callback_panic();
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.snapshot())
            .field("subscribed_paths", &self.inner.registry.path_count())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Resolve `path`; a missing key, a non-object parent or a `null` is absent.
fn lookup<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, key| node.as_object()?.get(key))
        .filter(|value| !value.is_null())
}

fn lookup_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, key| node.as_object_mut()?.get_mut(key))
}

/// Slot at `path`, turning every missing or non-object parent into an object.
fn slot_mut<'a>(root: &'a mut Value, path: &Path) -> &'a mut Value {
    let mut node = root;
    for key in path.segments() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        // Indexing an object by key inserts `null` when absent.
        node = &mut node[key.as_str()];
    }
    node
}

fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                deep_merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch,
    }
}
