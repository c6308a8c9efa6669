//! Subscriber bookkeeping.
//!
//! # Responsibilities
//! - Keep callbacks keyed by the exact path they subscribed to
//! - Hand out `Subscription` tokens that remove exactly one registration
//! - Collect the callbacks a write at some path must run
//!
//! # Design Decisions
//! - Registration order is preserved per path
//! - Empty entries are dropped on last unsubscribe
//! - Dropping the registry settles the subscriber gauge for whatever is
//!   still registered
//! - Collection clones `Arc`s out of the map so no shard lock is held while
//!   callbacks execute (callbacks may subscribe or unsubscribe reentrantly)

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde_json::Value;

use crate::observability::metrics;
use crate::tree::Path;

/// Untyped change callback. Receives the post-write value at its own path.
pub type Callback = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// One callback registered at one path.
#[derive(Clone)]
pub(crate) struct Registration {
    id: u64,
    alive: Arc<AtomicBool>,
    pub(crate) callback: Callback,
}

impl Registration {
    /// False once unsubscribed, even if already collected for a pass.
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Path → registrations map shared by every handle of one store.
pub(crate) struct Registry {
    entries: DashMap<Path, Vec<Registration>>,
    next_id: AtomicU64,
    metrics_enabled: bool,
}

impl Registry {
    pub(crate) fn new(metrics_enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
            metrics_enabled,
        }
    }

    /// Register `callback` at `path` and return its token.
    pub(crate) fn insert(self: &Arc<Self>, path: Path, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let alive = Arc::new(AtomicBool::new(true));

        self.entries
            .entry(path.clone())
            .or_default()
            .push(Registration {
                id,
                alive: alive.clone(),
                callback,
            });

        if self.metrics_enabled {
            metrics::record_subscriber_added();
        }
        tracing::trace!(path = %path, id, "Subscriber registered");

        Subscription {
            path,
            id,
            alive,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, path: &Path, id: u64) {
        let now_empty = match self.entries.get_mut(path) {
            Some(mut registrations) => {
                registrations.retain(|r| r.id != id);
                registrations.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.entries.remove_if(path, |_, registrations| registrations.is_empty());
        }

        if self.metrics_enabled {
            metrics::record_subscriber_removed();
        }
        tracing::trace!(path = %path, id, "Subscriber removed");
    }

    /// Live registrations at exactly `path`.
    pub(crate) fn count(&self, path: &Path) -> usize {
        self.entries.get(path).map_or(0, |r| r.len())
    }

    /// Number of paths with at least one registration.
    pub(crate) fn path_count(&self) -> usize {
        self.entries.len()
    }

    /// Registrations across every path.
    pub(crate) fn live_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Registrations a write at `path` must notify: the path itself, then
    /// each ancestor nearest first. Computed once per write.
    pub(crate) fn collect(&self, path: &Path) -> Vec<(Path, Vec<Registration>)> {
        std::iter::once(path.clone())
            .chain(path.ancestors())
            .filter_map(|target| {
                let registrations = self.entries.get(&target)?.value().clone();
                Some((target, registrations))
            })
            .collect()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let live = self.live_count();
        if self.metrics_enabled && live > 0 {
            metrics::record_subscribers_dropped(live);
        }
    }
}

/// Token for one registration, returned by every `subscribe`.
///
/// Dropping the token leaves the callback registered; call
/// [`Subscription::unsubscribe`] to stop notifications.
pub struct Subscription {
    path: Path,
    id: u64,
    alive: Arc<AtomicBool>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Stop notifications to this callback. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.path, self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// The path this subscription listens on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};

    fn noop() -> Callback {
        Arc::new(|_: Option<&Value>| {})
    }

    /// Tracks `config_tree_subscribers` only.
    struct SubscriberGauge {
        value: Arc<AtomicU64>,
    }

    impl SubscriberGauge {
        fn new() -> Self {
            Self {
                value: Arc::new(AtomicU64::new(0f64.to_bits())),
            }
        }

        fn get(&self) -> f64 {
            f64::from_bits(self.value.load(Ordering::SeqCst))
        }
    }

    impl Recorder for SubscriberGauge {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            if key.name() == "config_tree_subscribers" {
                Gauge::from_arc(self.value.clone())
            } else {
                Gauge::noop()
            }
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_unsubscribe_removes_only_its_registration() {
        let registry = Arc::new(Registry::new(false));
        let path = Path::from_segments(["user"]);

        let first = registry.insert(path.clone(), noop());
        let second = registry.insert(path.clone(), noop());
        assert_eq!(registry.count(&path), 2);

        first.unsubscribe();
        assert_eq!(registry.count(&path), 1);
        assert!(!first.is_active());
        assert!(second.is_active());

        // Idempotent
        first.unsubscribe();
        assert_eq!(registry.count(&path), 1);
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let registry = Arc::new(Registry::new(false));
        let sub = registry.insert(Path::from_segments(["a", "b"]), noop());
        assert_eq!(registry.path_count(), 1);

        sub.unsubscribe();
        assert_eq!(registry.path_count(), 0);
    }

    #[test]
    fn test_collect_exact_then_ancestors() {
        let registry = Arc::new(Registry::new(false));
        let _root = registry.insert(Path::root(), noop());
        let _user = registry.insert(Path::from_segments(["user"]), noop());
        let _name = registry.insert(Path::from_segments(["user", "name"]), noop());
        let _sibling = registry.insert(Path::from_segments(["user", "age"]), noop());
        let _descendant = registry.insert(Path::from_segments(["user", "name", "x"]), noop());

        let targets: Vec<String> = registry
            .collect(&Path::from_segments(["user", "name"]))
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();

        assert_eq!(targets, vec!["user.name", "user", "$"]);
    }

    #[test]
    fn test_live_count_spans_paths() {
        let registry = Arc::new(Registry::new(false));
        let _a = registry.insert(Path::root(), noop());
        let _b = registry.insert(Path::root(), noop());
        let c = registry.insert(Path::from_segments(["x"]), noop());
        assert_eq!(registry.live_count(), 3);

        c.unsubscribe();
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_drop_settles_subscriber_gauge() {
        let gauge = SubscriberGauge::new();

        ::metrics::with_local_recorder(&gauge, || {
            let registry = Arc::new(Registry::new(true));
            let kept = registry.insert(Path::root(), noop());
            let _also_kept = registry.insert(Path::from_segments(["a"]), noop());
            let removed = registry.insert(Path::from_segments(["a"]), noop());
            removed.unsubscribe();
            assert_eq!(gauge.get(), 2.0);

            drop(registry);
            assert_eq!(gauge.get(), 0.0);

            // No second decrement once the registry is gone.
            kept.unsubscribe();
        });

        assert_eq!(gauge.get(), 0.0);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = Arc::new(Registry::new(false));
        let sub = registry.insert(Path::root(), noop());
        drop(registry);

        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
