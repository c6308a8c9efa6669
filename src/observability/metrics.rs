//! Metrics collection.
//!
//! # Metrics
//! - `config_tree_writes_total` (counter): mutations by op (set, clear, merge)
//! - `config_tree_notifications_total` (counter): callbacks invoked
//! - `config_tree_callback_panics_total` (counter): callbacks that panicked
//! - `config_tree_subscribers` (gauge): live registrations across all stores

/// Count one mutation of the tree.
pub fn record_write(op: &'static str) {
    ::metrics::counter!("config_tree_writes_total", "op" => op).increment(1);
}

/// Count callbacks run by one propagation pass.
pub fn record_notifications(count: usize) {
    ::metrics::counter!("config_tree_notifications_total").increment(count as u64);
}

pub fn record_callback_panic() {
    ::metrics::counter!("config_tree_callback_panics_total").increment(1);
}

pub fn record_subscriber_added() {
    ::metrics::gauge!("config_tree_subscribers").increment(1.0);
}

pub fn record_subscriber_removed() {
    ::metrics::gauge!("config_tree_subscribers").decrement(1.0);
}

/// Registrations still live when their store went away.
pub fn record_subscribers_dropped(count: usize) {
    ::metrics::gauge!("config_tree_subscribers").decrement(count as f64);
}
