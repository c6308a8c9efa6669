//! Shared schema and helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use config_tree::config::ObservabilityConfig;
use config_tree::config_schema;
use config_tree::observability::logging;

config_schema! {
    pub struct User => UserNode {
        pub name: String,
        pub age: u32,
    }

    pub struct Theme => ThemeNode {
        pub dark: bool,
        pub accent: String,
    }

    pub struct Ui => UiNode {
        pub theme: Theme,
        pub font_size: f64,
    }

    /// Application settings used across the test suite.
    pub struct AppConfig => AppConfigNode {
        pub user: User,
        pub ui: Ui,
        pub tags: Vec<String>,
        pub limits: BTreeMap<String, u32>,
    }
}

/// Install a debug-level subscriber once for the test binary.
pub fn init_logging() {
    let _ = logging::init(&ObservabilityConfig {
        log_level: "debug".to_string(),
        metrics_enabled: false,
    });
}

/// Collects every value a subscriber receives.
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback appending to this recorder.
    pub fn sink(&self) -> impl Fn(T) + Send + Sync + 'static {
        let seen = self.seen.clone();
        move |value| seen.lock().unwrap().push(value)
    }

    pub fn values(&self) -> Vec<T> {
        self.seen.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

pub fn user(name: &str, age: Option<u32>) -> User {
    User {
        name: Some(name.to_string()),
        age,
    }
}
