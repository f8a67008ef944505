//! Named-variable registry for exposing internal state to pollers.
//!
//! Each variable is a closure evaluated on every read, so pollers always see
//! a fresh value. The registry is an ordinary value shared through `Arc`,
//! not a process global; the HTTP endpoints in [`crate::metrics::stream`]
//! serve whichever registry they are given.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::PublishError;

type VarFn = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    vars: RwLock<BTreeMap<String, VarFn>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with `cmdline`, the process arguments.
    pub fn with_process_vars() -> Self {
        let registry = Self::new();
        let args: Vec<String> = std::env::args().collect();
        let _ = registry.publish("cmdline", move || Value::from(args.clone()));
        registry
    }

    /// Publishes `f` under `name`. Names are unique per registry.
    pub fn publish<F>(&self, name: &str, f: F) -> Result<(), PublishError>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(PublishError::EmptyName);
        }

        let mut vars = self.vars.write();
        if vars.contains_key(name) {
            warn!(name, "refusing to publish duplicate variable");
            return Err(PublishError::Duplicate(name.to_owned()));
        }
        vars.insert(name.to_owned(), Arc::new(f));
        info!(name, "variable published");
        Ok(())
    }

    /// Publishes `f` under `prefix` plus a generated suffix and returns the
    /// name that was used.
    pub fn publish_unique<F>(&self, prefix: &str, f: F) -> String
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let f: VarFn = Arc::new(f);
        loop {
            let name = format!("{prefix}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
            let f = f.clone();
            match self.publish(&name, move || f()) {
                Ok(()) => return name,
                Err(_) => continue,
            }
        }
    }

    pub fn unpublish(&self, name: &str) -> bool {
        self.vars.write().remove(name).is_some()
    }

    /// Current value of one variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        // clone the closure out so it runs without the registry lock
        let f = self.vars.read().get(name).cloned()?;
        Some(f())
    }

    pub fn names(&self) -> Vec<String> {
        self.vars.read().keys().cloned().collect()
    }

    /// Every variable evaluated now, as one JSON object sorted by name.
    pub fn render(&self) -> Value {
        let vars: Vec<(String, VarFn)> = self
            .vars
            .read()
            .iter()
            .map(|(k, f)| (k.clone(), f.clone()))
            .collect();

        let mut out = Map::new();
        for (name, f) in vars {
            out.insert(name, f());
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_publish_and_get() {
        let r = Registry::new();
        r.publish("answer", || json!(42)).unwrap();
        assert_eq!(r.get("answer"), Some(json!(42)));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let r = Registry::new();
        r.publish("http", || json!(1)).unwrap();
        assert_eq!(
            r.publish("http", || json!(2)),
            Err(PublishError::Duplicate("http".into()))
        );
        assert_eq!(r.get("http"), Some(json!(1)));
        assert_eq!(r.publish("", || json!(0)), Err(PublishError::EmptyName));
    }

    #[test]
    fn test_values_are_evaluated_per_read() {
        let r = Registry::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = hits.clone();
        r.publish("hits", move || json!(h.fetch_add(1, Ordering::Relaxed) + 1))
            .unwrap();

        assert_eq!(r.get("hits"), Some(json!(1)));
        assert_eq!(r.render()["hits"], json!(2));
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unique_names_do_not_collide() {
        let r = Registry::new();
        let a = r.publish_unique("http", || json!("a"));
        let b = r.publish_unique("http", || json!("b"));
        assert_ne!(a, b);
        assert!(a.starts_with("http-"));
        assert_eq!(r.get(&a), Some(json!("a")));
        assert_eq!(r.get(&b), Some(json!("b")));
    }

    #[test]
    fn test_render_sorted_object() {
        let r = Registry::new();
        r.publish("b", || json!(2)).unwrap();
        r.publish("a", || json!(1)).unwrap();
        assert_eq!(r.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(r.render(), json!({"a": 1, "b": 2}));

        assert!(r.unpublish("a"));
        assert!(!r.unpublish("a"));
        assert_eq!(r.render(), json!({"b": 2}));
    }

    #[test]
    fn test_process_vars() {
        let r = Registry::with_process_vars();
        let cmdline = r.get("cmdline").unwrap();
        assert!(cmdline.as_array().is_some_and(|a| !a.is_empty()));
    }
}
