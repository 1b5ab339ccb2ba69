//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use callgate_config::CallgateConfig;
use callgate_core::Invoker;
use callgate_registry::builtins::register_builtins;
use callgate_registry::{CallableError, CallableRegistry};
use serde_json::Value;

/// Registry with the built-ins plus `record`, which counts its calls.
pub struct Fixture {
    pub invoker: Invoker,
    pub record_calls: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(&CallgateConfig::default())
    }

    pub fn with_config(config: &CallgateConfig) -> Self {
        let record_calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&record_calls);

        let mut registry = CallableRegistry::new();
        register_builtins(&mut registry).expect("builtins register once");
        registry
            .register_fn("record", "Count the call and return args", move |_env, args| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<Value, CallableError>(args)
                }
            })
            .expect("record registers once");

        let invoker = Invoker::from_config(registry, config).expect("valid policy");
        Self {
            invoker,
            record_calls,
        }
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }
}

/// Parse encoded invoker output back into a value.
pub fn decode(text: &str) -> Value {
    serde_json::from_str(text).expect("invoker output is valid JSON")
}
