//! Callable framework - the dispatch table, adapters, and built-in callables.
//!
//! A name resolves only if a callable was registered under it. There is no
//! other scope: the registry is the complete set of invocable functions.

pub mod adapters;
pub mod builtins;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use callgate_types::FunctionDefinition;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use adapters::{FnCallable, TypedCallable};

/// Callable execution future type alias.
pub type CallFut<'a> = Pin<Box<dyn Future<Output = Result<Value, CallableError>> + Send + 'a>>;

/// Error types for callable lookup and execution.
#[derive(Debug, thiserror::Error)]
pub enum CallableError {
    #[error("Bad arguments: {message}")]
    BadArgs { message: String },
    #[error("Function failed: {function}: {message}")]
    Failed { function: String, message: String },
    #[error("Function panicked: {function}: {message}")]
    Panicked { function: String, message: String },
    #[error("Unknown function: {name}")]
    Unknown { name: String },
    #[error("Duplicate function registered: {name}")]
    Duplicate { name: String },
    #[error("Invalid argument schema for {name}: {message}")]
    InvalidSchema { name: String, message: String },
    #[error("Result of {function} is not representable as JSON: {source}")]
    Unrepresentable {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CallableError {
    pub fn failed(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// A unit of work invocable by name with `(env, args)`.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the arguments payload. `{}` accepts anything.
    fn schema(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }
    fn call<'a>(&'a self, env: Value, args: Value) -> CallFut<'a>;
}

/// Deserialize a decoded payload into a typed input.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, CallableError> {
    serde_json::from_value(args).map_err(|e| CallableError::BadArgs {
        message: e.to_string(),
    })
}

/// Compile a callable's argument schema. `None` when the schema is open.
pub fn compile_schema(
    name: &str,
    schema: &Value,
) -> Result<Option<jsonschema::Validator>, CallableError> {
    if schema_is_open(schema) {
        return Ok(None);
    }
    jsonschema::validator_for(schema)
        .map(Some)
        .map_err(|e| CallableError::InvalidSchema {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// Validate arguments against a compiled schema.
pub fn validate_args(
    validator: &jsonschema::Validator,
    args: &Value,
) -> Result<(), CallableError> {
    let result = validator.validate(args);
    if let Err(err) = result {
        return Err(CallableError::BadArgs {
            message: err.to_string(),
        });
    }
    Ok(())
}

/// Whether a schema constrains anything at all.
#[must_use]
pub fn schema_is_open(schema: &Value) -> bool {
    match schema {
        Value::Null | Value::Bool(true) => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

struct Registered {
    callable: Box<dyn Callable>,
    validator: Option<jsonschema::Validator>,
}

/// Dispatch table from registered names to callables.
///
/// Built once at startup; lookups never construct code from the name.
/// Argument schemas are compiled at registration.
#[derive(Default)]
pub struct CallableRegistry {
    callables: HashMap<String, Registered>,
}

impl CallableRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callable: Box<dyn Callable>) -> Result<(), CallableError> {
        let name = callable.name().to_string();
        if self.callables.contains_key(&name) {
            return Err(CallableError::Duplicate { name });
        }
        let validator = compile_schema(&name, &callable.schema())?;
        tracing::debug!(function = %name, "Registered callable");
        self.callables.insert(
            name,
            Registered {
                callable,
                validator,
            },
        );
        Ok(())
    }

    /// Register an async closure over raw JSON values.
    pub fn register_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) -> Result<(), CallableError>
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallableError>> + Send + 'static,
    {
        self.register(Box::new(FnCallable::new(name, description, f)))
    }

    /// Register an async closure over deserialized inputs.
    ///
    /// Inputs that don't match `E`/`A` fail with [`CallableError::BadArgs`];
    /// a result serde can't express as JSON fails with
    /// [`CallableError::Unrepresentable`] after the closure has run.
    pub fn register_typed<F, Fut, E, A, R>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) -> Result<(), CallableError>
    where
        F: Fn(E, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, CallableError>> + Send + 'static,
        E: DeserializeOwned + 'static,
        A: DeserializeOwned + 'static,
        R: Serialize + Send + 'static,
    {
        self.register(Box::new(TypedCallable::new(name, description, f)))
    }

    pub fn lookup(&self, name: &str) -> Result<&dyn Callable, CallableError> {
        self.entry(name).map(|entry| entry.callable.as_ref())
    }

    /// Check `args` against the schema compiled for `name`.
    pub fn check_args(&self, name: &str, args: &Value) -> Result<(), CallableError> {
        match &self.entry(name)?.validator {
            Some(validator) => validate_args(validator, args),
            None => Ok(()),
        }
    }

    fn entry(&self, name: &str) -> Result<&Registered, CallableError> {
        self.callables
            .get(name)
            .ok_or_else(|| CallableError::Unknown {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.callables.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        let mut defs: Vec<FunctionDefinition> = self
            .callables
            .values()
            .map(|entry| {
                let c = &entry.callable;
                FunctionDefinition::new(c.name(), c.description(), c.schema())
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

impl std::fmt::Debug for CallableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.callables.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CallableRegistry")
            .field("callables", &names)
            .finish()
    }
}
