//! Closure adapters so plain async functions can be registered without a
//! hand-written [`Callable`] impl.

use std::future::Future;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{CallFut, Callable, CallableError, parse_args};

/// Callable backed by a closure over raw JSON values.
pub struct FnCallable<F> {
    name: String,
    description: String,
    schema: Value,
    f: F,
}

impl<F> FnCallable<F> {
    pub fn new(name: impl Into<String>, description: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: Value::Object(serde_json::Map::new()),
            f,
        }
    }

    /// Attach a JSON Schema for the arguments payload.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

impl<F, Fut> Callable for FnCallable<F>
where
    F: Fn(Value, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, CallableError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    fn call<'a>(&'a self, env: Value, args: Value) -> CallFut<'a> {
        Box::pin((self.f)(env, args))
    }
}

/// Callable backed by a closure over deserialized inputs and a serializable
/// result.
pub struct TypedCallable<F, E, A> {
    name: String,
    description: String,
    schema: Value,
    f: F,
    _inputs: PhantomData<fn(E, A)>,
}

impl<F, E, A> TypedCallable<F, E, A> {
    pub fn new(name: impl Into<String>, description: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: Value::Object(serde_json::Map::new()),
            f,
            _inputs: PhantomData,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

impl<F, Fut, E, A, R> Callable for TypedCallable<F, E, A>
where
    F: Fn(E, A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, CallableError>> + Send + 'static,
    E: DeserializeOwned,
    A: DeserializeOwned,
    R: Serialize + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    fn call<'a>(&'a self, env: Value, args: Value) -> CallFut<'a> {
        let env: E = match parse_args(env) {
            Ok(env) => env,
            Err(err) => return Box::pin(async move { Err(prefix_bad_args("environment", err)) }),
        };
        let args: A = match parse_args(args) {
            Ok(args) => args,
            Err(err) => return Box::pin(async move { Err(prefix_bad_args("arguments", err)) }),
        };

        let fut = (self.f)(env, args);
        Box::pin(async move {
            let result = fut.await?;
            serde_json::to_value(result).map_err(|source| CallableError::Unrepresentable {
                function: self.name.clone(),
                source,
            })
        })
    }
}

fn prefix_bad_args(which: &str, err: CallableError) -> CallableError {
    match err {
        CallableError::BadArgs { message } => CallableError::BadArgs {
            message: format!("{which}: {message}"),
        },
        other => other,
    }
}
