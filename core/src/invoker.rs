//! The dynamic invoker: decode both payloads, resolve the name, call, encode.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use callgate_config::{CallgateConfig, DEFAULT_MAX_PAYLOAD_BYTES};
use callgate_registry::{CallableError, CallableRegistry};
use callgate_types::{FunctionDefinition, FunctionName, Payload, PayloadKind};
use futures_util::FutureExt;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::InvokeError;
use crate::policy::{InvocationPolicy, PolicyError};

/// Per-invoker knobs derived from config.
#[derive(Debug, Clone, Copy)]
pub struct InvokerSettings {
    pub max_payload_bytes: usize,
    pub validate_arguments: bool,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            validate_arguments: true,
        }
    }
}

/// Invokes registered callables by name with JSON-encoded inputs.
///
/// Cheap to clone; clones share the registry. Invocations are independent
/// and may run concurrently.
#[derive(Debug, Clone)]
pub struct Invoker {
    registry: Arc<CallableRegistry>,
    policy: InvocationPolicy,
    settings: InvokerSettings,
}

impl Invoker {
    #[must_use]
    pub fn new(registry: impl Into<Arc<CallableRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            policy: InvocationPolicy::permissive(),
            settings: InvokerSettings::default(),
        }
    }

    /// Build an invoker with the `[invoker]` and `[policy]` sections applied.
    pub fn from_config(
        registry: impl Into<Arc<CallableRegistry>>,
        config: &CallgateConfig,
    ) -> Result<Self, PolicyError> {
        let invoker = config.invoker();
        let policy = InvocationPolicy::from_config(&config.policy())?;
        Ok(Self::new(registry)
            .with_policy(policy)
            .with_settings(InvokerSettings {
                max_payload_bytes: invoker.max_payload_bytes,
                validate_arguments: invoker.validate_arguments,
            }))
    }

    pub fn with_policy(mut self, policy: InvocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_settings(mut self, settings: InvokerSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &CallableRegistry {
        &self.registry
    }

    /// Definitions of every callable the policy admits, sorted by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.registry
            .definitions()
            .into_iter()
            .filter(|def| self.policy.permits(&def.name))
            .collect()
    }

    /// Invoke `function` with the given environment and arguments text.
    ///
    /// `None` for either payload means the empty object `{}`.
    pub async fn invoke(
        &self,
        function: &str,
        environment: Option<&str>,
        arguments: Option<&str>,
    ) -> Result<String, InvokeError> {
        self.invoke_payloads(
            function,
            Payload::from_option(PayloadKind::Environment, environment),
            Payload::from_option(PayloadKind::Arguments, arguments),
        )
        .await
    }

    pub async fn invoke_payloads(
        &self,
        function: &str,
        environment: Payload<'_>,
        arguments: Payload<'_>,
    ) -> Result<String, InvokeError> {
        let span = tracing::debug_span!(
            "invoke",
            function = %function.trim(),
            invocation_id = %Uuid::new_v4()
        );
        let result = self
            .run(function, &environment, &arguments)
            .instrument(span.clone())
            .await;
        if let Err(err) = &result {
            span.in_scope(|| tracing::warn!(error = %err, "Invocation failed"));
        }
        result
    }

    async fn run(
        &self,
        function: &str,
        environment: &Payload<'_>,
        arguments: &Payload<'_>,
    ) -> Result<String, InvokeError> {
        let env = self.decode(environment)?;
        let args = self.decode(arguments)?;

        let name = FunctionName::new(function).map_err(|_| InvokeError::Resolution {
            name: function.to_string(),
        })?;
        let callable = self
            .registry
            .lookup(&name)
            .map_err(|_| InvokeError::Resolution {
                name: name.to_string(),
            })?;
        if !self.policy.permits(&name) {
            return Err(InvokeError::Denied {
                name: name.into_inner(),
            });
        }

        if self.settings.validate_arguments {
            self.registry
                .check_args(&name, &args)
                .map_err(InvokeError::ArgumentsRejected)?;
        }

        tracing::debug!("Calling function");
        let call = std::panic::catch_unwind(AssertUnwindSafe(|| callable.call(env, args)))
            .map_err(|payload| panicked(&name, &payload))?;
        let value = AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .map_err(|payload| panicked(&name, &payload))??;

        let encoded = serde_json::to_string(&value).map_err(|source| InvokeError::Encode {
            function: name.clone().into_inner(),
            source,
        })?;
        tracing::debug!(bytes = encoded.len(), "Function completed");
        Ok(encoded)
    }

    fn decode(&self, payload: &Payload<'_>) -> Result<Value, InvokeError> {
        let max = self.settings.max_payload_bytes;
        if payload.len() > max {
            return Err(InvokeError::PayloadTooLarge {
                kind: payload.kind(),
                len: payload.len(),
                max,
            });
        }
        serde_json::from_str(payload.as_str()).map_err(|source| InvokeError::Decode {
            kind: payload.kind(),
            source,
        })
    }
}

fn panicked(name: &FunctionName, payload: &Box<dyn Any + Send>) -> InvokeError {
    InvokeError::Callable(CallableError::Panicked {
        function: name.to_string(),
        message: panic_payload_to_string(payload),
    })
}

fn panic_payload_to_string(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
