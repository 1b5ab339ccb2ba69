//! Failure taxonomy for a single invocation.

use callgate_registry::CallableError;
use callgate_types::PayloadKind;

/// Everything that can go wrong inside [`crate::Invoker::invoke`].
///
/// Nothing is recovered locally; each variant reaches the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// A payload is not valid JSON. The callable was not invoked.
    #[error("Failed to decode {kind} payload: {source}")]
    Decode {
        kind: PayloadKind,
        #[source]
        source: serde_json::Error,
    },
    /// A payload exceeds the configured size limit. Nothing was decoded.
    #[error("{kind} payload is {len} bytes, limit is {max}")]
    PayloadTooLarge {
        kind: PayloadKind,
        len: usize,
        max: usize,
    },
    /// No callable is registered under the name.
    #[error("Unknown function: {name:?}")]
    Resolution { name: String },
    /// The name is registered but the invocation policy refuses it.
    #[error("Function {name:?} is not permitted by policy")]
    Denied { name: String },
    /// The arguments do not match the callable's schema. The callable was
    /// not invoked.
    #[error(transparent)]
    ArgumentsRejected(CallableError),
    /// The callable was entered and returned an error or panicked.
    #[error(transparent)]
    Callable(CallableError),
    /// The callable ran but its result cannot be written as JSON.
    #[error("Failed to encode result of {function}: {source}")]
    Encode {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InvokeError {
    /// Whether the callable had already been entered when this error arose.
    #[must_use]
    pub fn callable_ran(&self) -> bool {
        matches!(self, Self::Callable(_) | Self::Encode { .. })
    }
}

/// Converts an error returned by a callable that has already been entered.
impl From<CallableError> for InvokeError {
    fn from(err: CallableError) -> Self {
        match err {
            CallableError::Unrepresentable { function, source } => {
                Self::Encode { function, source }
            }
            other => Self::Callable(other),
        }
    }
}
