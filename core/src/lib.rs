//! Dynamic invoker for Callgate.
//!
//! Given a function name and two JSON payloads (environment and arguments),
//! [`Invoker::invoke`] decodes both payloads, resolves the name in the
//! [`CallableRegistry`](callgate_registry::CallableRegistry), awaits the
//! callable, and encodes its result back to JSON text.
//!
//! ```text
//! invoke(name, env_text, args_text)
//!   -> decode env   (InvokeError::Decode)
//!   -> decode args  (InvokeError::Decode)
//!   -> resolve name (InvokeError::Resolution, InvokeError::Denied)
//!   -> call + await (InvokeError::Callable)
//!   -> encode       (InvokeError::Encode)
//! ```
//!
//! No step is retried and no error is recovered here; callers translate
//! failures into whatever their host surface needs.

pub mod errors;
mod invoker;
pub mod policy;

pub use errors::InvokeError;
pub use invoker::{Invoker, InvokerSettings};
pub use policy::{InvocationPolicy, PolicyError};
