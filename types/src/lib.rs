//! Core domain types for Callgate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the dispatcher.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Function names
// ============================================================================

/// Name of a callable, guaranteed to be non-empty (after trimming).
///
/// Surrounding whitespace is stripped on construction so `" greet "` and
/// `"greet"` resolve to the same registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionName(String);

#[derive(Debug, Error)]
#[error("function name must not be empty")]
pub struct EmptyFunctionName;

impl FunctionName {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyFunctionName> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyFunctionName);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for FunctionName {
    type Error = EmptyFunctionName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FunctionName {
    type Error = EmptyFunctionName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FunctionName> for String {
    fn from(value: FunctionName) -> Self {
        value.0
    }
}

impl std::ops::Deref for FunctionName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for FunctionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Which of the two input payloads a value or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Environment,
    Arguments,
}

impl PayloadKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Arguments => "arguments",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Undecoded JSON text for one of the invocation inputs.
///
/// An omitted payload is the empty-object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<'a> {
    kind: PayloadKind,
    text: Cow<'a, str>,
}

impl<'a> Payload<'a> {
    pub const EMPTY_OBJECT: &'static str = "{}";

    #[must_use]
    pub fn new(kind: PayloadKind, text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn empty(kind: PayloadKind) -> Self {
        Self::new(kind, Self::EMPTY_OBJECT)
    }

    /// `None` maps to [`Payload::EMPTY_OBJECT`].
    #[must_use]
    pub fn from_option(kind: PayloadKind, text: Option<&'a str>) -> Self {
        text.map_or_else(|| Self::empty(kind), |text| Self::new(kind, text))
    }

    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ============================================================================
// Function definitions
// ============================================================================

/// Description of a registered callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// The name the callable is registered under.
    pub name: String,
    /// A description of what the callable does.
    pub description: String,
    /// JSON Schema describing the callable's arguments.
    pub parameters: serde_json::Value,
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
