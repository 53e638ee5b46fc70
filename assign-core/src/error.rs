//! Structured error types for the assignment engine.
//!
//! Every failure the engine can produce — validation rejection, solver
//! failure, or an unexpected internal fault — is represented as an
//! [`EngineError`] carrying a closed [`ErrorCode`], a map of named
//! parameters for message interpolation, and an English debug message.
//! Callers that translate error messages for end users should key off
//! `code` + `params`, not `message`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A scalar or array value usable as an error parameter.
///
/// Mirrors the placeholder values a caller substitutes into a localized
/// error template (e.g. `{studentName}` or `{duplicates[]}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    /// A single scalar placeholder value.
    Text(String),
    /// A count or index placeholder value.
    Number(i64),
    /// A list placeholder value (e.g. `duplicates[]`).
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Number(value as i64)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

/// Closed set of error kinds the engine can produce.
///
/// This enum is intentionally closed: adding a new failure mode means
/// adding a new variant here, not stringly-typed ad-hoc codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyStudentData,
    MissingRequiredFields,
    DuplicateStudentNames,
    StudentNoFriends,
    UnknownFriend,
    IsolatedStudents,
    InvalidClassCount,
    InvalidStudentCount,
    TooManyClasses,
    ClassSizeTooSmall,
    AssignmentFailed,
    NoSolutionFound,
    OptimizationTimeout,
    InternalServerError,
}

/// A structured, serializable engine failure.
///
/// `message` is an English debug string for logs; it is not meant to be
/// shown verbatim to end users, who should be served a localized string
/// built from `code` and `params` by the caller.
#[derive(Debug, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct EngineError {
    /// The closed error kind.
    pub code: ErrorCode,
    /// Named placeholders for message interpolation.
    pub params: HashMap<String, ParamValue>,
    /// English debug message; not for end-user display.
    pub message: String,
}

impl EngineError {
    /// Builds an error with no parameters.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        EngineError {
            code,
            params: HashMap::new(),
            message: message.into(),
        }
    }

    /// Builds an error and attaches a single named parameter.
    pub fn with_param(
        code: ErrorCode,
        message: impl Into<String>,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Self {
        let mut err = EngineError::new(code, message);
        err.params.insert(key.to_string(), value.into());
        err
    }

    /// Attaches an additional named parameter, builder-style.
    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}
