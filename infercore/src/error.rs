//! Typed failure categories.
//!
//! Fallible APIs return `anyhow::Result`; the variants below ride inside the
//! `anyhow::Error` so callers can tell matching, type, shape and rewrite
//! failures apart with `downcast_ref::<CoreError>()`.
use thiserror::Error;

use crate::tensor::DType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("no compatible kernel for {op} (version {version}) on {provider}")]
    NoCompatibleKernel {
        op: String,
        provider: String,
        version: u32,
    },
    #[error("{count} kernels match {op} on {provider}")]
    AmbiguousKernel {
        op: String,
        provider: String,
        count: usize,
    },
    #[error("kernel for {op} on {provider} overlaps registered kernel {existing}")]
    KernelConflict {
        op: String,
        provider: String,
        existing: String,
    },
    #[error("node {node} has no attribute {name}")]
    MissingAttribute { node: String, name: String },
    #[error("attribute {name} of node {node} is not {expected}")]
    AttributeType {
        node: String,
        name: String,
        expected: &'static str,
    },
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("shape mismatch: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("argument {arg} has no value")]
    MissingValue { arg: String },
    #[error("{op}: {what} is not implemented")]
    NotImplemented { op: String, what: &'static str },
    #[error("invalid argument for {op}: {reason}")]
    InvalidArgument { op: String, reason: String },
    #[error("rewrite {rule} failed on node {node}: {reason}")]
    Rewrite {
        rule: String,
        node: String,
        reason: String,
    },
    #[error("invalid graph: {reason}")]
    InvalidGraph { reason: String },
}

impl CoreError {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        CoreError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn dtype_mismatch(expected: DType, actual: DType) -> Self {
        CoreError::type_mismatch(expected.as_str(), actual.as_str())
    }

    pub fn invalid_argument(op: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            op: op.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_graph(reason: impl Into<String>) -> Self {
        CoreError::InvalidGraph {
            reason: reason.into(),
        }
    }
}
