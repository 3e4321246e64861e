//! Runtime and compile-time error taxonomy.
//!
//! Engines propagate failures as `anyhow::Error`; the concrete kind is always a
//! [`RuntimeError`] somewhere in the chain, and the innermost known source
//! position is attached once as an [`At`] context.

use std::fmt;

use crate::token::Pos;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Identifier absent from local / upvalue / outer / module resolution.
    UnresolvedName(String),
    /// Malformed numeric literal text.
    LiteralConversion { text: String, kind: &'static str, reason: String },
    /// Protocol name absent from both the receiver's own and shared tables.
    MethodNotFound { receiver: &'static str, name: String },
    /// An operation received a variant it cannot work with.
    TypeShape { expected: &'static str, got: String, context: String },
    Arity { expected: usize, got: usize, context: String },
    DivisionByZero,
    IndexOutOfRange { index: i64, len: usize },
    StackUnderflow,
    CallDepthExceeded(usize),
}

impl RuntimeError {
    pub fn type_shape(expected: &'static str, got: impl Into<String>, context: impl Into<String>) -> Self {
        RuntimeError::TypeShape {
            expected,
            got: got.into(),
            context: context.into(),
        }
    }

    pub fn arity(expected: usize, got: usize, context: impl Into<String>) -> Self {
        RuntimeError::Arity {
            expected,
            got,
            context: context.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnresolvedName(name) => write!(f, "'{}' not found", name),
            RuntimeError::LiteralConversion { text, kind, reason } => {
                write!(f, "{} convert to {} failed: {}", text, kind, reason)
            }
            RuntimeError::MethodNotFound { receiver, name } => {
                write!(f, "method '{}' not found on {}", name, receiver)
            }
            RuntimeError::TypeShape { expected, got, context } => {
                write!(f, "{}: expected {}, got {}", context, expected, got)
            }
            RuntimeError::Arity { expected, got, context } => {
                write!(f, "{}: expected {} value(s), got {}", context, expected, got)
            }
            RuntimeError::DivisionByZero => write!(f, "integer division by zero"),
            RuntimeError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range (len {})", index, len)
            }
            RuntimeError::StackUnderflow => write!(f, "execution stack underflow"),
            RuntimeError::CallDepthExceeded(limit) => write!(f, "call depth exceeded ({})", limit),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Source position context attached to an error by the engine that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct At(pub Pos);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at offset {}", self.0)
    }
}

/// Attach `pos` unless the error already carries a position from deeper down.
pub fn located(err: anyhow::Error, pos: Pos) -> anyhow::Error {
    if pos == 0 || err.downcast_ref::<At>().is_some() {
        err
    } else {
        err.context(At(pos))
    }
}

pub fn position_of(err: &anyhow::Error) -> Option<Pos> {
    err.downcast_ref::<At>().map(|at| at.0)
}

/// The concrete error kind, if the chain carries one.
pub fn kind_of(err: &anyhow::Error) -> Option<&RuntimeError> {
    err.downcast_ref::<RuntimeError>()
}

/// The error chain joined with `": "`, without position markers.
pub fn message_of(err: &anyhow::Error) -> String {
    // Context wrappers do not downcast through `chain()`, so match the marker text.
    let marker = position_of(err).map(|pos| At(pos).to_string());
    let parts: Vec<String> = err
        .chain()
        .map(|cause| cause.to_string())
        .filter(|text| marker.as_deref() != Some(text.as_str()))
        .collect();
    parts.join(": ")
}
