use anyhow::Result;

use crate::error::RuntimeError;

use super::{Obj, ObjKind, Object};

/// `args[idx]`, or an arity error naming `context`.
pub fn arg<'a>(args: &'a [Obj], idx: usize, context: &str) -> Result<&'a Obj> {
    args.get(idx)
        .ok_or_else(|| RuntimeError::arity(idx + 1, args.len(), context).into())
}

impl Object {
    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            ObjKind::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Ints widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            ObjKind::Int(i) => Some(i as f64),
            ObjKind::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ObjKind::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ObjKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.kind, ObjKind::Nil)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjKind::Func(_) | ObjKind::Native(_))
    }

    pub fn expect_int(&self, context: &str) -> Result<i64> {
        self.as_int()
            .ok_or_else(|| RuntimeError::type_shape("int", self.type_name(), context).into())
    }

    pub fn expect_float(&self, context: &str) -> Result<f64> {
        self.as_float()
            .ok_or_else(|| RuntimeError::type_shape("number", self.type_name(), context).into())
    }

    pub fn expect_str(&self, context: &str) -> Result<&str> {
        self.as_str()
            .ok_or_else(|| RuntimeError::type_shape("string", self.type_name(), context).into())
    }

    pub fn expect_bool(&self, context: &str) -> Result<bool> {
        self.as_bool()
            .ok_or_else(|| RuntimeError::type_shape("bool", self.type_name(), context).into())
    }
}
