use anyhow::Result;

use crate::error::RuntimeError;
use crate::val::Obj;

/// Operand/result stack of one logical thread of evaluation.
///
/// `mark`/`rewind` bracket a statement: whatever the statement leaves behind
/// above the recorded depth is discarded on rewind.
#[derive(Debug, Default)]
pub struct Stack {
    items: Vec<Obj>,
    marks: Vec<usize>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            marks: Vec::new(),
        }
    }

    #[inline]
    pub fn push(&mut self, obj: Obj) {
        self.items.push(obj);
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Obj> {
        self.items.pop().ok_or_else(|| RuntimeError::StackUnderflow.into())
    }

    pub fn peek(&self) -> Option<&Obj> {
        self.items.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mark(&mut self) {
        self.marks.push(self.items.len());
    }

    /// Truncate back to the most recent mark and drop it. No-op without a mark.
    pub fn rewind(&mut self) {
        if let Some(depth) = self.marks.pop() {
            self.items.truncate(depth);
        }
    }

    /// Remove and return everything above `depth`, bottom first.
    pub fn drain_from(&mut self, depth: usize) -> Vec<Obj> {
        let depth = depth.min(self.items.len());
        self.items.split_off(depth)
    }

    /// Pop the top `n` values, bottom first.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Obj>> {
        if n > self.items.len() {
            return Err(RuntimeError::StackUnderflow.into());
        }
        Ok(self.items.split_off(self.items.len() - n))
    }
}
