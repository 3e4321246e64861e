//! Tree-walking evaluator.
//!
//! Expressions leave their results on the operand [`Stack`]; statements report
//! how control leaves them through [`Flow`]. Every operator, index, property
//! access and call goes through [`send`](crate::val::send).

mod assign;
mod call;
mod expr;
mod stmt;

use std::sync::Arc;

use anyhow::Result;

use crate::ast::{FuncDecl, Program};
use crate::env::Env;
use crate::rt::{Runtime, Stack};
use crate::val::{Obj, Object};

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Vec<Obj>),
    Break,
    Continue,
}

/// One logical thread of evaluation.
///
/// Spawned calls get their own interpreter (own stack, own loop and call
/// counters) over the same frames and objects.
pub struct Interpreter {
    rt: Arc<Runtime>,
    env: Env,
    /// Declaration of the function currently executing, `None` at top level.
    fun: Option<Arc<FuncDecl>>,
    stack: Stack,
    loop_depth: usize,
    call_depth: usize,
}

impl Interpreter {
    /// Interpreter whose top-level frame is a fresh child of the runtime globals.
    pub fn new(rt: Arc<Runtime>) -> Self {
        let env = rt.globals().child();
        Self::with_env(rt, env)
    }

    pub fn with_env(rt: Arc<Runtime>, env: Env) -> Self {
        let stack = Stack::with_capacity(rt.config().stack_capacity);
        Self {
            rt,
            env,
            fun: None,
            stack,
            loop_depth: 0,
            call_depth: 0,
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.rt
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Execute a program. The values of a top-level `return` are the result.
    pub fn run(&mut self, program: &Program) -> Result<Vec<Obj>> {
        match self.exec_block(&program.stmts)? {
            Flow::Return(values) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }

    /// Evaluate one expression, returning every value it produced.
    pub fn eval(&mut self, expr: &crate::ast::Expr) -> Result<Vec<Obj>> {
        let depth = self.stack.len();
        let result = self.eval_expr(expr);
        let values = self.stack.drain_from(depth);
        result.map(|_| values)
    }

    /// Run `f` in a fresh child frame, restoring the current frame afterwards.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let outer = self.env.clone();
        self.env = outer.child();
        let result = f(self);
        self.env = outer;
        result
    }

    /// Evaluate `expr` to exactly one value: the first it produced, or nil.
    fn eval_value(&mut self, expr: &crate::ast::Expr) -> Result<Obj> {
        let depth = self.stack.len();
        let result = self.eval_expr(expr);
        let mut values = self.stack.drain_from(depth);
        result?;
        Ok(if values.is_empty() {
            Object::nil()
        } else {
            values.swap_remove(0)
        })
    }

    /// Evaluate each expression left to right, keeping every produced value.
    fn eval_all(&mut self, exprs: &[crate::ast::Expr]) -> Result<Vec<Obj>> {
        let depth = self.stack.len();
        for expr in exprs {
            if let Err(err) = self.eval_expr(expr) {
                self.stack.drain_from(depth);
                return Err(err);
            }
        }
        Ok(self.stack.drain_from(depth))
    }
}
