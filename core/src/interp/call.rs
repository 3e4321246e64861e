use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::ast::{Expr, FuncDecl};
use crate::env::Env;
use crate::error::RuntimeError;
use crate::op::Protocol;
use crate::val::{CallContext, Obj, call_object};

use super::{Flow, Interpreter};

impl CallContext for Interpreter {
    fn call_closure(&mut self, decl: &Arc<FuncDecl>, env: &Env, args: &[Obj]) -> Result<Vec<Obj>> {
        if decl.params.len() != args.len() {
            return Err(RuntimeError::arity(decl.params.len(), args.len(), decl.display_name()).into());
        }
        self.enter_call()?;
        trace!(function = decl.display_name(), depth = self.call_depth, "call");

        let frame = env.child();
        for (param, value) in decl.params.iter().zip(args) {
            frame.put(param.name.as_str(), value.clone());
        }

        let saved_env = std::mem::replace(&mut self.env, frame);
        let saved_fun = self.fun.replace(Arc::clone(decl));
        let saved_loops = std::mem::take(&mut self.loop_depth);

        let result = self.exec_block(&decl.body);

        self.leave_call();
        self.loop_depth = saved_loops;
        self.fun = saved_fun;
        self.env = saved_env;

        match result? {
            Flow::Return(values) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }

    fn enter_call(&mut self) -> Result<()> {
        let limit = self.rt.config().max_call_depth;
        if self.call_depth >= limit {
            return Err(RuntimeError::CallDepthExceeded(limit).into());
        }
        self.call_depth += 1;
        Ok(())
    }

    fn leave_call(&mut self) {
        self.call_depth -= 1;
    }
}

impl Interpreter {
    /// Evaluate a callee and its arguments left to right.
    fn callee_and_args(&mut self, fun: &Expr, args: &[Expr]) -> Result<(Obj, Vec<Obj>)> {
        let callee = self.eval_value(fun)?;
        if !is_invocable(&callee) {
            return Err(RuntimeError::type_shape("callable", callee.type_name(), "call").into());
        }
        let args = self.eval_all(args)?;
        Ok((callee, args))
    }

    pub(super) fn eval_call(&mut self, fun: &Expr, args: &[Expr]) -> Result<()> {
        let (callee, args) = self.callee_and_args(fun, args)?;
        for value in call_object(self, &callee, &args)? {
            self.stack.push(value);
        }
        Ok(())
    }

    /// Start `call` on a runtime task with its own interpreter over the same frames.
    pub(super) fn spawn(&mut self, call: &Expr) -> Result<()> {
        let Expr::Call { fun, args, .. } = call else {
            return Err(RuntimeError::type_shape("call", call.kind_name(), "spawn").into());
        };
        let (callee, args) = self.callee_and_args(fun, args)?;
        let name = callee.to_string();
        let rt = Arc::clone(&self.rt);
        let env = self.env.clone();
        let id = self.rt.spawn(&name, move || {
            let mut worker = Interpreter::with_env(rt, env);
            call_object(&mut worker, &callee, &args)
        })?;
        debug!(task = id, callee = %name, "spawn");
        Ok(())
    }
}

/// Functions, host functions and anything answering `__call__`.
fn is_invocable(callee: &Obj) -> bool {
    callee.is_callable()
        || callee.own_slot(Protocol::Call.name()).is_some()
        || callee.table().contains(Protocol::Call.name())
}
