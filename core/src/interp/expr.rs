use std::sync::Arc;

use anyhow::Result;

use crate::ast::{Expr, FuncDecl, LitKind};
use crate::error::{RuntimeError, located};
use crate::op::Protocol;
use crate::token::Token;
use crate::val::{Obj, Object, SlotTable, send_op};

use super::Interpreter;

/// Convert literal text to an object.
pub(crate) fn literal(kind: LitKind, text: &str) -> Result<Obj> {
    match kind {
        LitKind::Int => text.parse::<i64>().map(Object::int).map_err(|e| {
            RuntimeError::LiteralConversion {
                text: text.to_string(),
                kind: "int",
                reason: e.to_string(),
            }
            .into()
        }),
        LitKind::Float => text.parse::<f64>().map(Object::float).map_err(|e| {
            RuntimeError::LiteralConversion {
                text: text.to_string(),
                kind: "float",
                reason: e.to_string(),
            }
            .into()
        }),
        LitKind::String => Ok(Object::string(text.trim_matches('"'))),
        LitKind::Char => Ok(Object::string(text.trim_matches('\''))),
    }
}

impl Interpreter {
    /// Evaluate `expr`, pushing its results.
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<()> {
        self.eval_expr_inner(expr).map_err(|err| located(err, expr.pos()))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Ident(id) => {
                let value = self.resolve(&id.name)?;
                self.stack.push(value);
            }
            Expr::BasicLit { kind, value, .. } => {
                let obj = literal(*kind, value)?;
                self.stack.push(obj);
            }
            Expr::Paren(inner) => self.eval_expr(inner)?,
            Expr::Selector { x, sel } => {
                let recv = self.eval_value(x)?;
                let value = send_op(self, &recv, Protocol::GetProperty, &[Object::string(&sel.name)])?;
                self.stack.push(value);
            }
            Expr::Index { x, index, .. } => {
                let recv = self.eval_value(x)?;
                let idx = self.eval_value(index)?;
                let value = send_op(self, &recv, Protocol::GetIndex, &[idx])?;
                self.stack.push(value);
            }
            Expr::Slice { x, low, high, .. } => {
                let recv = self.eval_value(x)?;
                let low = self.eval_bound(low.as_deref())?;
                let high = self.eval_bound(high.as_deref())?;
                let value = send_op(self, &recv, Protocol::Slice, &[low, high])?;
                self.stack.push(value);
            }
            Expr::Call { fun, args, .. } => self.eval_call(fun, args)?,
            Expr::Unary { op, x, .. } => {
                let proto = Protocol::unary(*op).ok_or_else(|| unknown_operator(*op))?;
                let operand = self.eval_value(x)?;
                let value = send_op(self, &operand, proto, &[])?;
                self.stack.push(value);
            }
            Expr::Binary { op, x, y, .. } => {
                let proto = Protocol::binary(*op).ok_or_else(|| unknown_operator(*op))?;
                // both sides always run: no short-circuit for && and ||
                let lhs = self.eval_value(x)?;
                let rhs = self.eval_value(y)?;
                let value = send_op(self, &lhs, proto, &[rhs])?;
                self.stack.push(value);
            }
            Expr::Array { elems, .. } => {
                let items = self.eval_all(elems)?;
                self.stack.push(Object::array(items));
            }
            Expr::Set { elems, .. } => {
                let items = self.eval_all(elems)?;
                self.stack.push(Object::set(items));
            }
            Expr::Dict { fields, .. } => {
                let mut entries = SlotTable::new();
                for field in fields {
                    let key = self.eval_value(&field.key)?;
                    let value = self.eval_value(&field.value)?;
                    entries.insert(key, value);
                }
                self.stack.push(Object::dict(entries));
            }
            Expr::FuncDecl(decl) => self.declare_func(decl),
        }
        Ok(())
    }

    /// Look `name` up through the frame chain.
    pub(super) fn resolve(&self, name: &str) -> Result<Obj> {
        match name {
            "true" => return Ok(Object::bool(true)),
            "false" => return Ok(Object::bool(false)),
            "nil" => return Ok(Object::nil()),
            _ => {}
        }
        self.env
            .get(name)
            .ok_or_else(|| RuntimeError::UnresolvedName(name.to_string()).into())
    }

    fn eval_bound(&mut self, bound: Option<&Expr>) -> Result<Obj> {
        match bound {
            Some(expr) => self.eval_value(expr),
            None => Ok(Object::nil()),
        }
    }

    /// Named declarations bind in the current frame; anonymous ones push.
    fn declare_func(&mut self, decl: &Arc<FuncDecl>) {
        let closure = Object::closure(Arc::clone(decl), self.env.clone());
        match &decl.name {
            Some(name) => self.env.put(name.name.as_str(), closure),
            None => self.stack.push(closure),
        }
    }
}

fn unknown_operator(tok: Token) -> anyhow::Error {
    RuntimeError::type_shape("operator", tok.as_str(), "expression").into()
}
