use std::sync::Arc;

use anyhow::Result;

use crate::ast::{Expr, FuncDecl, LitKind};
use crate::error::{RuntimeError, located};
use crate::op::Protocol;
use crate::token::Token;

use super::builder::Compiler;
use super::instr::{Const, Instr};

/// Literal text to a constant, with the same rules as the evaluator.
fn constant(kind: LitKind, text: &str) -> Result<Const> {
    let failed = |kind: &'static str, reason: String| RuntimeError::LiteralConversion {
        text: text.to_string(),
        kind,
        reason,
    };
    Ok(match kind {
        LitKind::Int => Const::Int(text.parse().map_err(|e: std::num::ParseIntError| failed("int", e.to_string()))?),
        LitKind::Float => {
            Const::Float(text.parse().map_err(|e: std::num::ParseFloatError| failed("float", e.to_string()))?)
        }
        LitKind::String => Const::Str(text.trim_matches('"').to_string()),
        LitKind::Char => Const::Str(text.trim_matches('\'').to_string()),
    })
}

fn operator(proto: Option<Protocol>, tok: Token) -> Result<Protocol> {
    proto.ok_or_else(|| RuntimeError::type_shape("operator", tok.as_str(), "expression").into())
}

impl Compiler {
    pub fn expr(&mut self, expr: &Expr) -> Result<()> {
        self.expr_inner(expr).map_err(|err| located(err, expr.pos()))
    }

    pub fn exprs(&mut self, exprs: &[Expr]) -> Result<()> {
        exprs.iter().try_for_each(|e| self.expr(e))
    }

    fn expr_inner(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Ident(id) => self.load_name(&id.name)?,
            Expr::BasicLit { kind, value, .. } => {
                let value = constant(*kind, value)?;
                self.push_const(value);
            }
            Expr::Paren(inner) => self.expr(inner)?,
            Expr::Selector { x, sel } => {
                self.expr(x)?;
                self.push_const(Const::Str(sel.name.clone()));
                self.send(Protocol::GetProperty.name(), 1);
            }
            Expr::Index { x, index, .. } => {
                self.expr(x)?;
                self.expr(index)?;
                self.send(Protocol::GetIndex.name(), 1);
            }
            Expr::Slice { x, low, high, .. } => {
                self.expr(x)?;
                for bound in [low, high] {
                    match bound {
                        Some(e) => self.expr(e)?,
                        None => self.push_const(Const::Nil),
                    }
                }
                self.send(Protocol::Slice.name(), 2);
            }
            Expr::Call { fun, args, .. } => {
                self.expr(fun)?;
                self.exprs(args)?;
                self.send(Protocol::Call.name(), args.len());
            }
            Expr::Unary { op, x, .. } => {
                let proto = operator(Protocol::unary(*op), *op)?;
                self.expr(x)?;
                self.send(proto.name(), 0);
            }
            Expr::Binary { op, x, y, .. } => {
                let proto = operator(Protocol::binary(*op), *op)?;
                self.expr(x)?;
                self.expr(y)?;
                self.send(proto.name(), 1);
            }
            Expr::Array { elems, .. } => {
                self.exprs(elems)?;
                self.emit(Instr::NewArray(elems.len()));
            }
            Expr::Set { elems, .. } => {
                self.exprs(elems)?;
                self.emit(Instr::NewSet(elems.len()));
            }
            Expr::Dict { fields, .. } => {
                for field in fields {
                    self.expr(&field.key)?;
                    self.expr(&field.value)?;
                }
                self.emit(Instr::NewDict(fields.len()));
            }
            Expr::FuncDecl(decl) => self.func(decl)?,
        }
        Ok(())
    }

    /// Compile a nested prototype. A named declaration is stored in its
    /// local slot, which is declared first so the body can call itself.
    fn func(&mut self, decl: &Arc<FuncDecl>) -> Result<()> {
        let slot = decl.name.as_ref().map(|name| self.cur().declare(&name.name));
        let params: Vec<String> = decl.params.iter().map(|p| p.name.clone()).collect();
        self.begin(decl.display_name(), params, decl.local_names.clone());

        // arguments arrive on the stack, last on top
        for idx in (0..decl.params.len()).rev() {
            self.emit(Instr::StoreLocal(idx));
        }
        self.stmts(&decl.body)?;
        self.emit(Instr::RaiseReturn(0));
        let id = self.end()?;

        self.emit(Instr::PushClosure(id));
        if let Some(slot) = slot {
            self.emit(Instr::StoreLocal(slot));
        }
        Ok(())
    }
}
