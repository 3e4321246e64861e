use anyhow::Result;

use crate::ast::Expr;
use crate::env::Env;
use crate::error::RuntimeError;
use crate::op::Protocol;
use crate::token::Token;
use crate::val::{Obj, Object, send, send_op};

use super::Interpreter;

/// An assignable location with its receiver and key already evaluated.
enum Place {
    Name(String),
    Index { recv: Obj, index: Obj },
    Property { recv: Obj, name: Obj },
}

impl Interpreter {
    fn place(&mut self, target: &Expr) -> Result<Place> {
        match target {
            Expr::Ident(id) => Ok(Place::Name(id.name.clone())),
            Expr::Index { x, index, .. } => {
                let recv = self.eval_value(x)?;
                let index = self.eval_value(index)?;
                Ok(Place::Index { recv, index })
            }
            Expr::Selector { x, sel } => {
                let recv = self.eval_value(x)?;
                Ok(Place::Property {
                    recv,
                    name: Object::string(&sel.name),
                })
            }
            other => Err(RuntimeError::type_shape(
                "identifier, index or selector",
                other.kind_name(),
                "assignment target",
            )
            .into()),
        }
    }

    fn load(&mut self, place: &Place) -> Result<Obj> {
        match place {
            Place::Name(name) => self.resolve(name),
            Place::Index { recv, index } => send_op(self, recv, Protocol::GetIndex, &[index.clone()]),
            Place::Property { recv, name } => send_op(self, recv, Protocol::GetProperty, &[name.clone()]),
        }
    }

    /// Write through `place`. `rebind` applies the `=` binding rule to names;
    /// otherwise the name is overwritten in the frame that owns it.
    fn store(&mut self, place: Place, value: Obj, rebind: bool) -> Result<()> {
        match place {
            Place::Name(name) if rebind => self.bind(&name, value),
            Place::Name(name) => {
                if !self.env.set(&name, value) {
                    return Err(RuntimeError::UnresolvedName(name).into());
                }
            }
            Place::Index { recv, index } => {
                send(self, &recv, Protocol::SetIndex.name(), &[index, value])?;
            }
            Place::Property { recv, name } => {
                send(self, &recv, Protocol::SetProperty.name(), &[name, value])?;
            }
        }
        Ok(())
    }

    /// `=` for a name: unbound names and names the current function declared
    /// local land in the current frame; anything else updates its owner.
    fn bind(&mut self, name: &str, value: Obj) {
        if name == "_" {
            return;
        }
        match self.env.lookup(name) {
            None => self.env.put(name, value),
            Some((_, owner)) => {
                let declared_here = self.fun.as_ref().is_some_and(|f| f.is_local(name));
                if declared_here && !Env::ptr_eq(&owner, &self.env) {
                    self.env.put(name, value);
                } else {
                    owner.put(name, value);
                }
            }
        }
    }

    pub(super) fn assign(&mut self, lhs: &[Expr], tok: Token, rhs: &[Expr]) -> Result<()> {
        if tok == Token::Assign {
            let values = self.eval_all(rhs)?;
            if values.len() != lhs.len() {
                return Err(RuntimeError::arity(lhs.len(), values.len(), "assignment").into());
            }
            for (target, value) in lhs.iter().zip(values) {
                let place = self.place(target)?;
                self.store(place, value, true)?;
            }
            return Ok(());
        }

        let proto = Protocol::compound(tok)
            .ok_or_else(|| RuntimeError::type_shape("assignment operator", tok.as_str(), "assignment"))?;
        if lhs.len() != rhs.len() {
            return Err(RuntimeError::arity(lhs.len(), rhs.len(), tok.as_str()).into());
        }
        for (target, expr) in lhs.iter().zip(rhs) {
            let place = self.place(target)?;
            let current = self.load(&place)?;
            let operand = self.eval_value(expr)?;
            let updated = send_op(self, &current, proto, &[operand])?;
            self.store(place, updated, false)?;
        }
        Ok(())
    }

    pub(super) fn inc_dec(&mut self, target: &Expr, tok: Token) -> Result<()> {
        let proto =
            Protocol::inc_dec(tok).ok_or_else(|| RuntimeError::type_shape("++ or --", tok.as_str(), "inc/dec"))?;
        let place = self.place(target)?;
        let current = self.load(&place)?;
        let updated = send_op(self, &current, proto, &[])?;
        self.store(place, updated, false)
    }
}
