use anyhow::Result;
use tracing::{debug, warn};

use crate::ast::{CaseClause, Expr, Ident, Stmt};
use crate::error::{RuntimeError, located};
use crate::op::Protocol;
use crate::token::Token;

use super::builder::{Compiler, LoopLabels};
use super::instr::{Const, Instr, Target};

impl Compiler {
    pub fn stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        stmts.iter().try_for_each(|s| self.stmt(s))
    }

    pub fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        self.stmt_inner(stmt).map_err(|err| located(err, stmt.pos()))
    }

    fn stmt_inner(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expr(expr) => self.checkpoint(|c| c.expr(expr))?,
            Stmt::Send { .. } => debug!("send statement not lowered"),
            Stmt::Select { .. } => debug!("select statement not lowered"),
            Stmt::IncDec { x, tok, .. } => {
                let proto = Protocol::inc_dec(*tok)
                    .ok_or_else(|| RuntimeError::type_shape("++ or --", tok.as_str(), "inc/dec"))?;
                self.checkpoint(|c| c.update(x, proto, None))?;
            }
            Stmt::Assign { lhs, tok, rhs, .. } => self.checkpoint(|c| c.assign(lhs, *tok, rhs))?,
            Stmt::Spawn { call, .. } => {
                let Expr::Call { fun, args, .. } = call else {
                    return Err(RuntimeError::type_shape("call", call.kind_name(), "spawn").into());
                };
                self.expr(fun)?;
                self.exprs(args)?;
                self.emit(Instr::Spawn(args.len()));
            }
            Stmt::Return { results, .. } => {
                self.exprs(results)?;
                self.emit(Instr::RaiseReturn(results.len()));
            }
            Stmt::Branch { tok, .. } => self.branch(*tok),
            Stmt::Block(stmts) => self.stmts(stmts)?,
            Stmt::If { cond, body, els, .. } => {
                let else_label = self.cur().new_label();
                let end_label = self.cur().new_label();
                self.expr(cond)?;
                self.emit(Instr::JumpIfFalse(Target::Label(else_label)));
                self.stmts(body)?;
                self.emit(Instr::Jump(Target::Label(end_label)));
                self.cur().place(else_label, "else");
                if let Some(els) = els {
                    self.stmt(els)?;
                }
                self.cur().place(end_label, "endif");
            }
            Stmt::Switch { subject, clauses, .. } => self.switch(subject.as_ref(), clauses)?,
            Stmt::For {
                init, cond, post, body, ..
            } => self.for_loop(init.as_deref(), cond.as_ref(), post.as_deref(), body)?,
            Stmt::Range {
                key, value, x, body, ..
            } => self.range(key.as_ref(), value.as_ref(), x, body)?,
            Stmt::Import { modules, .. } => {
                for raw in modules {
                    let path = raw.trim_matches(|c: char| c == '"' || c.is_whitespace());
                    let binding = path.rsplit('/').next().unwrap_or(path);
                    self.emit(Instr::Import(path.to_string()));
                    self.add_module(binding, path);
                }
            }
        }
        Ok(())
    }

    /// Bracket a statement with `Mark`/`Rewind` so it leaves no operands behind.
    fn checkpoint(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.emit(Instr::Mark);
        body(self)?;
        self.emit(Instr::Rewind);
        Ok(())
    }

    fn branch(&mut self, tok: Token) {
        let Some(labels) = self.cur().loops.last().copied() else {
            warn!(statement = tok.as_str(), "branch outside of a loop not lowered");
            return;
        };
        match tok {
            Token::Break => self.emit(Instr::RaiseBreak),
            Token::Continue => self.emit(Instr::Jump(Target::Label(labels.post))),
            other => warn!(token = other.as_str(), "unknown branch token not lowered"),
        }
    }

    /// `=` evaluates every right-hand side first, then stores left to right.
    fn assign(&mut self, lhs: &[Expr], tok: Token, rhs: &[Expr]) -> Result<()> {
        if tok != Token::Assign {
            let proto = Protocol::compound(tok)
                .ok_or_else(|| RuntimeError::type_shape("assignment operator", tok.as_str(), "assignment"))?;
            if lhs.len() != rhs.len() {
                return Err(RuntimeError::arity(lhs.len(), rhs.len(), tok.as_str()).into());
            }
            for (target, value) in lhs.iter().zip(rhs) {
                self.update(target, proto, Some(value))?;
            }
            return Ok(());
        }

        let spread = rhs.len() == 1 && lhs.len() > 1 && matches!(rhs[0], Expr::Call { .. });
        if rhs.len() != lhs.len() && !spread {
            return Err(RuntimeError::arity(lhs.len(), rhs.len(), "assignment").into());
        }
        if let [Expr::Ident(id)] = lhs {
            self.exprs(rhs)?;
            self.store_name(&id.name);
            return Ok(());
        }
        for target in lhs {
            check_target(target)?;
        }
        self.exprs(rhs)?;
        let temps: Vec<usize> = lhs.iter().map(|_| self.cur().hidden("tmp")).collect();
        for slot in temps.iter().rev() {
            self.emit(Instr::StoreLocal(*slot));
        }
        for (target, slot) in lhs.iter().zip(temps) {
            self.store_target(target, |c| c.emit(Instr::LoadLocal(slot)))?;
        }
        Ok(())
    }

    /// Store into `target`; `value` emits the value at the point the target
    /// protocol expects it.
    fn store_target(&mut self, target: &Expr, value: impl FnOnce(&mut Self)) -> Result<()> {
        match target {
            Expr::Ident(id) => {
                value(self);
                self.store_name(&id.name);
            }
            Expr::Index { x, index, .. } => {
                self.expr(x)?;
                self.expr(index)?;
                value(self);
                self.send(Protocol::SetIndex.name(), 2);
            }
            Expr::Selector { x, sel } => {
                self.expr(x)?;
                self.push_const(Const::Str(sel.name.clone()));
                value(self);
                self.send(Protocol::SetProperty.name(), 2);
            }
            other => return Err(target_error(other)),
        }
        Ok(())
    }

    /// Read-modify-write of `target` through `proto`: compound assignment
    /// with an operand, increment and decrement without one. Receiver and
    /// key are evaluated once.
    fn update(&mut self, target: &Expr, proto: Protocol, operand: Option<&Expr>) -> Result<()> {
        let argc = usize::from(operand.is_some());
        let apply = |c: &mut Self| -> Result<()> {
            if let Some(operand) = operand {
                c.expr(operand)?;
            }
            c.send(proto.name(), argc);
            Ok(())
        };
        match target {
            Expr::Ident(id) => {
                self.load_name(&id.name)?;
                apply(self)?;
                self.store_name(&id.name);
            }
            Expr::Index { x, index, .. } => {
                let recv = self.cur().hidden("tmp");
                let key = self.cur().hidden("tmp");
                self.expr(x)?;
                self.emit(Instr::StoreLocal(recv));
                self.expr(index)?;
                self.emit(Instr::StoreLocal(key));
                // receiver and key for the store, then the current value
                for slot in [recv, key, recv, key] {
                    self.emit(Instr::LoadLocal(slot));
                }
                self.send(Protocol::GetIndex.name(), 1);
                apply(self)?;
                self.send(Protocol::SetIndex.name(), 2);
            }
            Expr::Selector { x, sel } => {
                let recv = self.cur().hidden("tmp");
                self.expr(x)?;
                self.emit(Instr::StoreLocal(recv));
                for _ in 0..2 {
                    self.emit(Instr::LoadLocal(recv));
                    self.push_const(Const::Str(sel.name.clone()));
                }
                self.send(Protocol::GetProperty.name(), 1);
                apply(self)?;
                self.send(Protocol::SetProperty.name(), 2);
            }
            other => return Err(target_error(other)),
        }
        Ok(())
    }

    fn switch(&mut self, subject: Option<&Expr>, clauses: &[CaseClause]) -> Result<()> {
        let subject_slot = match subject {
            Some(expr) => {
                self.expr(expr)?;
                let slot = self.cur().hidden("switch");
                self.emit(Instr::StoreLocal(slot));
                Some(slot)
            }
            None => None,
        };
        let end_label = self.cur().new_label();
        for clause in clauses {
            let next_label = self.cur().new_label();
            for entry in clause.list.iter().flatten() {
                match (entry, subject_slot) {
                    (Expr::BasicLit { .. }, Some(slot)) => {
                        self.emit(Instr::LoadLocal(slot));
                        self.expr(entry)?;
                        self.send(Protocol::Eql.name(), 1);
                    }
                    _ => self.expr(entry)?,
                }
                self.emit(Instr::JumpIfFalse(Target::Label(next_label)));
            }
            self.stmts(&clause.body)?;
            self.emit(Instr::Jump(Target::Label(end_label)));
            self.cur().place(next_label, "case");
        }
        self.cur().place(end_label, "endswitch");
        Ok(())
    }

    fn for_loop(&mut self, init: Option<&Stmt>, cond: Option<&Expr>, post: Option<&Stmt>, body: &[Stmt]) -> Result<()> {
        let cond_label = self.cur().new_label();
        let post_label = self.cur().new_label();
        let end_label = self.cur().new_label();

        self.emit(Instr::PushBlock(Target::Label(end_label)));
        if let Some(init) = init {
            self.stmt(init)?;
        }
        self.cur().place(cond_label, "cond");
        if let Some(cond) = cond {
            self.expr(cond)?;
            self.emit(Instr::JumpIfFalse(Target::Label(end_label)));
        }
        self.loop_body(post_label, body)?;
        self.cur().place(post_label, "post");
        if let Some(post) = post {
            self.stmt(post)?;
        }
        self.emit(Instr::Jump(Target::Label(cond_label)));
        self.cur().place(end_label, "endfor");
        self.emit(Instr::PopBlock);
        Ok(())
    }

    /// Counter-driven iteration over `x.__iter__(counter)`. Key and value
    /// slots are shared by every iteration.
    fn range(&mut self, key: Option<&Ident>, value: Option<&Ident>, x: &Expr, body: &[Stmt]) -> Result<()> {
        let head_label = self.cur().new_label();
        let post_label = self.cur().new_label();
        let end_label = self.cur().new_label();

        let source = self.cur().hidden("src");
        let counter = self.cur().hidden("iter");
        self.expr(x)?;
        self.emit(Instr::StoreLocal(source));
        self.push_const(Const::Int(0));
        self.emit(Instr::StoreLocal(counter));

        self.emit(Instr::PushBlock(Target::Label(end_label)));
        self.cur().place(head_label, "range");
        self.emit(Instr::LoadLocal(source));
        self.emit(Instr::LoadLocal(counter));
        self.send(Protocol::Iter.name(), 1);
        // (key, value, more): more is tested, value is on top of key
        self.emit(Instr::JumpIfFalse(Target::Label(end_label)));
        for ident in [value, key] {
            let slot = match ident.filter(|id| id.name != "_") {
                Some(id) => self.cur().declare(&id.name),
                None => self.cur().hidden("x"),
            };
            self.emit(Instr::StoreLocal(slot));
        }
        self.loop_body(post_label, body)?;
        self.cur().place(post_label, "step");
        self.emit(Instr::LoadLocal(counter));
        self.push_const(Const::Int(1));
        self.send(Protocol::Add.name(), 1);
        self.emit(Instr::StoreLocal(counter));
        self.emit(Instr::Jump(Target::Label(head_label)));
        // an exhausted iterator leaves its nil key and value for PopBlock to drop
        self.cur().place(end_label, "endrange");
        self.emit(Instr::PopBlock);
        Ok(())
    }

    fn loop_body(&mut self, post_label: usize, body: &[Stmt]) -> Result<()> {
        self.cur().loops.push(LoopLabels { post: post_label });
        let result = self.stmts(body);
        self.cur().loops.pop();
        result
    }
}

fn check_target(target: &Expr) -> Result<()> {
    match target {
        Expr::Ident(_) | Expr::Index { .. } | Expr::Selector { .. } => Ok(()),
        other => Err(target_error(other)),
    }
}

fn target_error(target: &Expr) -> anyhow::Error {
    RuntimeError::type_shape("identifier, index or selector", target.kind_name(), "assignment target").into()
}
