use anyhow::Result;
use tracing::{debug, warn};

use crate::ast::{CaseClause, Expr, Ident, Stmt};
use crate::error::{RuntimeError, located};
use crate::op::Protocol;
use crate::token::Token;
use crate::val::{Obj, Object, send, send_op};

use super::{Flow, Interpreter};

impl Interpreter {
    /// Run statements in the current frame, stopping at the first non-normal flow.
    pub(super) fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run statements in a fresh child frame.
    fn exec_scoped(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        self.scoped(|this| this.exec_block(stmts))
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.exec_stmt_inner(stmt).map_err(|err| located(err, stmt.pos()))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.stack.mark();
                let result = self.eval_expr(expr);
                self.stack.rewind();
                result?;
            }
            Stmt::Send { .. } => debug!("send statement ignored"),
            Stmt::Select { .. } => debug!("select statement ignored"),
            Stmt::IncDec { x, tok, .. } => self.inc_dec(x, *tok)?,
            Stmt::Assign { lhs, tok, rhs, .. } => self.assign(lhs, *tok, rhs)?,
            Stmt::Spawn { call, .. } => self.spawn(call)?,
            Stmt::Return { results, .. } => {
                let values = self.eval_all(results)?;
                return Ok(Flow::Return(values));
            }
            Stmt::Branch { tok, .. } => return Ok(self.branch(*tok)),
            Stmt::Block(stmts) => return self.exec_scoped(stmts),
            Stmt::If { cond, body, els, .. } => {
                if self.eval_value(cond)?.expect_bool("if condition")? {
                    return self.exec_scoped(body);
                }
                if let Some(els) = els {
                    return self.exec_stmt(els);
                }
            }
            Stmt::Switch { subject, clauses, .. } => return self.exec_switch(subject.as_ref(), clauses),
            Stmt::For {
                init, cond, post, body, ..
            } => return self.exec_for(init.as_deref(), cond.as_ref(), post.as_deref(), body),
            Stmt::Range {
                key, value, x, body, ..
            } => return self.exec_range(key.as_ref(), value.as_ref(), x, body),
            Stmt::Import { modules, .. } => self.import(modules)?,
        }
        Ok(Flow::Normal)
    }

    fn branch(&self, tok: Token) -> Flow {
        if self.loop_depth == 0 {
            warn!(statement = tok.as_str(), "branch outside of a loop ignored");
            return Flow::Normal;
        }
        match tok {
            Token::Break => Flow::Break,
            Token::Continue => Flow::Continue,
            other => {
                warn!(token = other.as_str(), "unknown branch token ignored");
                Flow::Normal
            }
        }
    }

    fn exec_switch(&mut self, subject: Option<&Expr>, clauses: &[CaseClause]) -> Result<Flow> {
        let subject = subject.map(|expr| self.eval_value(expr)).transpose()?;
        for clause in clauses {
            if self.clause_matches(subject.as_ref(), clause)? {
                return self.exec_scoped(&clause.body);
            }
        }
        Ok(Flow::Normal)
    }

    /// Every entry of the clause must pass; the default clause always does.
    fn clause_matches(&mut self, subject: Option<&Obj>, clause: &CaseClause) -> Result<bool> {
        let Some(list) = &clause.list else {
            return Ok(true);
        };
        for entry in list {
            let passed = match (entry, subject) {
                (Expr::BasicLit { .. }, Some(subject)) => {
                    let candidate = self.eval_value(entry)?;
                    send_op(self, subject, Protocol::Eql, &[candidate])?.expect_bool("case")?
                }
                _ => self.eval_value(entry)?.expect_bool("case guard")?,
            };
            if !passed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run one loop body; returns `Some` when the loop must stop with that flow.
    fn loop_body(&mut self, body: &[Stmt]) -> Result<Option<Flow>> {
        self.loop_depth += 1;
        let flow = self.exec_scoped(body);
        self.loop_depth -= 1;
        match flow? {
            Flow::Return(values) => Ok(Some(Flow::Return(values))),
            Flow::Break => Ok(Some(Flow::Normal)),
            Flow::Continue | Flow::Normal => Ok(None),
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &[Stmt],
    ) -> Result<Flow> {
        self.scoped(|this| {
            if let Some(init) = init {
                this.exec_stmt(init)?;
            }
            loop {
                if let Some(cond) = cond {
                    if !this.eval_value(cond)?.expect_bool("for condition")? {
                        break;
                    }
                }
                if let Some(flow) = this.loop_body(body)? {
                    return Ok(flow);
                }
                if let Some(post) = post {
                    this.exec_stmt(post)?;
                }
            }
            Ok(Flow::Normal)
        })
    }

    /// Drive `x.__iter__(counter)` until it reports no more items. Key and
    /// value are rebound in one frame shared by every iteration.
    fn exec_range(&mut self, key: Option<&Ident>, value: Option<&Ident>, x: &Expr, body: &[Stmt]) -> Result<Flow> {
        let source = self.eval_value(x)?;
        self.scoped(|this| {
            let mut counter = 0i64;
            loop {
                let step = send(this, &source, Protocol::Iter.name(), &[Object::int(counter)])?;
                let [k, v, more] = <[Obj; 3]>::try_from(step)
                    .map_err(|step| RuntimeError::arity(3, step.len(), Protocol::Iter.name()))?;
                if !more.expect_bool(Protocol::Iter.name())? {
                    break;
                }
                for (ident, obj) in [(key, k), (value, v)] {
                    if let Some(ident) = ident.filter(|id| id.name != "_") {
                        this.env.put(ident.name.as_str(), obj);
                    }
                }
                if let Some(flow) = this.loop_body(body)? {
                    return Ok(flow);
                }
                counter += 1;
            }
            Ok(Flow::Normal)
        })
    }

    /// Bind each imported namespace under the last segment of its path.
    fn import(&mut self, modules: &[String]) -> Result<()> {
        for raw in modules {
            let path = raw.trim_matches(|c: char| c == '"' || c.is_whitespace());
            let module = self
                .rt
                .module(path)
                .ok_or_else(|| RuntimeError::UnresolvedName(path.to_string()))?;
            let short = path.rsplit('/').next().unwrap_or(path);
            debug!(module = path, binding = short, "import");
            self.env.put(short, module);
        }
        Ok(())
    }
}
