//! Constructors for hosts and tests that build trees programmatically.
//! Every node built here carries position 0 (unknown).

use std::sync::Arc;

use super::{CaseClause, DictField, Expr, FuncDecl, Ident, LitKind, Stmt};
use crate::token::Token;

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Ident {
            name: name.into(),
            pos: 0,
        }
    }
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(Ident::new(name))
    }

    pub fn lit(kind: LitKind, text: impl Into<String>) -> Expr {
        Expr::BasicLit {
            kind,
            value: text.into(),
            pos: 0,
        }
    }

    pub fn int(value: i64) -> Expr {
        Expr::lit(LitKind::Int, value.to_string())
    }

    pub fn float(value: f64) -> Expr {
        Expr::lit(LitKind::Float, format!("{:?}", value))
    }

    /// String literal; the quotes are added here the way a lexer would keep them.
    pub fn string(value: &str) -> Expr {
        Expr::lit(LitKind::String, format!("\"{}\"", value))
    }

    pub fn paren(x: Expr) -> Expr {
        Expr::Paren(Box::new(x))
    }

    pub fn selector(x: Expr, name: &str) -> Expr {
        Expr::Selector {
            x: Box::new(x),
            sel: Ident::new(name),
        }
    }

    pub fn index(x: Expr, index: Expr) -> Expr {
        Expr::Index {
            x: Box::new(x),
            index: Box::new(index),
            pos: 0,
        }
    }

    pub fn slice(x: Expr, low: Option<Expr>, high: Option<Expr>) -> Expr {
        Expr::Slice {
            x: Box::new(x),
            low: low.map(Box::new),
            high: high.map(Box::new),
            pos: 0,
        }
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            fun: Box::new(fun),
            args,
            pos: 0,
        }
    }

    /// `recv.method(args...)`
    pub fn method_call(recv: Expr, method: &str, args: Vec<Expr>) -> Expr {
        Expr::call(Expr::selector(recv, method), args)
    }

    pub fn unary(op: Token, x: Expr) -> Expr {
        Expr::Unary {
            op,
            x: Box::new(x),
            pos: 0,
        }
    }

    pub fn binary(x: Expr, op: Token, y: Expr) -> Expr {
        Expr::Binary {
            op,
            x: Box::new(x),
            y: Box::new(y),
            pos: 0,
        }
    }

    pub fn array(elems: Vec<Expr>) -> Expr {
        Expr::Array { elems, pos: 0 }
    }

    pub fn set(elems: Vec<Expr>) -> Expr {
        Expr::Set { elems, pos: 0 }
    }

    pub fn dict(fields: Vec<(Expr, Expr)>) -> Expr {
        Expr::Dict {
            fields: fields.into_iter().map(|(key, value)| DictField { key, value }).collect(),
            pos: 0,
        }
    }

    /// Anonymous function literal.
    pub fn func(params: &[&str], body: Vec<Stmt>) -> Expr {
        Expr::FuncDecl(Arc::new(FuncDecl {
            name: None,
            params: params.iter().map(|p| Ident::new(*p)).collect(),
            body,
            local_names: Vec::new(),
            pos: 0,
        }))
    }
}

impl Stmt {
    pub fn expr(x: Expr) -> Stmt {
        Stmt::Expr(x)
    }

    /// `name = value`
    pub fn assign(name: &str, value: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![Expr::ident(name)],
            tok: Token::Assign,
            rhs: vec![value],
            pos: 0,
        }
    }

    /// `a, b, ... = x, y, ...` with arbitrary targets.
    pub fn assign_many(lhs: Vec<Expr>, rhs: Vec<Expr>) -> Stmt {
        Stmt::Assign {
            lhs,
            tok: Token::Assign,
            rhs,
            pos: 0,
        }
    }

    /// `target op= value`
    pub fn compound(target: Expr, tok: Token, value: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![target],
            tok,
            rhs: vec![value],
            pos: 0,
        }
    }

    pub fn inc(x: Expr) -> Stmt {
        Stmt::IncDec {
            x,
            tok: Token::Inc,
            pos: 0,
        }
    }

    pub fn dec(x: Expr) -> Stmt {
        Stmt::IncDec {
            x,
            tok: Token::Dec,
            pos: 0,
        }
    }

    pub fn ret(results: Vec<Expr>) -> Stmt {
        Stmt::Return { results, pos: 0 }
    }

    pub fn brk() -> Stmt {
        Stmt::Branch {
            tok: Token::Break,
            pos: 0,
        }
    }

    pub fn cont() -> Stmt {
        Stmt::Branch {
            tok: Token::Continue,
            pos: 0,
        }
    }

    pub fn if_else(cond: Expr, body: Vec<Stmt>, els: Option<Stmt>) -> Stmt {
        Stmt::If {
            cond,
            body,
            els: els.map(Box::new),
            pos: 0,
        }
    }

    /// Named function declaration statement.
    pub fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
        Stmt::func_with_locals(name, params, &[], body)
    }

    pub fn func_with_locals(name: &str, params: &[&str], locals: &[&str], body: Vec<Stmt>) -> Stmt {
        Stmt::Expr(Expr::FuncDecl(Arc::new(FuncDecl {
            name: Some(Ident::new(name)),
            params: params.iter().map(|p| Ident::new(*p)).collect(),
            body,
            local_names: locals.iter().map(|l| l.to_string()).collect(),
            pos: 0,
        })))
    }

    pub fn for_loop(init: Option<Stmt>, cond: Option<Expr>, post: Option<Stmt>, body: Vec<Stmt>) -> Stmt {
        Stmt::For {
            init: init.map(Box::new),
            cond,
            post: post.map(Box::new),
            body,
            pos: 0,
        }
    }

    pub fn range(key: Option<&str>, value: Option<&str>, x: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::Range {
            key: key.map(Ident::new),
            value: value.map(Ident::new),
            x,
            body,
            pos: 0,
        }
    }

    pub fn switch(subject: Option<Expr>, clauses: Vec<CaseClause>) -> Stmt {
        Stmt::Switch {
            subject,
            clauses,
            pos: 0,
        }
    }

    pub fn import(path: &str) -> Stmt {
        Stmt::Import {
            modules: vec![format!("\"{}\"", path)],
            pos: 0,
        }
    }

    pub fn spawn(call: Expr) -> Stmt {
        Stmt::Spawn { call, pos: 0 }
    }
}

impl CaseClause {
    pub fn case(list: Vec<Expr>, body: Vec<Stmt>) -> Self {
        CaseClause {
            list: Some(list),
            body,
            pos: 0,
        }
    }

    pub fn default(body: Vec<Stmt>) -> Self {
        CaseClause {
            list: None,
            body,
            pos: 0,
        }
    }
}
