//! Syntax tree handed to the core by an external front end.
//!
//! The tree is plain data: both engines walk it with exhaustive matches. It
//! serializes with serde so a front end in another process can ship it as JSON.

mod build;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::token::{Pos, Token};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    String,
    Char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictField {
    pub key: Expr,
    pub value: Expr,
}

/// Function declaration, named (`func f(a) {}`) or anonymous (`func(a) {}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    /// Names the front end resolved as local to this function.
    #[serde(default)]
    pub local_names: Vec<String>,
    #[serde(default)]
    pub pos: Pos,
}

impl FuncDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map(|n| n.name.as_str()).unwrap_or("#<closure>")
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.local_names.iter().any(|n| n == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        kind: LitKind,
        value: String,
        #[serde(default)]
        pos: Pos,
    },
    Paren(Box<Expr>),
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        #[serde(default)]
        pos: Pos,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Unary {
        op: Token,
        x: Box<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Binary {
        op: Token,
        x: Box<Expr>,
        y: Box<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Array {
        elems: Vec<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Set {
        elems: Vec<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Dict {
        fields: Vec<DictField>,
        #[serde(default)]
        pos: Pos,
    },
    FuncDecl(Arc<FuncDecl>),
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Ident(id) => id.pos,
            Expr::Paren(inner) => inner.pos(),
            Expr::Selector { sel, .. } => sel.pos,
            Expr::FuncDecl(decl) => decl.pos,
            Expr::BasicLit { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Slice { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::Unary { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Array { pos, .. }
            | Expr::Set { pos, .. }
            | Expr::Dict { pos, .. } => *pos,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident(_) => "identifier",
            Expr::BasicLit { .. } => "literal",
            Expr::Paren(_) => "parenthesized expression",
            Expr::Selector { .. } => "selector",
            Expr::Index { .. } => "index expression",
            Expr::Slice { .. } => "slice expression",
            Expr::Call { .. } => "call",
            Expr::Unary { .. } => "unary expression",
            Expr::Binary { .. } => "binary expression",
            Expr::Array { .. } => "array literal",
            Expr::Set { .. } => "set literal",
            Expr::Dict { .. } => "dict literal",
            Expr::FuncDecl(_) => "function literal",
        }
    }
}

/// One `case` of a switch. `list == None` is the default clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub list: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// Channel send; reserved, accepted as a no-op.
    Send {
        chan: Expr,
        value: Expr,
        #[serde(default)]
        pos: Pos,
    },
    IncDec {
        x: Expr,
        tok: Token,
        #[serde(default)]
        pos: Pos,
    },
    /// `lhs... = rhs...` or `lhs... op= rhs...`
    Assign {
        lhs: Vec<Expr>,
        tok: Token,
        rhs: Vec<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Spawn {
        call: Expr,
        #[serde(default)]
        pos: Pos,
    },
    Return {
        results: Vec<Expr>,
        #[serde(default)]
        pos: Pos,
    },
    Branch {
        tok: Token,
        #[serde(default)]
        pos: Pos,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        body: Vec<Stmt>,
        els: Option<Box<Stmt>>,
        #[serde(default)]
        pos: Pos,
    },
    Switch {
        subject: Option<Expr>,
        clauses: Vec<CaseClause>,
        #[serde(default)]
        pos: Pos,
    },
    /// Channel select; reserved, accepted as a no-op.
    Select {
        #[serde(default)]
        pos: Pos,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
        #[serde(default)]
        pos: Pos,
    },
    Range {
        key: Option<Ident>,
        value: Option<Ident>,
        x: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        pos: Pos,
    },
    Import {
        modules: Vec<String>,
        #[serde(default)]
        pos: Pos,
    },
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::Expr(expr) => expr.pos(),
            Stmt::Block(stmts) => stmts.first().map(Stmt::pos).unwrap_or(0),
            Stmt::Send { pos, .. }
            | Stmt::IncDec { pos, .. }
            | Stmt::Assign { pos, .. }
            | Stmt::Spawn { pos, .. }
            | Stmt::Return { pos, .. }
            | Stmt::Branch { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::Switch { pos, .. }
            | Stmt::Select { pos }
            | Stmt::For { pos, .. }
            | Stmt::Range { pos, .. }
            | Stmt::Import { pos, .. } => *pos,
        }
    }
}

/// A whole compilation unit: the top-level statement list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
