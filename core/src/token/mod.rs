//! Operator tokens and source positions shared by the syntax tree and both engines.

mod error;

pub use error::{Position, describe, offset_to_position};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte offset into the source text the tree was parsed from. `0` means unknown.
pub type Pos = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    // arithmetic / bitwise
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    // logical
    LAnd,
    LOr,
    Not,
    // comparison
    Eql,
    Neq,
    Lss,
    Gtr,
    Leq,
    Geq,
    // assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    // inc / dec
    Inc,
    Dec,
    // branch
    Break,
    Continue,
}

impl Token {
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Quo => "/",
            Token::Rem => "%",
            Token::And => "&",
            Token::Or => "|",
            Token::Xor => "^",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::AndNot => "&^",
            Token::LAnd => "&&",
            Token::LOr => "||",
            Token::Not => "!",
            Token::Eql => "==",
            Token::Neq => "!=",
            Token::Lss => "<",
            Token::Gtr => ">",
            Token::Leq => "<=",
            Token::Geq => ">=",
            Token::Assign => "=",
            Token::AddAssign => "+=",
            Token::SubAssign => "-=",
            Token::MulAssign => "*=",
            Token::QuoAssign => "/=",
            Token::RemAssign => "%=",
            Token::AndAssign => "&=",
            Token::OrAssign => "|=",
            Token::XorAssign => "^=",
            Token::ShlAssign => "<<=",
            Token::ShrAssign => ">>=",
            Token::AndNotAssign => "&^=",
            Token::Inc => "++",
            Token::Dec => "--",
            Token::Break => "break",
            Token::Continue => "continue",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
