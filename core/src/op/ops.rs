use core::fmt;
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Reserved dispatch names. Every operator, index, property access, call and
/// iteration is resolved through one of these against the receiver's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
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
    LAnd,
    LOr,
    Not,
    Eql,
    Neq,
    Lss,
    Gtr,
    Leq,
    Geq,
    Minus,
    Inc,
    Dec,
    GetIndex,
    SetIndex,
    GetProperty,
    SetProperty,
    Slice,
    Call,
    Iter,
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
}

impl Protocol {
    pub const ALL: [Protocol; 41] = [
        Protocol::Add,
        Protocol::Sub,
        Protocol::Mul,
        Protocol::Quo,
        Protocol::Rem,
        Protocol::And,
        Protocol::Or,
        Protocol::Xor,
        Protocol::Shl,
        Protocol::Shr,
        Protocol::AndNot,
        Protocol::LAnd,
        Protocol::LOr,
        Protocol::Not,
        Protocol::Eql,
        Protocol::Neq,
        Protocol::Lss,
        Protocol::Gtr,
        Protocol::Leq,
        Protocol::Geq,
        Protocol::Minus,
        Protocol::Inc,
        Protocol::Dec,
        Protocol::GetIndex,
        Protocol::SetIndex,
        Protocol::GetProperty,
        Protocol::SetProperty,
        Protocol::Slice,
        Protocol::Call,
        Protocol::Iter,
        Protocol::AddAssign,
        Protocol::SubAssign,
        Protocol::MulAssign,
        Protocol::QuoAssign,
        Protocol::RemAssign,
        Protocol::AndAssign,
        Protocol::OrAssign,
        Protocol::XorAssign,
        Protocol::ShlAssign,
        Protocol::ShrAssign,
        Protocol::AndNotAssign,
    ];

    /// Arithmetic and bitwise operators that have a compound-assignment twin.
    pub const ARITH: [Protocol; 11] = [
        Protocol::Add,
        Protocol::Sub,
        Protocol::Mul,
        Protocol::Quo,
        Protocol::Rem,
        Protocol::And,
        Protocol::Or,
        Protocol::Xor,
        Protocol::Shl,
        Protocol::Shr,
        Protocol::AndNot,
    ];

    pub const COMPARE: [Protocol; 6] = [
        Protocol::Eql,
        Protocol::Neq,
        Protocol::Lss,
        Protocol::Gtr,
        Protocol::Leq,
        Protocol::Geq,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Add => "__add__",
            Protocol::Sub => "__sub__",
            Protocol::Mul => "__mul__",
            Protocol::Quo => "__quo__",
            Protocol::Rem => "__rem__",
            Protocol::And => "__and__",
            Protocol::Or => "__or__",
            Protocol::Xor => "__xor__",
            Protocol::Shl => "__shl__",
            Protocol::Shr => "__shr__",
            Protocol::AndNot => "__and_not__",
            Protocol::LAnd => "__land__",
            Protocol::LOr => "__lor__",
            Protocol::Not => "__not__",
            Protocol::Eql => "__eql__",
            Protocol::Neq => "__neq__",
            Protocol::Lss => "__lss__",
            Protocol::Gtr => "__gtr__",
            Protocol::Leq => "__leq__",
            Protocol::Geq => "__geq__",
            Protocol::Minus => "__minus__",
            Protocol::Inc => "__inc__",
            Protocol::Dec => "__dec__",
            Protocol::GetIndex => "__get_index__",
            Protocol::SetIndex => "__set_index__",
            Protocol::GetProperty => "__get_property__",
            Protocol::SetProperty => "__set_property__",
            Protocol::Slice => "__slice__",
            Protocol::Call => "__call__",
            Protocol::Iter => "__iter__",
            Protocol::AddAssign => "__add_assign__",
            Protocol::SubAssign => "__sub_assign__",
            Protocol::MulAssign => "__mul_assign__",
            Protocol::QuoAssign => "__quo_assign__",
            Protocol::RemAssign => "__rem_assign__",
            Protocol::AndAssign => "__and_assign__",
            Protocol::OrAssign => "__or_assign__",
            Protocol::XorAssign => "__xor_assign__",
            Protocol::ShlAssign => "__shl_assign__",
            Protocol::ShrAssign => "__shr_assign__",
            Protocol::AndNotAssign => "__and_not_assign__",
        }
    }

    pub fn from_name(name: &str) -> Option<Protocol> {
        Protocol::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Operator protocol for a binary token.
    pub fn binary(tok: Token) -> Option<Protocol> {
        let proto = match tok {
            Token::Add => Protocol::Add,
            Token::Sub => Protocol::Sub,
            Token::Mul => Protocol::Mul,
            Token::Quo => Protocol::Quo,
            Token::Rem => Protocol::Rem,
            Token::And => Protocol::And,
            Token::Or => Protocol::Or,
            Token::Xor => Protocol::Xor,
            Token::Shl => Protocol::Shl,
            Token::Shr => Protocol::Shr,
            Token::AndNot => Protocol::AndNot,
            Token::LAnd => Protocol::LAnd,
            Token::LOr => Protocol::LOr,
            Token::Eql => Protocol::Eql,
            Token::Neq => Protocol::Neq,
            Token::Lss => Protocol::Lss,
            Token::Gtr => Protocol::Gtr,
            Token::Leq => Protocol::Leq,
            Token::Geq => Protocol::Geq,
            _ => return None,
        };
        Some(proto)
    }

    pub fn unary(tok: Token) -> Option<Protocol> {
        match tok {
            Token::Not => Some(Protocol::Not),
            Token::Sub => Some(Protocol::Minus),
            _ => None,
        }
    }

    /// Protocol for a compound-assignment token (`+=` -> `__add_assign__`).
    pub fn compound(tok: Token) -> Option<Protocol> {
        let proto = match tok {
            Token::AddAssign => Protocol::AddAssign,
            Token::SubAssign => Protocol::SubAssign,
            Token::MulAssign => Protocol::MulAssign,
            Token::QuoAssign => Protocol::QuoAssign,
            Token::RemAssign => Protocol::RemAssign,
            Token::AndAssign => Protocol::AndAssign,
            Token::OrAssign => Protocol::OrAssign,
            Token::XorAssign => Protocol::XorAssign,
            Token::ShlAssign => Protocol::ShlAssign,
            Token::ShrAssign => Protocol::ShrAssign,
            Token::AndNotAssign => Protocol::AndNotAssign,
            _ => return None,
        };
        Some(proto)
    }

    pub fn inc_dec(tok: Token) -> Option<Protocol> {
        match tok {
            Token::Inc => Some(Protocol::Inc),
            Token::Dec => Some(Protocol::Dec),
            _ => None,
        }
    }

    /// The compound-assignment twin of an arithmetic operator.
    pub fn assign_form(&self) -> Option<Protocol> {
        let proto = match self {
            Protocol::Add => Protocol::AddAssign,
            Protocol::Sub => Protocol::SubAssign,
            Protocol::Mul => Protocol::MulAssign,
            Protocol::Quo => Protocol::QuoAssign,
            Protocol::Rem => Protocol::RemAssign,
            Protocol::And => Protocol::AndAssign,
            Protocol::Or => Protocol::OrAssign,
            Protocol::Xor => Protocol::XorAssign,
            Protocol::Shl => Protocol::ShlAssign,
            Protocol::Shr => Protocol::ShrAssign,
            Protocol::AndNot => Protocol::AndNotAssign,
            _ => return None,
        };
        Some(proto)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
