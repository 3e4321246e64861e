use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a prototype in [`CompiledModule::protos`](super::CompiledModule). `0` is the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtoId(pub usize);

impl fmt::Display for ProtoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Jump destination. Labels only exist while a prototype is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Label(usize),
    Pc(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(id) => write!(f, "L{}", id),
            Target::Pc(pc) => write!(f, "{:04}", pc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Const {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Int(v) => write!(f, "{}", v),
            Const::Float(v) => write!(f, "{:?}", v),
            Const::Str(s) => write!(f, "{:?}", s),
            Const::Bool(b) => write!(f, "{}", b),
            Const::Nil => write!(f, "nil"),
        }
    }
}

/// Stack-machine instruction consumed by an external execution engine.
///
/// Operands are pushed left to right: a `SendMethod` receiver sits below
/// its `argc` arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    Push(Const),
    LoadLocal(usize),
    StoreLocal(usize),
    /// Index into the prototype's upvalue table.
    LoadUpval(usize),
    StoreUpval(usize),
    /// Discard the top operand.
    Pop,
    PushModule(String),
    NewArray(usize),
    NewSet(usize),
    /// Pops `n` key/value pairs.
    NewDict(usize),
    PushClosure(ProtoId),
    SendMethod(String, usize),
    RaiseReturn(usize),
    /// Unwind to the innermost block marker and resume at its target.
    RaiseBreak,
    Jump(Target),
    JumpIfFalse(Target),
    /// Record the operand depth; a break resumes at the target.
    PushBlock(Target),
    /// Restore the depth recorded by the matching `PushBlock`.
    PopBlock,
    Import(String),
    Label(String),
    Mark,
    Rewind,
    /// Pops the callee and `argc` arguments and runs the call concurrently.
    Spawn(usize),
}

impl Instr {
    pub(crate) fn target_mut(&mut self) -> Option<&mut Target> {
        match self {
            Instr::Jump(t) | Instr::JumpIfFalse(t) | Instr::PushBlock(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Push(c) => write!(f, "Push {}", c),
            Instr::LoadLocal(slot) => write!(f, "LoadLocal {}", slot),
            Instr::StoreLocal(slot) => write!(f, "StoreLocal {}", slot),
            Instr::LoadUpval(idx) => write!(f, "LoadUpval {}", idx),
            Instr::StoreUpval(idx) => write!(f, "StoreUpval {}", idx),
            Instr::Pop => write!(f, "Pop"),
            Instr::PushModule(name) => write!(f, "PushModule {}", name),
            Instr::NewArray(n) => write!(f, "NewArray {}", n),
            Instr::NewSet(n) => write!(f, "NewSet {}", n),
            Instr::NewDict(n) => write!(f, "NewDict {}", n),
            Instr::PushClosure(id) => write!(f, "PushClosure {}", id),
            Instr::SendMethod(name, argc) => write!(f, "SendMethod {} {}", name, argc),
            Instr::RaiseReturn(n) => write!(f, "RaiseReturn {}", n),
            Instr::RaiseBreak => write!(f, "RaiseBreak"),
            Instr::Jump(t) => write!(f, "Jump {}", t),
            Instr::JumpIfFalse(t) => write!(f, "JumpIfFalse {}", t),
            Instr::PushBlock(t) => write!(f, "PushBlock {}", t),
            Instr::PopBlock => write!(f, "PopBlock"),
            Instr::Import(path) => write!(f, "Import {:?}", path),
            Instr::Label(name) => write!(f, "{}:", name),
            Instr::Mark => write!(f, "Mark"),
            Instr::Rewind => write!(f, "Rewind"),
            Instr::Spawn(argc) => write!(f, "Spawn {}", argc),
        }
    }
}
