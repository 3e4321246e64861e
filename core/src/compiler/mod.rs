//! Lowers a syntax tree to stack-machine instructions for an external engine.
//!
//! Names are resolved statically: locals get slots in their prototype,
//! captured variables become upvalue entries (`depth` prototypes out, `slot`
//! in that prototype), and imported modules are referenced by name. Control
//! flow uses symbolic labels resolved when each prototype is finished.

mod builder;
mod expr;
mod instr;
mod stmt;

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::ast::Program;

pub use instr::{Const, Instr, ProtoId, Target};

/// Variable captured from an enclosing prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upvalue {
    pub name: String,
    /// How many prototypes out the owner is.
    pub depth: usize,
    /// Local slot in the owning prototype.
    pub slot: usize,
}

/// Compiled template for one function body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proto {
    pub id: ProtoId,
    pub name: String,
    pub params: Vec<String>,
    /// Slot names, parameters first. Compiler temporaries start with `#`.
    pub locals: Vec<String>,
    pub upvalues: Vec<Upvalue>,
    pub code: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledModule {
    /// Prototype arena indexed by [`ProtoId`]; entry 0 is the top level.
    pub protos: Vec<Proto>,
    /// Import paths in first-import order.
    pub modules: Vec<String>,
}

impl CompiledModule {
    pub fn main(&self) -> Option<&Proto> {
        self.protos.first()
    }

    pub fn proto(&self, id: ProtoId) -> Option<&Proto> {
        self.protos.get(id.0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compile a whole program.
pub fn compile(program: &Program) -> Result<CompiledModule> {
    let mut compiler = builder::Compiler::new();
    compiler.stmts(&program.stmts)?;
    let module = compiler.finish()?;
    debug!(protos = module.protos.len(), modules = module.modules.len(), "compiled program");
    Ok(module)
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "proto {} {}({})", self.id, self.name, self.params.join(", "))?;
        writeln!(f, "  locals: [{}]", self.locals.join(", "))?;
        if !self.upvalues.is_empty() {
            let ups: Vec<String> = self
                .upvalues
                .iter()
                .map(|u| format!("{}@{}:{}", u.name, u.depth, u.slot))
                .collect();
            writeln!(f, "  upvalues: [{}]", ups.join(", "))?;
        }
        for (pc, instr) in self.code.iter().enumerate() {
            match instr {
                Instr::Label(_) => writeln!(f, "{:04}  {}", pc, instr)?,
                _ => writeln!(f, "{:04}    {}", pc, instr)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.modules.is_empty() {
            writeln!(f, "modules: {}", self.modules.join(", "))?;
        }
        for (i, proto) in self.protos.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", proto)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
