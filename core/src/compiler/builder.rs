use anyhow::{Result, anyhow};
use tracing::trace;

use crate::error::RuntimeError;

use super::instr::{Const, Instr, ProtoId, Target};
use super::{Proto, Upvalue};

/// Labels of the innermost enclosing loop.
#[derive(Debug, Clone, Copy)]
pub(super) struct LoopLabels {
    /// `continue` jumps here: the post statement or counter step.
    pub post: usize,
}

/// Prototype under construction.
pub(super) struct ProtoBuilder {
    id: ProtoId,
    name: String,
    params: Vec<String>,
    /// Names the front end declared local to this function.
    declared: Vec<String>,
    locals: Vec<String>,
    upvalues: Vec<Upvalue>,
    code: Vec<Instr>,
    labels: Vec<Option<usize>>,
    pub loops: Vec<LoopLabels>,
    hidden: usize,
}

impl ProtoBuilder {
    pub fn new(id: ProtoId, name: &str, params: Vec<String>, declared: Vec<String>) -> Self {
        let mut builder = Self {
            id,
            name: name.to_string(),
            params: Vec::new(),
            declared,
            locals: Vec::new(),
            upvalues: Vec::new(),
            code: Vec::new(),
            labels: Vec::new(),
            loops: Vec::new(),
            hidden: 0,
        };
        for param in &params {
            builder.declare(param);
        }
        builder.params = params;
        builder
    }

    pub fn local(&self, name: &str) -> Option<usize> {
        self.locals.iter().position(|l| l == name)
    }

    /// Slot for `name`, assigned on first declaration.
    pub fn declare(&mut self, name: &str) -> usize {
        match self.local(name) {
            Some(slot) => slot,
            None => {
                self.locals.push(name.to_string());
                self.locals.len() - 1
            }
        }
    }

    pub fn is_declared_local(&self, name: &str) -> bool {
        self.declared.iter().any(|n| n == name)
    }

    /// A fresh compiler-only local such as `#tmp3`.
    pub fn hidden(&mut self, prefix: &str) -> usize {
        let name = format!("#{}{}", prefix, self.hidden);
        self.hidden += 1;
        self.declare(&name)
    }

    pub fn upvalue(&self, name: &str) -> Option<usize> {
        self.upvalues.iter().position(|u| u.name == name)
    }

    pub fn add_upvalue(&mut self, name: &str, depth: usize, slot: usize) -> usize {
        self.upvalues.push(Upvalue {
            name: name.to_string(),
            depth,
            slot,
        });
        self.upvalues.len() - 1
    }

    pub fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    pub fn new_label(&mut self) -> usize {
        self.labels.push(None);
        self.labels.len() - 1
    }

    /// Bind `label` to the next instruction and mark it in the listing.
    pub fn place(&mut self, label: usize, name: &str) {
        if let Some(slot) = self.labels.get_mut(label) {
            *slot = Some(self.code.len());
        }
        self.code.push(Instr::Label(format!("{}{}", name, label)));
    }

    /// Rewrite every label target to its program counter.
    pub fn finish(mut self) -> Result<Proto> {
        for instr in &mut self.code {
            if let Some(target) = instr.target_mut() {
                if let Target::Label(id) = *target {
                    let pc = self
                        .labels
                        .get(id)
                        .copied()
                        .flatten()
                        .ok_or_else(|| anyhow!("label L{} in {} was never placed", id, self.name))?;
                    *target = Target::Pc(pc);
                }
            }
        }
        trace!(proto = self.id.0, name = %self.name, instrs = self.code.len(), "finished prototype");
        Ok(Proto {
            id: self.id,
            name: self.name,
            params: self.params,
            locals: self.locals,
            upvalues: self.upvalues,
            code: self.code,
        })
    }
}

/// Whole-program state: the prototype arena, the stack of prototypes being
/// built and the module names imported so far.
pub(super) struct Compiler {
    protos: Vec<Option<Proto>>,
    building: Vec<ProtoBuilder>,
    /// `(binding, path)` for every import.
    modules: Vec<(String, String)>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut compiler = Self {
            protos: Vec::new(),
            building: Vec::new(),
            modules: Vec::new(),
        };
        compiler.begin("<main>", Vec::new(), Vec::new());
        compiler
    }

    /// Start a nested prototype; it becomes the current one.
    pub fn begin(&mut self, name: &str, params: Vec<String>, declared: Vec<String>) -> ProtoId {
        let id = ProtoId(self.protos.len());
        self.protos.push(None);
        self.building.push(ProtoBuilder::new(id, name, params, declared));
        id
    }

    /// Finish the current prototype and store it in the arena.
    pub fn end(&mut self) -> Result<ProtoId> {
        let builder = self
            .building
            .pop()
            .ok_or_else(|| anyhow!("no prototype under construction"))?;
        let proto = builder.finish()?;
        let id = proto.id;
        self.protos[id.0] = Some(proto);
        Ok(id)
    }

    pub fn cur(&mut self) -> &mut ProtoBuilder {
        // non-empty between `new` and `finish`
        let last = self.building.len() - 1;
        &mut self.building[last]
    }

    pub fn emit(&mut self, instr: Instr) {
        self.cur().emit(instr);
    }

    pub fn push_const(&mut self, value: Const) {
        self.emit(Instr::Push(value));
    }

    pub fn send(&mut self, name: &str, argc: usize) {
        self.emit(Instr::SendMethod(name.to_string(), argc));
    }

    pub fn add_module(&mut self, binding: &str, path: &str) {
        if !self.modules.iter().any(|(_, p)| p == path) {
            self.modules.push((binding.to_string(), path.to_string()));
        }
    }

    fn module(&self, name: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|(binding, _)| binding == name)
            .map(|(binding, _)| binding.as_str())
    }

    /// Find `name` in an enclosing prototype and record it as an upvalue of
    /// the current one.
    fn capture(&mut self, name: &str) -> Option<usize> {
        let cur = self.building.len() - 1;
        let found = (1..=cur).find_map(|depth| {
            self.building[cur - depth]
                .local(name)
                .map(|slot| (depth, slot))
        })?;
        let (depth, slot) = found;
        Some(self.cur().add_upvalue(name, depth, slot))
    }

    /// Emit a read of `name`: local, upvalue, enclosing function, module.
    pub fn load_name(&mut self, name: &str) -> Result<()> {
        let constant = match name {
            "true" => Some(Const::Bool(true)),
            "false" => Some(Const::Bool(false)),
            "nil" => Some(Const::Nil),
            _ => None,
        };
        if let Some(value) = constant {
            self.push_const(value);
        } else if let Some(slot) = self.cur().local(name) {
            self.emit(Instr::LoadLocal(slot));
        } else if let Some(idx) = self.cur().upvalue(name) {
            self.emit(Instr::LoadUpval(idx));
        } else if let Some(idx) = self.capture(name) {
            self.emit(Instr::LoadUpval(idx));
        } else if let Some(module) = self.module(name).map(str::to_string) {
            self.emit(Instr::PushModule(module));
        } else {
            return Err(RuntimeError::UnresolvedName(name.to_string()).into());
        }
        Ok(())
    }

    /// Emit a write of the value on top of the stack to `name`. An unknown
    /// name, or one the function declared local, becomes a local here.
    /// Writes to `_` are dropped.
    pub fn store_name(&mut self, name: &str) {
        if name == "_" {
            self.emit(Instr::Pop);
            return;
        }
        let cur = self.cur();
        if let Some(slot) = cur.local(name) {
            cur.emit(Instr::StoreLocal(slot));
            return;
        }
        if cur.is_declared_local(name) {
            let slot = cur.declare(name);
            cur.emit(Instr::StoreLocal(slot));
            return;
        }
        if let Some(idx) = cur.upvalue(name) {
            cur.emit(Instr::StoreUpval(idx));
            return;
        }
        if let Some(idx) = self.capture(name) {
            self.emit(Instr::StoreUpval(idx));
            return;
        }
        let slot = self.cur().declare(name);
        self.emit(Instr::StoreLocal(slot));
    }

    /// Close the top-level prototype and hand out the finished module.
    pub fn finish(mut self) -> Result<super::CompiledModule> {
        self.end()?;
        if !self.building.is_empty() {
            return Err(anyhow!("{} prototype(s) left open", self.building.len()));
        }
        let protos = self
            .protos
            .into_iter()
            .enumerate()
            .map(|(idx, proto)| proto.ok_or_else(|| anyhow!("prototype #{} was never finished", idx)))
            .collect::<Result<Vec<_>>>()?;
        Ok(super::CompiledModule {
            protos,
            modules: self.modules.into_iter().map(|(_, path)| path).collect(),
        })
    }
}
