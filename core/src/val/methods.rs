use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::ast::FuncDecl;
use crate::env::Env;
use crate::error::RuntimeError;
use crate::op::Protocol;
use crate::util::ordered_map::OrderedMap;

use super::convert::arg;
use super::{FuncKind, Obj, ObjKind, Object, containers, ops};

/// Entry of a shared method table: `(ctx, receiver, args) -> results`.
pub type NativeMethod = Arc<dyn Fn(&mut dyn CallContext, &Obj, &[Obj]) -> Result<Vec<Obj>> + Send + Sync>;

/// What dispatch needs from the engine running it: a way to run user closures
/// and a bound on how deeply calls may nest.
pub trait CallContext {
    fn call_closure(&mut self, decl: &Arc<FuncDecl>, env: &Env, args: &[Obj]) -> Result<Vec<Obj>>;

    /// Enter one call level; fails with `CallDepthExceeded` at the limit.
    fn enter_call(&mut self) -> Result<()> {
        Ok(())
    }

    fn leave_call(&mut self) {}
}

/// Shared, per-variant method dictionary.
pub struct MethodTable {
    type_name: &'static str,
    methods: OrderedMap<NativeMethod>,
}

impl MethodTable {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            methods: OrderedMap::default(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn insert<F>(&mut self, name: &str, method: F)
    where
        F: Fn(&mut dyn CallContext, &Obj, &[Obj]) -> Result<Vec<Obj>> + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(method) as NativeMethod);
    }

    pub fn get(&self, name: &str) -> Option<NativeMethod> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("type_name", &self.type_name)
            .field("methods", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolve `name` on `recv` and invoke it.
///
/// The receiver's own slots are consulted first, so a per-instance entry
/// shadows the shared method of the same name for that instance only.
pub fn send(ctx: &mut dyn CallContext, recv: &Obj, name: &str, args: &[Obj]) -> Result<Vec<Obj>> {
    if let Some(own) = recv.own_slot(name) {
        trace!(receiver = recv.type_name(), method = name, "send: own slot");
        return call_object(ctx, &own, args);
    }
    match recv.table().get(name) {
        Some(method) => {
            trace!(receiver = recv.type_name(), method = name, "send: shared table");
            method(ctx, recv, args)
        }
        None => Err(RuntimeError::MethodNotFound {
            receiver: recv.type_name(),
            name: name.to_string(),
        }
        .into()),
    }
}

/// `send`, keeping only the first result (nil when there is none).
pub fn send_one(ctx: &mut dyn CallContext, recv: &Obj, name: &str, args: &[Obj]) -> Result<Obj> {
    let results = send(ctx, recv, name, args)?;
    Ok(results.into_iter().next().unwrap_or_else(Object::nil))
}

pub fn send_op(ctx: &mut dyn CallContext, recv: &Obj, proto: Protocol, args: &[Obj]) -> Result<Obj> {
    send_one(ctx, recv, proto.name(), args)
}

/// Invoke any object as a function.
///
/// Closures run through the context, bound methods re-dispatch on their
/// receiver, host functions run directly and anything else is sent `__call__`.
/// Re-dispatch hops (bound methods, `__call__`) count as call levels, so an own
/// slot that leads back to itself ends in `CallDepthExceeded`.
pub fn call_object(ctx: &mut dyn CallContext, callee: &Obj, args: &[Obj]) -> Result<Vec<Obj>> {
    match callee.kind() {
        ObjKind::Func(func) => match &func.kind {
            FuncKind::Closure { decl, env } => ctx.call_closure(decl, env, args),
            FuncKind::Bound { recv } => redispatch(ctx, recv, &func.name, args),
        },
        ObjKind::Native(host) => (host.func)(ctx, args),
        _ => redispatch(ctx, callee, Protocol::Call.name(), args),
    }
}

fn redispatch(ctx: &mut dyn CallContext, recv: &Obj, name: &str, args: &[Obj]) -> Result<Vec<Obj>> {
    ctx.enter_call()?;
    let result = send(ctx, recv, name, args);
    ctx.leave_call();
    result
}

/// Entries every variant answers to.
pub(super) fn install_common(table: &mut MethodTable) {
    table.insert(Protocol::GetProperty.name(), |_, recv, args| {
        let name = arg(args, 0, "__get_property__")?;
        Ok(vec![get_own_or_shared(recv, name)?])
    });
    table.insert(Protocol::SetProperty.name(), |_, recv, args| {
        let name = arg(args, 0, "__set_property__")?;
        let value = arg(args, 1, "__set_property__")?;
        if recv.is_nil() {
            return Err(RuntimeError::type_shape("object with own slots", "nil", "__set_property__").into());
        }
        recv.set_slot(name.clone(), value.clone());
        Ok(vec![])
    });
    table.insert(Protocol::Eql.name(), |_, recv, args| {
        let other = arg(args, 0, "__eql__")?;
        Ok(vec![Object::bool(recv.equals(other))])
    });
    table.insert(Protocol::Neq.name(), |_, recv, args| {
        let other = arg(args, 0, "__neq__")?;
        Ok(vec![Object::bool(!recv.equals(other))])
    });
    table.insert("to_string", |_, recv, _| Ok(vec![Object::string(&recv.to_string())]));
}

/// Own slot, then a shared method bound to `recv`.
pub(super) fn get_own_or_shared(recv: &Obj, name: &Obj) -> Result<Obj> {
    if let Some(value) = recv.slots().get(name) {
        return Ok(value);
    }
    let key = match name.as_str() {
        Some(text) => text.to_string(),
        None => name.to_string(),
    };
    if recv.table().contains(&key) {
        return Ok(Object::bound(recv.clone(), &key));
    }
    Err(RuntimeError::MethodNotFound {
        receiver: recv.type_name(),
        name: key,
    }
    .into())
}

fn build(type_name: &'static str, install: impl FnOnce(&mut MethodTable)) -> Arc<MethodTable> {
    let mut table = MethodTable::new(type_name);
    install_common(&mut table);
    install(&mut table);
    Arc::new(table)
}

fn install_callable(table: &mut MethodTable) {
    table.insert(Protocol::Call.name(), |ctx, recv, args| call_object(ctx, recv, args));
}

static INT_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("int", ops::install_int));
static FLOAT_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("float", ops::install_float));
static STR_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| {
    build("string", |t| {
        ops::install_string(t);
        containers::install_string(t);
    })
});
static BOOL_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("bool", ops::install_bool));
static NIL_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("nil", |_| {}));
static ARRAY_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("array", containers::install_array));
static SET_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("set", containers::install_set));
static DICT_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("dict", containers::install_dict));
static FUNC_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("func", install_callable));
static NATIVE_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("native", install_callable));
static FOREIGN_BASE_TABLE: Lazy<Arc<MethodTable>> = Lazy::new(|| build("foreign", |_| {}));

pub(super) fn builtin_table(kind: &ObjKind) -> Arc<MethodTable> {
    let table = match kind {
        ObjKind::Int(_) => &INT_TABLE,
        ObjKind::Float(_) => &FLOAT_TABLE,
        ObjKind::Str(_) => &STR_TABLE,
        ObjKind::Bool(_) => &BOOL_TABLE,
        ObjKind::Nil => &NIL_TABLE,
        ObjKind::Array(_) => &ARRAY_TABLE,
        ObjKind::Set(_) => &SET_TABLE,
        ObjKind::Dict(_) => &DICT_TABLE,
        ObjKind::Func(_) => &FUNC_TABLE,
        ObjKind::Native(_) => &NATIVE_TABLE,
        ObjKind::Foreign(_) => &FOREIGN_BASE_TABLE,
    };
    Arc::clone(&**table)
}

/// Start a table for a foreign type: the common entries are always present.
pub(super) fn foreign_base(type_name: &'static str) -> MethodTable {
    let mut table = MethodTable::new(type_name);
    install_common(&mut table);
    table
}
