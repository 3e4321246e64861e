//! Runtime object model.
//!
//! Every value is an [`Obj`]: a shared [`Object`] carrying its variant, its own
//! mutable slot table and a reference to the shared method table of its
//! variant. All behaviour is reached through [`send`].

mod containers;
mod convert;
mod foreign;
mod methods;
mod ops;
mod slots;
mod text;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::ast::FuncDecl;
use crate::env::Env;
use crate::util::lock;

pub use convert::arg;
pub use foreign::{Foreign, ForeignMethods, ForeignValue, HostFn, NativeFn, foreign_table};
pub use methods::{CallContext, MethodTable, NativeMethod, call_object, send, send_one, send_op};
pub use slots::SlotTable;
pub use text::Text;

pub type Obj = Arc<Object>;

pub struct Object {
    kind: ObjKind,
    slots: Mutex<SlotTable>,
    table: Arc<MethodTable>,
}

pub enum ObjKind {
    Int(i64),
    Float(f64),
    Str(Text),
    Bool(bool),
    Nil,
    Array(Mutex<Vec<Obj>>),
    /// Ordered like an array; duplicates are not rejected.
    Set(Mutex<Vec<Obj>>),
    Dict(Mutex<SlotTable>),
    Func(FuncValue),
    Native(HostFn),
    Foreign(ForeignValue),
}

#[derive(Clone)]
pub enum FuncKind {
    /// User function closing over the frame it was declared in.
    Closure { decl: Arc<FuncDecl>, env: Env },
    /// Shared-table method bound to its receiver.
    Bound { recv: Obj },
}

#[derive(Clone)]
pub struct FuncValue {
    pub name: String,
    pub kind: FuncKind,
}

static NIL: Lazy<Obj> = Lazy::new(|| Object::new(ObjKind::Nil));

const DISPLAY_DEPTH: usize = 16;

impl Object {
    fn new(kind: ObjKind) -> Obj {
        let table = methods::builtin_table(&kind);
        Self::with_table(kind, table)
    }

    pub(crate) fn with_table(kind: ObjKind, table: Arc<MethodTable>) -> Obj {
        Arc::new(Object {
            kind,
            slots: Mutex::new(SlotTable::new()),
            table,
        })
    }

    pub fn int(value: i64) -> Obj {
        Self::new(ObjKind::Int(value))
    }

    pub fn float(value: f64) -> Obj {
        Self::new(ObjKind::Float(value))
    }

    pub fn string(value: &str) -> Obj {
        Self::new(ObjKind::Str(Text::new(value)))
    }

    /// Fresh every time: own slots written on one bool must not show up on another.
    pub fn bool(value: bool) -> Obj {
        Self::new(ObjKind::Bool(value))
    }

    /// Process-wide singleton; it never takes own slots.
    pub fn nil() -> Obj {
        NIL.clone()
    }

    pub fn array(items: Vec<Obj>) -> Obj {
        Self::new(ObjKind::Array(Mutex::new(items)))
    }

    pub fn set(items: Vec<Obj>) -> Obj {
        Self::new(ObjKind::Set(Mutex::new(items)))
    }

    pub fn dict(entries: SlotTable) -> Obj {
        Self::new(ObjKind::Dict(Mutex::new(entries)))
    }

    /// Dict keyed by strings, in the given order.
    pub fn namespace(entries: Vec<(String, Obj)>) -> Obj {
        let table = entries
            .into_iter()
            .map(|(name, value)| (Object::string(&name), value))
            .collect();
        Self::dict(table)
    }

    pub fn closure(decl: Arc<FuncDecl>, env: Env) -> Obj {
        let name = decl.display_name().to_string();
        Self::new(ObjKind::Func(FuncValue {
            name,
            kind: FuncKind::Closure { decl, env },
        }))
    }

    pub fn bound(recv: Obj, method: &str) -> Obj {
        Self::new(ObjKind::Func(FuncValue {
            name: method.to_string(),
            kind: FuncKind::Bound { recv },
        }))
    }

    pub fn native<F>(name: &str, func: F) -> Obj
    where
        F: Fn(&mut dyn CallContext, &[Obj]) -> anyhow::Result<Vec<Obj>> + Send + Sync + 'static,
    {
        Self::new(ObjKind::Native(HostFn {
            name: name.to_string(),
            func: Arc::new(func),
        }))
    }

    pub fn foreign<T: Foreign>(value: T) -> Obj {
        let table = foreign_table::<T>();
        Self::with_table(ObjKind::Foreign(ForeignValue::new(value)), table)
    }

    pub fn kind(&self) -> &ObjKind {
        &self.kind
    }

    pub fn table(&self) -> &Arc<MethodTable> {
        &self.table
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ObjKind::Int(_) => "int",
            ObjKind::Float(_) => "float",
            ObjKind::Str(_) => "string",
            ObjKind::Bool(_) => "bool",
            ObjKind::Nil => "nil",
            ObjKind::Array(_) => "array",
            ObjKind::Set(_) => "set",
            ObjKind::Dict(_) => "dict",
            ObjKind::Func(_) => "func",
            ObjKind::Native(_) => "native",
            ObjKind::Foreign(value) => value.type_name(),
        }
    }

    /// The object's own slot table.
    pub fn slots(&self) -> MutexGuard<'_, SlotTable> {
        lock(&self.slots)
    }

    pub fn own_slot(&self, name: &str) -> Option<Obj> {
        self.slots().get_by_name(name)
    }

    pub fn set_slot(&self, key: Obj, value: Obj) {
        self.slots().insert(key, value);
    }

    /// Key under which this object is stored in slot tables and dicts.
    ///
    /// Keys carry a variant prefix, so `1` and `"1"` are distinct entries while
    /// `2` and `2.0` share one.
    pub fn hash_key(&self) -> String {
        match &self.kind {
            ObjKind::Str(s) => string_key(s.as_str()),
            ObjKind::Int(i) => format!("n:{}", itoa::Buffer::new().format(*i)),
            ObjKind::Float(f) => format!("n:{}", float_key(*f)),
            ObjKind::Bool(b) => format!("b:{}", b),
            ObjKind::Nil => "nil".to_string(),
            _ => format!("@{:p}", self as *const Object),
        }
    }

    /// Value equality for scalars, identity for everything else.
    pub fn equals(&self, other: &Object) -> bool {
        match (&self.kind, &other.kind) {
            (ObjKind::Int(a), ObjKind::Int(b)) => a == b,
            (ObjKind::Int(a), ObjKind::Float(b)) => (*a as f64) == *b,
            (ObjKind::Float(a), ObjKind::Int(b)) => *a == (*b as f64),
            (ObjKind::Float(a), ObjKind::Float(b)) => a == b,
            (ObjKind::Str(a), ObjKind::Str(b)) => a == b,
            (ObjKind::Bool(a), ObjKind::Bool(b)) => a == b,
            (ObjKind::Nil, ObjKind::Nil) => true,
            _ => std::ptr::eq(self, other),
        }
    }

    fn write_display(&self, f: &mut fmt::Formatter<'_>, depth: usize, quoted: bool) -> fmt::Result {
        if depth > DISPLAY_DEPTH {
            return f.write_str("...");
        }
        match &self.kind {
            ObjKind::Int(i) => write!(f, "{}", i),
            ObjKind::Float(v) => write!(f, "{}", v),
            ObjKind::Str(s) if quoted => write!(f, "{:?}", s),
            ObjKind::Str(s) => f.write_str(s.as_str()),
            ObjKind::Bool(b) => write!(f, "{}", b),
            ObjKind::Nil => f.write_str("nil"),
            ObjKind::Array(items) => {
                let items = lock(items).clone();
                write_seq(f, "[", &items, depth)
            }
            ObjKind::Set(items) => {
                let items = lock(items).clone();
                write_seq(f, "#[", &items, depth)
            }
            ObjKind::Dict(entries) => {
                let entries = lock(entries).entries();
                f.write_str("#{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_display(f, depth + 1, true)?;
                    f.write_str(": ")?;
                    value.write_display(f, depth + 1, true)?;
                }
                f.write_str("}")
            }
            ObjKind::Func(func) => write!(f, "<func {}>", func.name),
            ObjKind::Native(host) => write!(f, "<native {}>", host.name),
            ObjKind::Foreign(value) => match value.display() {
                Some(text) => f.write_str(&text),
                None => write!(f, "<{}>", value.type_name()),
            },
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Obj], depth: usize) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.write_display(f, depth + 1, true)?;
    }
    f.write_str("]")
}

/// Hash key of a string with this text.
pub(crate) fn string_key(text: &str) -> String {
    format!("s:{}", text)
}

// Integral floats share the key of the equal int so dict keys agree with `__eql__`.
fn float_key(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        itoa::Buffer::new().format(value as i64).to_string()
    } else {
        ryu::Buffer::new().format(value).to_string()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, 0, false)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name())?;
        self.write_display(f, 0, true)?;
        f.write_str(")")
    }
}
