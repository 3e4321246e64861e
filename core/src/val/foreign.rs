//! Bridge for host values and host functions.
//!
//! A host type opts in by implementing [`Foreign`]. Its method table is built
//! the first time a value of that type is wrapped and is shared by every later
//! value of the same type.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::RuntimeError;

use super::methods::{self, CallContext, MethodTable};
use super::{Obj, ObjKind};

/// Host function callable from scripts: `(ctx, args) -> results`.
pub type NativeFn = Arc<dyn Fn(&mut dyn CallContext, &[Obj]) -> Result<Vec<Obj>> + Send + Sync>;

#[derive(Clone)]
pub struct HostFn {
    pub name: String,
    pub func: NativeFn,
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFn({})", self.name)
    }
}

/// A host type exposed to scripts.
pub trait Foreign: Send + Sync + fmt::Debug + 'static {
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn register_methods(methods: &mut ForeignMethods<Self>)
    where
        Self: Sized;

    /// Text used when the value is printed; `None` prints `<type_name>`.
    fn display(&self) -> Option<String> {
        None
    }
}

/// Builder handed to [`Foreign::register_methods`].
pub struct ForeignMethods<T> {
    table: MethodTable,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Foreign> ForeignMethods<T> {
    /// Register `name`; the closure receives the unwrapped host value.
    pub fn method<F>(&mut self, name: &str, method: F) -> &mut Self
    where
        F: Fn(&mut dyn CallContext, &T, &[Obj]) -> Result<Vec<Obj>> + Send + Sync + 'static,
    {
        let label = name.to_string();
        self.table.insert(name, move |ctx, recv, args| {
            let value = downcast::<T>(recv, &label)?;
            method(ctx, value, args)
        });
        self
    }
}

fn downcast<'a, T: Foreign>(recv: &'a Obj, context: &str) -> Result<&'a T> {
    match recv.kind() {
        ObjKind::Foreign(value) => value
            .downcast_ref::<T>()
            .ok_or_else(|| RuntimeError::type_shape(T::type_name(), value.type_name(), context).into()),
        _ => Err(RuntimeError::type_shape(T::type_name(), recv.type_name(), context).into()),
    }
}

static REGISTRY: Lazy<DashMap<TypeId, Arc<MethodTable>>> = Lazy::new(DashMap::new);

/// The memoized method table for `T`, built on first use.
pub fn foreign_table<T: Foreign>() -> Arc<MethodTable> {
    let id = TypeId::of::<T>();
    if let Some(table) = REGISTRY.get(&id) {
        return Arc::clone(table.value());
    }
    // Built outside the map lock: registration may wrap other foreign types.
    let mut builder = ForeignMethods::<T> {
        table: methods::foreign_base(T::type_name()),
        _marker: PhantomData,
    };
    T::register_methods(&mut builder);
    debug!(
        type_name = T::type_name(),
        methods = builder.table.len(),
        "registered foreign type"
    );
    let entry = REGISTRY.entry(id).or_insert_with(|| Arc::new(builder.table));
    Arc::clone(entry.value())
}

/// Opaque host value stored inside an object.
pub struct ForeignValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    display: fn(&(dyn Any + Send + Sync)) -> Option<String>,
}

fn display_as<T: Foreign>(value: &(dyn Any + Send + Sync)) -> Option<String> {
    value.downcast_ref::<T>().and_then(Foreign::display)
}

impl ForeignValue {
    pub(super) fn new<T: Foreign>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: T::type_name(),
            display: display_as::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Foreign>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn display(&self) -> Option<String> {
        (self.display)(&*self.value)
    }
}

impl fmt::Debug for ForeignValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignValue({})", self.type_name)
    }
}
