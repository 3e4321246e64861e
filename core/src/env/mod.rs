//! Lexical environment: a chain of name-to-object frames.
//!
//! A frame's outer link is fixed when the frame is created, so the chain only
//! ever grows at its head. Frames are reference counted; every closure created
//! while a frame is live keeps it alive.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::util::{lock, ordered_map::OrderedMap};
use crate::val::Obj;

struct Frame {
    vars: Mutex<OrderedMap<Obj>>,
    outer: Option<Env>,
}

#[derive(Clone)]
pub struct Env(Arc<Frame>);

impl Env {
    /// A root frame with no outer link.
    pub fn new() -> Self {
        Env(Arc::new(Frame {
            vars: Mutex::new(OrderedMap::default()),
            outer: None,
        }))
    }

    /// A fresh frame whose outer link is `self`.
    pub fn child(&self) -> Self {
        Env(Arc::new(Frame {
            vars: Mutex::new(OrderedMap::default()),
            outer: Some(self.clone()),
        }))
    }

    pub fn outer(&self) -> Option<&Env> {
        self.0.outer.as_ref()
    }

    /// Bind or overwrite `name` in this frame.
    pub fn put(&self, name: impl Into<String>, obj: Obj) {
        lock(&self.0.vars).insert(name.into(), obj);
    }

    /// Look up `name` in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Obj> {
        lock(&self.0.vars).get(name).cloned()
    }

    /// Search outward; returns the bound object and the frame that owns it.
    pub fn lookup(&self, name: &str) -> Option<(Obj, Env)> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(obj) = env.get_local(name) {
                return Some((obj, env.clone()));
            }
            frame = env.outer();
        }
        None
    }

    pub fn get(&self, name: &str) -> Option<Obj> {
        self.lookup(name).map(|(obj, _)| obj)
    }

    /// Overwrite `name` in its owning frame. Returns false if unbound.
    pub fn set(&self, name: &str, obj: Obj) -> bool {
        match self.lookup(name) {
            Some((_, owner)) => {
                owner.put(name, obj);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.0.vars).keys().cloned().collect()
    }

    /// Number of frames from here to the root, counting this one.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self.outer();
        while let Some(env) = frame {
            depth += 1;
            frame = env.outer();
        }
        depth
    }

    pub fn ptr_eq(a: &Env, b: &Env) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

// Frames routinely contain closures that point back at them, so only names are shown.
impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("names", &self.names())
            .field("depth", &self.depth())
            .finish()
    }
}
