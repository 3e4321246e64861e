use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use tracing::debug;

use crate::rt::Runtime;
use crate::val::Obj;

/// Registry of host namespaces, installed into a [`Runtime`] before a
/// program runs.
///
/// Modules are keyed by their full import path (`math/rand`); scripts reach
/// them through `import`.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name. Disabled modules are kept but
    /// never installed.
    pub fn register_module(&mut self, module: Box<dyn Module>) -> Result<()> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(anyhow!("Module '{}' is already registered", name));
        }
        debug!(module = %name, enabled = module.enabled(), "registered module");
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get_module(&self, name: &str) -> Result<&dyn Module> {
        self.modules
            .get(name)
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| anyhow!("Module '{}' not found", name))
    }

    /// Registered module names, sorted.
    pub fn get_module_names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Initialize every enabled module and bind its exports as a namespace
    /// in the runtime globals.
    pub fn install(&self, rt: &Runtime) -> Result<()> {
        for (name, module) in &self.modules {
            if !module.enabled() {
                continue;
            }
            module.init()?;
            rt.register_functions(name, module.exports());
        }
        Ok(())
    }
}

/// A host namespace.
///
/// Each module hands out its functions as `(name, callable)` pairs; the
/// runtime wraps them into a dict bound under [`Module::name`].
pub trait Module: Send + Sync + std::fmt::Debug {
    /// Full import path, e.g. `math/rand`.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Functions exported by this module, in listing order.
    fn exports(&self) -> Vec<(String, Obj)>;

    /// Called once before the exports are installed.
    fn init(&self) -> Result<()> {
        Ok(())
    }
}
