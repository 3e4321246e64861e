pub mod fmt;
pub mod log;
pub mod os;
pub mod rand;
pub mod time;

#[cfg(test)]
mod os_test;
#[cfg(test)]
mod time_test;

use anyhow::Result;
use tern_core::module::ModuleRegistry;
use tern_core::rt::Runtime;

/// Register all stdlib modules with the given registry
pub fn register_stdlib_modules(registry: &mut ModuleRegistry) -> Result<()> {
    registry.register_module(Box::new(fmt::FmtModule::new()))?;
    registry.register_module(Box::new(log::LogModule::new()))?;
    registry.register_module(Box::new(os::OsModule::new()))?;
    registry.register_module(Box::new(time::TimeModule::new()))?;
    registry.register_module(Box::new(rand::RandModule::new()))?;
    Ok(())
}

/// Register and install every stdlib namespace into `rt`.
pub fn install_stdlib(rt: &Runtime) -> Result<()> {
    let mut registry = ModuleRegistry::new();
    register_stdlib_modules(&mut registry)?;
    registry.install(rt)
}
