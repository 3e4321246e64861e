//! Execution runtime: operand stack, configuration and the task runtime.

mod config;
mod runtime;
mod stack;

pub use config::Config;
pub use runtime::Runtime;
pub use stack::Stack;

#[cfg(test)]
mod concurrency_test;
#[cfg(test)]
mod stack_test;
