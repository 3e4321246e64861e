use serde::{Deserialize, Serialize};

/// Engine limits and runtime sizing, usually loaded from a TOML file by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nested script calls allowed before `CallDepthExceeded`.
    pub max_call_depth: usize,
    /// Initial capacity of each evaluator's operand stack.
    pub stack_capacity: usize,
    /// Worker threads of the task runtime; `None` uses one per core.
    pub worker_threads: Option<usize>,
    /// Stack size of runtime threads, in bytes. Evaluation recurses on the host stack.
    pub thread_stack_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            stack_capacity: 64,
            worker_threads: None,
            thread_stack_size: 16 * 1024 * 1024,
        }
    }
}
