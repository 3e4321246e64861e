//! Runtime shared by every evaluation of one program
//!
//! Owns the module globals, the configuration and a tokio runtime whose
//! blocking pool runs evaluations and spawned tasks.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::env::Env;
use crate::util::lock;
use crate::val::{Obj, Object};

use super::Config;

/// A spawned evaluation
#[derive(Debug)]
struct Task {
    id: u64,
    name: String,
    handle: JoinHandle<Result<Vec<Obj>>>,
}

#[derive(Debug)]
pub struct Runtime {
    globals: Env,
    config: Config,
    tasks: Mutex<Vec<Task>>,
    next_task_id: AtomicU64,
    tokio_runtime: Option<tokio::runtime::Runtime>,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_stack_size(config.thread_stack_size);
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers.max(1));
        }
        let tokio_runtime = builder
            .build()
            .map_err(|e| anyhow!("Failed to create tokio runtime: {}", e))?;

        Ok(Runtime {
            globals: Env::new(),
            config,
            tasks: Mutex::new(Vec::new()),
            next_task_id: AtomicU64::new(1),
            tokio_runtime: Some(tokio_runtime),
        })
    }

    /// Module-level frame: namespaces and top-level bindings live here.
    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind a namespace dict `name` built from `(function name, callable)` pairs.
    pub fn register_functions(&self, name: &str, fns: Vec<(String, Obj)>) {
        debug!(namespace = name, functions = fns.len(), "registering namespace");
        self.globals.put(name, Object::namespace(fns));
    }

    /// Namespace registered under the full import path `name`.
    pub fn module(&self, name: &str) -> Option<Obj> {
        self.globals.get_local(name)
    }

    fn tokio(&self) -> Result<&tokio::runtime::Runtime> {
        self.tokio_runtime
            .as_ref()
            .ok_or_else(|| anyhow!("runtime is shut down"))
    }

    /// Run `job` on the blocking pool and wait for it.
    pub fn run<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let rt = self.tokio()?;
        rt.block_on(rt.spawn_blocking(job))
            .map_err(|e| anyhow!("evaluation thread failed: {}", e))?
    }

    /// Start `job` on the blocking pool without waiting. Returns the task id.
    pub fn spawn<F>(&self, name: &str, job: F) -> Result<u64>
    where
        F: FnOnce() -> Result<Vec<Obj>> + Send + 'static,
    {
        let id = self.next_task_id.fetch_add(1, Ordering::SeqCst);
        let handle = self.tokio()?.spawn_blocking(job);
        debug!(task = id, name, "spawned task");
        lock(&self.tasks).push(Task {
            id,
            name: name.to_string(),
            handle,
        });
        Ok(id)
    }

    /// Tasks started and not yet joined.
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Join every spawned task, including tasks spawned while waiting.
    ///
    /// Every failure is logged; the first one is returned.
    pub fn wait_all(&self) -> Result<()> {
        let rt = self.tokio()?;
        let mut first_err = None;
        loop {
            let batch: Vec<Task> = std::mem::take(&mut *lock(&self.tasks));
            if batch.is_empty() {
                break;
            }
            for task in batch {
                let outcome = match rt.block_on(task.handle) {
                    Ok(result) => result.map(|_| ()),
                    Err(join_err) => Err(anyhow!("task panicked: {}", join_err)),
                };
                if let Err(err) = outcome {
                    error!(task = task.id, name = %task.name, "task failed: {:#}", err);
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // A blocking-pool thread may hold the last reference; it must not block here.
        if let Some(rt) = self.tokio_runtime.take() {
            if tokio::runtime::Handle::try_current().is_ok() {
                rt.shutdown_background();
            } else {
                drop(rt);
            }
        }
    }
}
