use std::io::Write;

use anyhow::{Result, anyhow};
use chrono::Local;
use tern_core::module::Module;
use tern_core::val::{Obj, Object};
use tracing::debug;

use crate::fmt::{join, sprintf};

/// `text` prefixed with the local date and time, newline-terminated.
pub fn line(text: &str) -> String {
    let stamp = Local::now().format("%Y/%m/%d %H:%M:%S");
    if text.ends_with('\n') {
        format!("{} {}", stamp, text)
    } else {
        format!("{} {}\n", stamp, text)
    }
}

fn write_stderr(text: &str) -> Result<()> {
    let mut err = std::io::stderr().lock();
    err.write_all(line(text).as_bytes())?;
    Ok(())
}

/// Timestamped logging to standard error
#[derive(Debug, Default)]
pub struct LogModule;

impl LogModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for LogModule {
    fn name(&self) -> &str {
        "log"
    }

    fn description(&self) -> &str {
        "Timestamped messages on standard error"
    }

    fn exports(&self) -> Vec<(String, Obj)> {
        vec![
            (
                "print".to_string(),
                Object::native("log.print", |ctx, args| {
                    write_stderr(&join(ctx, args)?)?;
                    Ok(Vec::new())
                }),
            ),
            (
                "println".to_string(),
                Object::native("log.println", |ctx, args| {
                    write_stderr(&join(ctx, args)?)?;
                    Ok(Vec::new())
                }),
            ),
            (
                "printf".to_string(),
                Object::native("log.printf", |ctx, args| {
                    write_stderr(&sprintf(ctx, args, "log.printf")?)?;
                    Ok(Vec::new())
                }),
            ),
            (
                "fatal".to_string(),
                Object::native("log.fatal", |ctx, args| {
                    let message = join(ctx, args)?;
                    write_stderr(&message)?;
                    debug!(%message, "log.fatal raised");
                    Err(anyhow!("fatal: {}", message))
                }),
            ),
        ]
    }
}
