use anyhow::{Result, anyhow};
use tern_core::module::Module;
use tern_core::val::{Obj, Object, arg};
use tracing::debug;

/// Host name from the environment, falling back to `localhost`.
fn hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|name| !name.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

fn no_args(args: &[Obj], name: &str) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{}() takes no arguments", name))
    }
}

#[derive(Debug, Default)]
pub struct OsModule;

impl OsModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for OsModule {
    fn name(&self) -> &str {
        "os"
    }

    fn description(&self) -> &str {
        "Process and environment access"
    }

    fn exports(&self) -> Vec<(String, Obj)> {
        vec![
            (
                "getpid".to_string(),
                Object::native("os.getpid", |_, args| {
                    no_args(args, "getpid")?;
                    Ok(vec![Object::int(std::process::id() as i64)])
                }),
            ),
            (
                "hostname".to_string(),
                Object::native("os.hostname", |_, args| {
                    no_args(args, "hostname")?;
                    Ok(vec![Object::string(&hostname())])
                }),
            ),
            (
                "getenv".to_string(),
                // unset variables read as the empty string
                Object::native("os.getenv", |_, args| {
                    let name = arg(args, 0, "os.getenv")?.expect_str("os.getenv")?;
                    let value = std::env::var(name).unwrap_or_default();
                    Ok(vec![Object::string(&value)])
                }),
            ),
            (
                "setenv".to_string(),
                Object::native("os.setenv", |_, args| {
                    let name = arg(args, 0, "os.setenv")?.expect_str("os.setenv")?;
                    let value = arg(args, 1, "os.setenv")?.expect_str("os.setenv")?;
                    if name.is_empty() || name.contains('=') {
                        return Err(anyhow!("setenv: invalid variable name {:?}", name));
                    }
                    unsafe {
                        std::env::set_var(name, value);
                    }
                    Ok(Vec::new())
                }),
            ),
            (
                "chdir".to_string(),
                Object::native("os.chdir", |_, args| {
                    let path = arg(args, 0, "os.chdir")?.expect_str("os.chdir")?;
                    std::env::set_current_dir(path).map_err(|e| anyhow!("chdir {}: {}", path, e))?;
                    Ok(Vec::new())
                }),
            ),
            (
                "exit".to_string(),
                Object::native("os.exit", |_, args| {
                    let code = match args.first() {
                        Some(code) => code.expect_int("os.exit")?,
                        None => 0,
                    };
                    debug!(code, "script requested exit");
                    std::process::exit(code as i32)
                }),
            ),
        ]
    }
}
