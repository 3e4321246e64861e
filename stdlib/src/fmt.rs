use std::io::Write;

use anyhow::Result;
use tern_core::module::Module;
use tern_core::val::{CallContext, Obj, Object, arg, send_one};

/// Text of `obj` for printing: strings as-is, everything else through its
/// `to_string` method so own-slot overrides apply.
pub fn display(ctx: &mut dyn CallContext, obj: &Obj) -> Result<String> {
    if let Some(text) = obj.as_str() {
        return Ok(text.to_string());
    }
    let shown = send_one(ctx, obj, "to_string", &[])?;
    Ok(match shown.as_str() {
        Some(text) => text.to_string(),
        None => shown.to_string(),
    })
}

/// Every argument displayed and joined by single spaces.
pub fn join(ctx: &mut dyn CallContext, args: &[Obj]) -> Result<String> {
    let mut out = String::new();
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&display(ctx, value)?);
    }
    Ok(out)
}

/// `{}` placeholders in `format` are replaced by `rest` in order. Unused
/// placeholders stay literal; leftover arguments are appended space-separated.
pub fn format_with(ctx: &mut dyn CallContext, format: &str, rest: &[Obj]) -> Result<String> {
    let mut out = String::with_capacity(format.len() + rest.len() * 8);
    let mut next = 0usize;
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            match rest.get(next) {
                Some(value) => {
                    out.push_str(&display(ctx, value)?);
                    next += 1;
                }
                None => out.push_str("{}"),
            }
        } else {
            out.push(c);
        }
    }
    if next < rest.len() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&join(ctx, &rest[next..])?);
    }
    Ok(out)
}

/// `format_with` for a script call whose first argument is the format string.
pub fn sprintf(ctx: &mut dyn CallContext, args: &[Obj], context: &str) -> Result<String> {
    let format = arg(args, 0, context)?.expect_str(context)?.to_string();
    format_with(ctx, &format, &args[1..])
}

fn write_stdout(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct FmtModule;

impl FmtModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for FmtModule {
    fn name(&self) -> &str {
        "fmt"
    }

    fn description(&self) -> &str {
        "Formatted printing to standard output"
    }

    fn exports(&self) -> Vec<(String, Obj)> {
        vec![
            (
                "print".to_string(),
                Object::native("fmt.print", |ctx, args| {
                    write_stdout(&join(ctx, args)?)?;
                    Ok(Vec::new())
                }),
            ),
            (
                "println".to_string(),
                Object::native("fmt.println", |ctx, args| {
                    write_stdout(&format!("{}\n", join(ctx, args)?))?;
                    Ok(Vec::new())
                }),
            ),
            (
                "printf".to_string(),
                Object::native("fmt.printf", |ctx, args| {
                    write_stdout(&sprintf(ctx, args, "fmt.printf")?)?;
                    Ok(Vec::new())
                }),
            ),
            (
                "sprint".to_string(),
                Object::native("fmt.sprint", |ctx, args| Ok(vec![Object::string(&join(ctx, args)?)])),
            ),
            (
                "sprintln".to_string(),
                Object::native("fmt.sprintln", |ctx, args| {
                    Ok(vec![Object::string(&format!("{}\n", join(ctx, args)?))])
                }),
            ),
            (
                "sprintf".to_string(),
                Object::native("fmt.sprintf", |ctx, args| {
                    Ok(vec![Object::string(&sprintf(ctx, args, "fmt.sprintf")?)])
                }),
            ),
        ]
    }
}
