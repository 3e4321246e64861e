use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Once};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tern_core::{
    ast::Program,
    compiler::compile,
    interp::Interpreter,
    rt::{Config, Runtime},
    token::describe,
};
use tracing::debug;


static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "tern_core=info,tern_stdlib=info,tern_cli=info";

#[derive(Debug, Parser)]
#[command(name = "tern", author, version, about = "Run or lower tern syntax trees", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate a JSON syntax tree and print its top-level return values.
    Run {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// TOML file with a `[runtime]` table
        #[arg(long, value_name = "FILE", value_parser = parse_sanitized_path)]
        config: Option<PathBuf>,
        /// Source text the tree was parsed from, for line:column positions in errors
        #[arg(long, value_name = "FILE", value_parser = parse_sanitized_path)]
        source: Option<PathBuf>,
    },
    /// Lower a JSON syntax tree and print the instruction listing.
    Compile {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Dump the compiled module as JSON instead of the listing
        #[arg(long)]
        json: bool,
        #[arg(long, value_name = "FILE", value_parser = parse_sanitized_path)]
        source: Option<PathBuf>,
    },
}

/// Settings file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    runtime: Config,
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", path.display(), e))
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `TERN_TRACE=1` logs with the default filter (or `RUST_LOG`); any other
/// non-off value is used as the filter itself.
fn maybe_init_tracing() {
    let raw = match std::env::var("TERN_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = read_file_content(path)?;
    let file: FileConfig = toml::from_str(&text).with_context(|| format!("invalid config '{}'", path.display()))?;
    debug!(runtime = ?file.runtime, "loaded config");
    Ok(file.runtime)
}

fn read_program(path: &Path) -> anyhow::Result<Program> {
    let text = read_file_content(path)?;
    Program::from_json(&text).with_context(|| format!("'{}' is not a syntax tree", path.display()))
}

fn read_source(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(read_file_content).transpose()
}

/// Print an engine error with its position and exit with status 1.
fn fail(err: &anyhow::Error, source: Option<&str>) -> ! {
    eprintln!("{}", describe(err, source));
    std::process::exit(1);
}

fn run_file(file: &Path, config: Option<&Path>, source: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let program = read_program(file)?;
    let source = read_source(source)?;

    let rt = Arc::new(Runtime::new(config)?);
    tern_stdlib::install_stdlib(&rt)?;

    let worker_rt = Arc::clone(&rt);
    let outcome = rt.run(move || Interpreter::new(worker_rt).run(&program));
    // spawned tasks finish even when the main program failed
    let joined = rt.wait_all();

    let values = match outcome.and_then(|values| joined.map(|_| values)) {
        Ok(values) => values,
        Err(err) => fail(&err, source.as_deref()),
    };
    for value in values {
        println!("{}", value);
    }
    Ok(())
}

fn compile_file(file: &Path, json: bool, source: Option<&Path>) -> anyhow::Result<()> {
    let program = read_program(file)?;
    let source = read_source(source)?;
    let module = match compile(&program) {
        Ok(module) => module,
        Err(err) => fail(&err, source.as_deref()),
    };
    if json {
        println!("{}", module.to_json()?);
    } else {
        print!("{}", module);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();
    let args = CliArgs::parse();
    match args.command {
        Commands::Run { file, config, source } => run_file(&file, config.as_deref(), source.as_deref()),
        Commands::Compile { file, json, source } => compile_file(&file, json, source.as_deref()),
    }
}
