//! regcc
//!
//! A small compiler for a C-like language that keeps every intermediate value
//! in a register and emits x86-64 assembly.

mod frontend;
mod middle;
mod backend;
mod utils;
mod feedback;
mod driver;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use feedback::ErrorReport;

/// regcc compiler
#[derive(Parser, Debug)]
#[command(name = "regcc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Compile a small C-like language to x86-64 assembly")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Compile the given source text instead of a file
    #[arg(short = 'e', long = "expr", value_name = "SOURCE", conflicts_with = "input")]
    expr: Option<String>,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Emit the token stream as JSON
    #[arg(long, global = true)]
    emit_tokens: bool,

    /// Emit the analyzed syntax tree as JSON
    #[arg(long, global = true, conflicts_with = "emit_tokens")]
    emit_ast: bool,

    /// Diagnostic rendering
    #[arg(long, value_enum, default_value_t = ErrorFormat::Human, global = true)]
    error_format: ErrorFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file to assembly
    Build {
        /// Input source file
        input: PathBuf,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorFormat {
    Human,
    Json,
}

/// Source text and the name diagnostics refer to it by
struct Input {
    name: String,
    source: String,
}

impl Input {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self {
            name: path.display().to_string(),
            source,
        })
    }

    fn inline(source: &str) -> Self {
        Self {
            name: "<expr>".to_string(),
            source: source.to_string(),
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Build { input }) => build(&Input::load(input)?, cli),
        Some(Commands::Check { input }) => check(&Input::load(input)?, cli),
        Some(Commands::Version) => {
            println!("regcc 0.1.0");
            println!("License: Apache-2.0");
            Ok(())
        }
        None => {
            let input = match (&cli.input, &cli.expr) {
                (Some(path), _) => Input::load(path)?,
                (None, Some(expr)) => Input::inline(expr),
                (None, None) => {
                    eprintln!("Error: No input file specified");
                    eprintln!("Usage: regcc <FILE>, regcc -e <SOURCE> or regcc build <FILE>");
                    process::exit(1);
                }
            };
            build(&input, cli)
        }
    }
}

/// Compile and write assembly, or the requested JSON dump
fn build(input: &Input, cli: &Cli) -> anyhow::Result<()> {
    log::info!("compiling {}", input.name);

    let text = if cli.emit_tokens {
        let tokens = driver::tokenize(&input.source).unwrap_or_else(|e| fail(&e, input, cli));
        serde_json::to_string_pretty(&tokens)?
    } else if cli.emit_ast {
        let program = driver::analyze(&input.source).unwrap_or_else(|e| fail(&e, input, cli));
        serde_json::to_string_pretty(&program)?
    } else {
        let lines = driver::compile(&input.source).unwrap_or_else(|e| fail(&e, input, cli));
        lines.join("\n")
    };

    write_output(cli.output.as_deref(), &text)
}

/// Lex, parse and analyze only
fn check(input: &Input, cli: &Cli) -> anyhow::Result<()> {
    let program = driver::analyze(&input.source).unwrap_or_else(|e| fail(&e, input, cli));
    println!("{}: {} functions, no errors found", input.name, program.functions.len());
    Ok(())
}

fn write_output(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, format!("{}\n", text))
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).context("failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Report a compilation error and exit without producing output
fn fail(error: &utils::Error, input: &Input, cli: &Cli) -> ! {
    let report = ErrorReport::from_error(error, &input.name);

    match cli.error_format {
        ErrorFormat::Human => eprintln!("{}", report.render_human()),
        ErrorFormat::Json => eprintln!("{}", report.to_json()),
    }

    process::exit(report.exit_code());
}
