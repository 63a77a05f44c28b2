use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use airformula::{FormulaOptions, Parser as FormulaParser, Registry, compile_json};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "airformula", about = "Parse and compile Airtable-style formulas")]
struct Cli {
    /// JSON file with `functionNames` and `operatorSymbols` to use instead of
    /// the built-in Airtable registry.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token tree of a formula as JSON.
    Tokenize { formula: String },
    /// Print the reduced node tree of a formula as JSON.
    Tree {
        formula: String,
        /// Keep space nodes in the printed tree.
        #[arg(long)]
        keep_space: bool,
    },
    /// Print the array-notation value of a formula as JSON.
    Parse {
        formula: String,
        /// Skip the structural check against the registry.
        #[arg(long)]
        no_validate: bool,
    },
    /// Compile an array-notation JSON value (or `-` for stdin) to formula text.
    Compile { value: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let custom = cli.registry.as_deref().map(load_registry).transpose()?;
    let registry = match &custom {
        Some(registry) => registry,
        None => Registry::airtable(),
    };
    let parser = FormulaParser::new(registry);

    match cli.command {
        Command::Tokenize { formula } => {
            let tree = parser.tokenize(&formula)?;
            print_json(&tree)
        }
        Command::Tree {
            formula,
            keep_space,
        } => {
            let tree = parser.remove_space(!keep_space).parse_tree(&formula)?;
            print_json(&tree)
        }
        Command::Parse {
            formula,
            no_validate,
        } => {
            let options = FormulaOptions {
                validate: !no_validate,
            };
            let value = parser.parse_formula(&formula, options)?;
            print_json(&value)
        }
        Command::Compile { value } => {
            let text = if value == "-" {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading formula value from stdin")?;
                buf
            } else {
                value
            };
            let value: serde_json::Value =
                serde_json::from_str(&text).context("formula value is not valid JSON")?;
            println!("{}", compile_json(&value, registry)?);
            Ok(())
        }
    }
}

fn load_registry(path: &std::path::Path) -> Result<Registry> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading registry {}", path.display()))?;
    Registry::from_json(&json).with_context(|| format!("loading registry {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
