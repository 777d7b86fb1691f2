// CLI binary — exiting on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;

use style_functions::description::FunctionDescription;
use style_functions::settings::{self, CompilerSettings};
use style_functions::ExpressionCompiler;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stylefn-cli", about = "Compile and serialize style functions", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compiler settings file (JSON)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an expression array into an expression tree
    Compile {
        /// Input file, or `-` for stdin
        input: String,
    },
    /// Build a stops-backed function and print its value object
    Serialize {
        /// Input file, or `-` for stdin
        input: String,
    },
    /// Print the JSON schema of the settings file
    Schema,
}

fn read_input(input: &str) -> Result<Value, String> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(Path::new(input))
            .map_err(|e| format!("failed to read {input}: {e}"))?
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {input}: {e}"))
}

fn load_settings(path: Option<&Path>) -> CompilerSettings {
    let Some(path) = path else {
        return CompilerSettings::default();
    };
    settings::load_settings(path).unwrap_or_else(|| {
        log::warn!("Settings {} not loaded, using defaults", path.display());
        CompilerSettings::default()
    })
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Compile { input } => {
            let compiler = ExpressionCompiler::new(load_settings(cli.settings.as_deref()));
            let value = read_input(&input)?;
            let node = compiler
                .compile_value(&value)
                .map_err(|e| e.to_string())?;
            log::debug!("depth {}, {} nodes", node.depth(), node.node_count());
            if cli.json {
                println!("{node}");
            } else {
                println!("{node:#?}");
            }
        }
        Commands::Serialize { input } => {
            let value = read_input(&input)?;
            let function = FunctionDescription::from_value(value)
                .and_then(FunctionDescription::into_function)
                .map_err(|e| e.to_string())?;
            let obj = function.to_value_object().map_err(|e| e.to_string())?;
            let text = if cli.json {
                serde_json::to_string(&obj)
            } else {
                serde_json::to_string_pretty(&obj)
            };
            println!("{}", text.map_err(|e| e.to_string())?);
        }
        Commands::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&settings::settings_schema()).map_err(|e| e.to_string())?
            );
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
