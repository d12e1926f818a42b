use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use brine_thrift_compiler::config::DEFAULT_NAMESPACE_LANG;
use brine_thrift_compiler::{compile_file_with, parse, CompileError, CompilerConfig};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bthrift")]
#[command(about = "Parse or compile Thrift IDL files and print the result as JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a `.thrift` file and print its syntax tree
    Parse {
        /// Input `.thrift` file
        input: PathBuf,
    },

    /// Compile a `.thrift` file, following its includes, and print the schema
    Compile {
        /// Input `.thrift` file
        input: PathBuf,

        /// Extra directory to search for included files (repeatable)
        #[arg(short = 'I', long = "include-dir")]
        include_dirs: Vec<PathBuf>,

        /// Language tag whose `namespace` declarations apply
        #[arg(long, default_value = DEFAULT_NAMESPACE_LANG)]
        lang: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CompileError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CompileError::Io(e.into()))?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<(), CompileError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { input } => {
            let text = fs::read_to_string(input).map_err(|e| CompileError::Io(e).in_file(input))?;
            let ast = parse(&text).map_err(|source| CompileError::Parse { path: input.clone(), source })?;
            debug!(nodes = ast.len(), "parsed {}", input.display());
            print_json(&ast)
        }

        Commands::Compile { input, include_dirs, lang } => {
            let config = include_dirs
                .iter()
                .fold(CompilerConfig::new().namespace_lang(lang), |config, dir| config.include_dir(dir));
            let schema = compile_file_with(input, &config)?;
            debug!(
                structs = schema.structs.len(),
                services = schema.services.len(),
                "compiled {}",
                input.display()
            );
            print_json(&schema)
        }
    }
}
