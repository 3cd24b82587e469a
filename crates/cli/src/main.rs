//! blueprint: command line front-end for the Blueprint DSL parser.

use std::path::PathBuf;
use std::process;

use blueprint_core::{DslParser, IdentifierScope};
use clap::{Parser, Subcommand};

/// Blueprint architecture DSL toolchain.
#[derive(Parser)]
#[command(name = "blueprint", version, about = "Blueprint architecture DSL toolchain")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Restricted mode: no filesystem includes, docs, plugins, scripts, or
    /// environment substitution
    #[arg(long, global = true)]
    restricted: bool,

    /// Use hierarchical identifier scope
    #[arg(long, global = true)]
    hierarchical: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a DSL file or directory and emit the workspace as JSON
    Parse {
        /// Path to the DSL source file or directory
        file: PathBuf,
        /// Write JSON to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Parse a DSL file or directory and report a summary
    Check {
        /// Path to the DSL source file or directory
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut parser = DslParser::new();
    parser.set_restricted(cli.restricted);
    if cli.hierarchical {
        parser.set_identifier_scope(IdentifierScope::Hierarchical);
    }

    match cli.command {
        Commands::Parse { file, out } => {
            if let Err(e) = parser.parse_file(&file) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
            let workspace = match parser.workspace() {
                Some(ws) => ws,
                None => {
                    eprintln!("error: no workspace definition found in {}", file.display());
                    process::exit(1);
                }
            };
            let json = match workspace.to_json() {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("error: could not serialize workspace: {}", e);
                    process::exit(1);
                }
            };
            match out {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        eprintln!("error: could not write {}: {}", path.display(), e);
                        process::exit(1);
                    }
                }
                None => println!("{}", json),
            }
        }
        Commands::Check { file } => {
            if let Err(e) = parser.parse_file(&file) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
            match parser.workspace() {
                Some(ws) => {
                    println!(
                        "OK: {} elements, {} relationships, {} views",
                        ws.model.elements().count(),
                        ws.model.relationships().count(),
                        ws.views.views.len() + ws.views.filtered.len()
                    );
                }
                None => {
                    eprintln!("error: no workspace definition found in {}", file.display());
                    process::exit(1);
                }
            }
        }
    }
}
