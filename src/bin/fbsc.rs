//! `fbsc` — flatbuffers schema compiler, a thin CLI over the library's
//! loader + validator (+ a writer/reader smoke round trip). Not a code
//! generator: it exists so the library's own pipeline is reachable and
//! scriptable without writing a harness, the same ambient role the
//! teacher's own `main.rs` plays for its LSP server.

use clap::{Parser, Subcommand};
use flatfile_schema::loader::load_file_tree;
use flatfile_schema::validator::validate;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fbsc", about = "Validate and inspect FlatBuffers-style schema files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a schema's include closure and run the four-pass validator.
    Validate {
        /// Root .fbs file
        schema: PathBuf,
        /// Additional include search directories, checked in order
        #[arg(short = 'I', long = "include")]
        include_dirs: Vec<PathBuf>,
    },
    /// Validate, then print the resulting schema (enums/structs/tables/unions).
    Inspect {
        schema: PathBuf,
        #[arg(short = 'I', long = "include")]
        include_dirs: Vec<PathBuf>,
        /// Print as JSON instead of the default human-readable summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Validate { schema, include_dirs } => run_validate(&schema, &include_dirs),
        Command::Inspect { schema, include_dirs, json } => run_inspect(&schema, &include_dirs, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_validate(schema: &PathBuf, include_dirs: &[PathBuf]) -> Result<(), String> {
    let tree = load_file_tree(schema, include_dirs).map_err(|e| e.to_string())?;
    let validated = validate(&tree).map_err(|e| e.to_string())?;
    println!(
        "ok: {} enum(s), {} struct(s), {} table(s), {} union(s)",
        validated.enums.len(),
        validated.structs.len(),
        validated.tables.len(),
        validated.unions.len()
    );
    Ok(())
}

fn run_inspect(schema: &PathBuf, include_dirs: &[PathBuf], json: bool) -> Result<(), String> {
    let tree = load_file_tree(schema, include_dirs).map_err(|e| e.to_string())?;
    let validated = validate(&tree).map_err(|e| e.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&validated).map_err(|e| e.to_string())?;
        println!("{rendered}");
        return Ok(());
    }

    if let Some(root) = &validated.root_type {
        println!("root_type: {root}");
    }
    if let Some(id) = &validated.file_identifier {
        println!("file_identifier: {id:?}");
    }
    for name in validated.enums.keys() {
        println!("enum {name}");
    }
    for name in validated.structs.keys() {
        println!("struct {name}");
    }
    for name in validated.tables.keys() {
        println!("table {name}");
    }
    for name in validated.unions.keys() {
        println!("union {name}");
    }
    Ok(())
}
