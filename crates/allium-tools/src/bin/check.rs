//!
//! Checks an Allium specification file and reports diagnostics.
//!
//! Usage: `allium-check <file>`

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "allium-check")]
#[command(about = "Check an Allium specification and report diagnostics")]
struct Args {
    /// Path to the specification file
    path: PathBuf,
}

fn main() {
    allium_tools::init_logging();

    let args = Args::parse();
    let filename = args.path.display().to_string();

    let source = match std::fs::read_to_string(&args.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    info!("checking {}", filename);
    let diagnostics = allium_lang::check(&filename, &source);
    debug!("{} diagnostic(s)", diagnostics.len());

    if diagnostics.is_empty() {
        process::exit(0);
    }

    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }
    process::exit(1);
}
