use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(about = "Translate a VBA 6 module into JavaScript.")]
struct Args {
    /// VBA source file (e.g. an exported .bas module).
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let js = vb2js::convert(&source)
        .with_context(|| format!("translating {}", args.input.display()))?;

    print!("{js}");
    Ok(())
}
