use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use theftasm::assembler;
use theftasm::logging::{error, info};

/// Assembler for the Theft fantasy CPU
#[derive(Parser, Debug)]
#[command(name = "tasm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Assembler for the Theft fantasy CPU", long_about = None)]
struct Cli {
    /// The input assembly source
    #[arg(short = 'i', long = "in", value_name = "FILE")]
    input: String,

    /// The output filename
    #[arg(short = 'o', long = "out", value_name = "FILE", default_value = "asm.out")]
    output: PathBuf,

    /// The output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "rom")]
    format: OutputFormat,

    /// Colon-separated list of directories to search through for
    /// included files
    #[arg(short = 's', long = "search-dirs", value_name = "DIRS")]
    search_dirs: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// A raw binary image
    Rom,
    /// The wrapped executable container
    Tef,
}

fn main() {
    let cli = Cli::parse();

    println!("tasm {}\n", env!("CARGO_PKG_VERSION"));

    if matches!(cli.format, OutputFormat::Tef) {
        error("the tef output format is not supported yet".to_string());
        std::process::exit(3);
    }

    let search_dirs: Vec<PathBuf> = cli
        .search_dirs
        .as_deref()
        .unwrap_or("")
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect();

    let image = assembler::assemble_from_file(&cli.input, &search_dirs).unwrap_or_else(|e| {
        error(e.to_string());
        std::process::exit(1);
    });

    fs::write(&cli.output, &image).unwrap_or_else(|e| {
        error(format!("failed to write to output file: {}", e));
        std::process::exit(2);
    });

    info(format!("wrote {} bytes to \"{}\"", image.len(), cli.output.display()));
}
