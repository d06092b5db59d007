use clap::Parser;
use color_eyre::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rfa_inspector::export::{export_csv, export_json};
use rfa_inspector::extractor::{Extractor, RevitExtractor};
use rfa_inspector::invoker;

#[derive(Parser, Debug)]
#[command(name = "rfa-inspector")]
#[command(about = "RFA Inspector - list categories from Revit family files")]
#[command(version)]
struct Args {
    /// Path to Revit family file
    #[arg(required = true)]
    file: PathBuf,

    /// Export to CSV (optional output path)
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Export to JSON (optional output path)
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Print BasicFileInfo entries instead of categories
    #[arg(long)]
    info: bool,

    /// List compound file streams instead of categories
    #[arg(long)]
    streams: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.csv.is_none() && args.json.is_none() && !args.info && !args.streams {
        let mut out = std::io::stdout().lock();
        invoker::run(&args.file, |path| RevitExtractor::open(path), &mut out)?;
        return Ok(());
    }

    let data = RevitExtractor::open(&args.file)?.read_problem_data()?;
    let mut out = std::io::stdout().lock();

    if args.info {
        for (key, value) in &data.file_info.entries {
            writeln!(out, "{key}: {value}")?;
        }
    }

    if args.streams {
        for stream in &data.streams {
            writeln!(out, "{} {}", stream.path, stream.size)?;
        }
    }

    if let Some(csv_path) = &args.csv {
        export_csv(&data, csv_path)?;
        writeln!(out, "Exported to CSV: {}", csv_path.display())?;
    }

    if let Some(json_path) = &args.json {
        export_json(&data, json_path)?;
        writeln!(out, "Exported to JSON: {}", json_path.display())?;
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only the requested output.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
