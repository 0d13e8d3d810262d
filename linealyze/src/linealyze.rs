// `linealyze` -- convert, summarize, and pretty-print 3D-printer telemetry as InfluxDB line
// protocol.
//
// The three subcommands are stdin-to-stdout filters meant to sit in a pipe between a log source
// (typically a websocket listener echoing printer console lines) and a metrics writer:
//
//   convert    free-form console log lines -> line protocol
//   summarize  line protocol -> one time-weighted average per fixed window
//   read       line protocol -> aligned columns or CSV for humans
//
// A bad input line is never fatal; it is skipped with a note on stderr.  Only an I/O failure on
// the input stream and invalid command line arguments abort the run.

mod convert;
mod format;
mod read;
mod summarize;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert free-form log lines to line protocol
    Convert(ConvertArgs),

    /// Compute time-weighted averages over fixed windows
    Summarize(SummarizeArgs),

    /// Pretty-print line protocol for humans
    Read(ReadArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Literal text separating the clock time from the data, eg " // probe accuracy results: "
    #[arg(long)]
    result_header: String,

    /// Measurement name for the records produced (letters, digits, underscore)
    #[arg(long)]
    measurement: String,

    /// Attach this "key=value" tag to every record [default: none]
    #[arg(long)]
    tag: Option<String>,

    /// Assume this date (YYYY-MM-DD) for lines that carry a time of day only [default: today]
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Averaging window in seconds
    #[arg(long, default_value_t = 10)]
    interval: u32,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "line")]
    format: format::OutputFormat,
}

fn main() {
    match linealyze() {
        Ok(()) => {}
        Err(msg) => {
            eprintln!("ERROR: {}", msg);
            process::exit(1);
        }
    }
}

fn linealyze() -> Result<()> {
    let cli = Cli::parse();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Convert(ref args) => {
            if args.result_header.is_empty() {
                bail!("--result-header must be nonempty");
            }
            if !linelog::is_identifier(&args.measurement) {
                bail!("Bad measurement name {}", args.measurement);
            }
            if let Some(ref tag) = args.tag {
                let ok = match tag.split_once('=') {
                    Some((k, v)) => linelog::is_identifier(k) && linelog::is_identifier(v),
                    None => false,
                };
                if !ok {
                    bail!("The --tag must look like key=value");
                }
            }
            convert::convert(&mut stdout, stdin.lock(), args)
        }
        Commands::Summarize(ref args) => {
            if args.interval == 0 {
                bail!("The --interval must be positive");
            }
            summarize::summarize(&mut stdout, stdin.lock(), args)
        }
        Commands::Read(ref args) => read::read(&mut stdout, stdin.lock(), args),
    }
}
