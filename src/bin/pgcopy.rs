//! pgcopy: COPY BINARY encoder CLI
//!
//! Reads JSON-lines rows (one JSON array per line) and writes a PostgreSQL
//! binary COPY stream.
//!
//! # Usage
//!
//! ```bash
//! # Encode a file
//! pgcopy encode rows.jsonl -o rows.bin
//!
//! # Column hints by position
//! pgcopy encode rows.jsonl -o rows.bin --hint 0=uuid,3=bigint
//!
//! # Then load it
//! psql -c "\copy items FROM 'rows.bin' WITH (FORMAT binary)"
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use pgcopy::prelude::*;

#[derive(Parser)]
#[command(name = "pgcopy")]
#[command(version)]
#[command(about = "Encode rows into PostgreSQL binary COPY format", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgcopy encode rows.jsonl -o rows.bin
    cat rows.jsonl | pgcopy encode -o rows.bin --hint 0=uuid,2=jsonb
    pgcopy types")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode JSON-lines rows into a COPY BINARY stream
    Encode {
        /// Input file, one JSON array per line (stdin when omitted or `-`)
        input: Option<PathBuf>,

        /// Output file (`-` for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Column hints, e.g. `0=uuid,3=bigint`
        #[arg(long)]
        hint: Option<String>,

        /// Spool the stream to a temporary file instead of memory
        #[arg(long)]
        spool: bool,

        /// Config file (defaults to ./pgcopy.toml or the user config dir)
        #[arg(short, long, env = "PGCOPY_CONFIG")]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the supported column type hints
    Types,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            hint,
            spool,
            config,
            verbose,
        } => {
            init_tracing(verbose);
            encode(input, output, hint, spool, config, verbose)
        }
        Commands::Types => {
            show_types();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pgcopy=debug" } else { "pgcopy=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("PGCOPY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_options(
    config: Option<PathBuf>,
    hint: Option<String>,
    spool: bool,
) -> Result<EncoderOptions> {
    let config = match config {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::discover().context("Failed to load config")?,
    };

    let mut options = config.encoder;
    if let Some(hint) = hint {
        let hints = ColumnHints::parse(&hint).context("Invalid --hint")?;
        options.column_types.extend(hints);
    }
    if spool {
        options.use_spooled_sink = true;
    }
    Ok(options)
}

fn open_input(input: Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn parse_row(line: &str, line_no: usize) -> Result<Vec<Value>> {
    let fields: Vec<serde_json::Value> = serde_json::from_str(line)
        .with_context(|| format!("Line {}: expected a JSON array", line_no))?;
    Ok(fields.into_iter().map(Value::from_json).collect())
}

fn encode(
    input: Option<PathBuf>,
    output: PathBuf,
    hint: Option<String>,
    spool: bool,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let options = load_options(config, hint, spool)?;
    if verbose {
        for (index, column_type) in options.column_types.iter() {
            eprintln!(
                "{} column {} = {}",
                "Hint:".dimmed(),
                index,
                column_type.to_string().cyan()
            );
        }
    }

    let reader = open_input(input)?;
    let mut encoder = CopyEncoder::new(options);
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(&line, line_no)?;
        encoder
            .add(&row)
            .with_context(|| format!("Line {}: failed to encode row", line_no))?;
    }

    let rows = encoder.rows();
    let mut sink = encoder.sink().context("Nothing to encode")?;

    let written = if output.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        let n = io::copy(&mut sink, &mut stdout)?;
        stdout.flush()?;
        n
    } else {
        let mut file = File::create(&output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        let n = io::copy(&mut sink, &mut file)?;
        file.flush()?;
        n
    };
    sink.remove()?;

    if output.as_os_str() != "-" {
        println!(
            "{} Encoded {} row(s), {} bytes to {}",
            "✓".green(),
            rows.to_string().cyan(),
            written,
            output.display().to_string().cyan()
        );
    }
    Ok(())
}

fn show_types() {
    println!("{}", "Column type hints".cyan().bold());
    println!();
    for column_type in ColumnType::ALL {
        let oid = column_type.oid();
        println!(
            "  {:<10} {:>5}  {}",
            column_type.as_str().yellow(),
            oid,
            pgcopy::protocol::oid_to_name(oid).dimmed()
        );
    }
    println!();
    println!(
        "{}",
        "Untyped values: bool, int4, float8, text, bytea, T[], hstore, timestamp, date, inet"
            .dimmed()
    );
}
