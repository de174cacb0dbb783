//! AtlasDB CLI
//!
//! Loads a JSON-lines file into a fresh in-memory database and runs one query.

use std::path::PathBuf;

use atlasdb::db::{load_json_lines_file, Failure};
use atlasdb::{AtlasError, Config, Database, FindOptions, RangeQuery, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasDB CLI
#[derive(Parser, Debug)]
#[command(name = "atlasdb")]
#[command(about = "Query a JSON-lines file through an in-memory indexed store")]
#[command(version)]
struct Args {
    /// JSON-lines file with one record object per line
    #[arg(short, long)]
    data: PathBuf,

    /// Build an index on this field before querying (repeatable)
    #[arg(short, long = "index")]
    indexes: Vec<String>,

    /// Minimum degree of every index
    #[arg(long, default_value = "3")]
    min_degree: usize,

    /// Cache capacity in entries
    #[arg(long, default_value = "100")]
    cache_capacity: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find records, optionally filtered by field equality
    Find {
        /// Field to compare
        #[arg(short, long, requires = "value")]
        key: Option<String>,

        /// Value the field must equal (JSON, or a bare string)
        #[arg(short, long, requires = "key")]
        value: Option<String>,

        /// Answer through the index on KEY, building it if missing
        #[arg(long, requires = "key")]
        use_index: bool,
    },

    /// Find records whose field lies in [LOW, HIGH]
    Range {
        #[arg(short, long)]
        key: String,

        #[arg(long)]
        low: String,

        #[arg(long)]
        high: String,
    },

    /// Fetch the first record whose KEY field equals VALUE
    Get {
        /// Field to match, e.g. `email` (or `id`)
        #[arg(short, long)]
        key: String,

        /// Value the field must equal (JSON, or a bare string)
        #[arg(short, long)]
        value: String,
    },

    /// Print every record
    List,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("AtlasDB v{}", atlasdb::VERSION);
    tracing::info!("Data file: {}", args.data.display());

    if let Err(e) = run(args) {
        tracing::error!("Command failed: {}", e);
        print_json(&Failure::from(&e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .min_degree(args.min_degree)
        .cache_capacity(args.cache_capacity)
        .build();

    let db = Database::open(config)?;
    load_json_lines_file(&db, &args.data)?;

    for field in &args.indexes {
        db.create_index(field)?;
    }

    match args.command {
        Commands::Find {
            key,
            value,
            use_index,
        } => {
            let options = match (key, value) {
                (Some(key), Some(value)) => {
                    let options = FindOptions::equals(key.clone(), parse_value(&value));
                    if use_index {
                        options.create_index(key)
                    } else {
                        options
                    }
                }
                _ => FindOptions::all(),
            };
            print_json(&db.find_all(options)?);
        }
        Commands::Range { key, low, high } => {
            let query = RangeQuery::new(key, parse_value(&low), parse_value(&high));
            print_json(&db.find_in_range(&query)?);
        }
        Commands::Get { key, value } => {
            print_json(&db.find_by_field(&key, parse_value(&value))?);
        }
        Commands::List => {
            print_json(&db.find_all(FindOptions::all())?);
        }
    }

    Ok(())
}

/// Interpret a command-line argument as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json<T: Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            let e = AtlasError::from(e);
            tracing::error!("Failed to render output: {}", e);
        }
    }
}
