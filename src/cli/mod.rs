//! # CLI Module
//!
//! Command-line interface for the scan history store.
//!
//! ## Usage
//! ```bash
//! # Show the history, newest first
//! scan-history list
//!
//! # Record a scan with an analysis payload
//! scan-history add "Greek yogurt" --result '{"grade": "A"}'
//!
//! # Remove one scan, or everything
//! scan-history remove <id>
//! scan-history clear
//!
//! # JSON output
//! scan-history list --output json
//! ```
//!
//! Every invocation loads the history first, so expired scans are pruned
//! from the database on each run.

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use scan_history::core::history::{
    HistoryStore, HistoryStoreBuilder, LoadOutcome, ScanRecord, DEFAULT_MAX_ENTRIES, DEFAULT_STORAGE_KEY,
};
use scan_history::core::storage::{SlotStore, SqliteStore};
use scan_history::error::{HistoryError, Result, SerializationError};
use std::path::PathBuf;

/// Scan History - Browse and manage past nutrition scans
#[derive(Parser, Debug)]
#[command(name = "scan-history")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// History database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage key the history is kept under
    #[arg(long, global = true, default_value = DEFAULT_STORAGE_KEY)]
    key: String,

    /// Drop scans older than this many days when loading
    #[arg(long, global = true, default_value = "56")]
    retention_days: i64,

    /// Maximum number of scans kept after an insert
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ENTRIES)]
    max_entries: usize,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored scans, newest first
    List,
    /// Show a single scan with its full analysis result
    Show {
        /// Scan id
        id: String,
    },
    /// Record a new scan
    Add {
        /// What was scanned
        label: String,

        /// Analysis result as a JSON document
        #[arg(short, long)]
        result: Option<String>,
    },
    /// Remove a scan by id
    Remove {
        /// Scan id
        id: String,
    },
    /// Delete the entire history
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    scan_history::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let db_path = cli.db.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scan-history")
            .join("history.db")
    });
    let storage = SqliteStore::open(&db_path)?;

    let retention = Duration::try_days(cli.retention_days).ok_or_else(|| {
        HistoryError::Config(format!("retention of {} days is out of range", cli.retention_days))
    })?;
    let mut store = HistoryStoreBuilder::new()
        .storage_key(cli.key)
        .retention(retention)
        .max_entries(cli.max_entries)
        .build(storage)?;
    let outcome = store.initialize();

    let term = Term::stdout();
    if matches!(cli.output, OutputFormat::Pretty) {
        print_load_notice(&term, &outcome);
    }

    match cli.command {
        Commands::List => match cli.output {
            OutputFormat::Pretty => print_pretty_list(&term, store.records()),
            OutputFormat::Json => print_json(&store.snapshot())?,
        },
        Commands::Show { id } => {
            let record = find_scan(&store, &id)?;
            match cli.output {
                OutputFormat::Pretty => print_pretty_record(&term, &record)?,
                OutputFormat::Json => print_json(&record)?,
            }
        }
        Commands::Add { label, result } => {
            let result = parse_result(result.as_deref())?;
            let record = store.add_scan(label, result)?;
            match cli.output {
                OutputFormat::Pretty => {
                    term.write_line(&format!(
                        "{} Added {} {}",
                        style("✓").green().bold(),
                        style(&record.input_label).bold(),
                        style(&record.id).dim()
                    ))
                    .ok();
                }
                OutputFormat::Json => print_json(&record)?,
            }
        }
        Commands::Remove { id } => {
            let removed = store.remove_scan(&id)?;
            match cli.output {
                OutputFormat::Pretty if removed => {
                    term.write_line(&format!("{} Removed {}", style("✓").green().bold(), id))
                        .ok();
                }
                OutputFormat::Pretty => {
                    term.write_line(&format!(
                        "{} No scan with id {}",
                        style("!").yellow().bold(),
                        id
                    ))
                    .ok();
                }
                OutputFormat::Json => print_json(&serde_json::json!({ "removed": removed }))?,
            }
        }
        Commands::Clear => {
            let count = store.len();
            store.clear_history()?;
            match cli.output {
                OutputFormat::Pretty => {
                    term.write_line(&format!(
                        "{} Cleared {} scans",
                        style("✓").green().bold(),
                        count
                    ))
                    .ok();
                }
                OutputFormat::Json => print_json(&serde_json::json!({ "cleared": count }))?,
            }
        }
    }

    Ok(())
}

fn find_scan<S: SlotStore>(store: &HistoryStore<S>, id: &str) -> Result<ScanRecord> {
    store.get_scan(id).ok_or_else(|| HistoryError::NotFound { id: id.to_string() })
}

fn parse_result(raw: Option<&str>) -> Result<serde_json::Value> {
    match raw {
        None => Ok(serde_json::Value::Object(Default::default())),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| HistoryError::Config(format!("--result is not valid JSON: {e}"))),
    }
}

fn print_load_notice(term: &Term, outcome: &LoadOutcome) {
    if outcome.malformed {
        term.write_line(&format!(
            "{} Stored history was unreadable and has been ignored",
            style("!").yellow().bold()
        ))
        .ok();
    }
    if outcome.expired > 0 {
        term.write_line(&format!(
            "{}",
            style(format!("Pruned {} expired scans", outcome.expired)).dim()
        ))
        .ok();
    }
}

fn print_pretty_list(term: &Term, records: &[ScanRecord]) {
    if records.is_empty() {
        term.write_line(&format!("  {}", style("No scans yet").dim()))
            .ok();
        return;
    }

    term.write_line(&format!(
        "{}",
        style(format!("Scan History ({})", records.len())).bold().underlined()
    ))
    .ok();

    let now = Utc::now();
    for record in records {
        let age = record
            .scanned_at_utc()
            .map(|t| format_age(now, t))
            .unwrap_or_else(|| "unknown".to_string());
        term.write_line(&format!(
            "  {} {} {}",
            style(&record.id).dim(),
            record.input_label,
            style(age).cyan()
        ))
        .ok();
    }
}

fn print_pretty_record(term: &Term, record: &ScanRecord) -> Result<()> {
    let result =
        serde_json::to_string_pretty(&record.result).map_err(SerializationError::Encode)?;
    term.write_line(&format!("{}", style(&record.input_label).bold()))
        .ok();
    term.write_line(&format!("  {} {}", style("id:").dim(), record.id))
        .ok();
    term.write_line(&format!("  {} {}", style("scanned:").dim(), record.scanned_at))
        .ok();
    term.write_line(&format!("  {}", style("result:").dim()))
        .ok();
    for line in result.lines() {
        term.write_line(&format!("    {}", line)).ok();
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).map_err(SerializationError::Encode)?;
    println!("{}", output);
    Ok(())
}

fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(then);
    if age < Duration::minutes(1) {
        "just now".to_string()
    } else if age < Duration::hours(1) {
        format!("{}m ago", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}
