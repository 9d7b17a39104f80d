//! # CLI Module
//!
//! Command-line interface for the big key finder.
//!
//! ## Usage
//! ```bash
//! # Scan a standalone server with the default 10 KB threshold
//! redis-bigkeys --host 10.0.0.5 --password secret
//!
//! # Scan a cluster, 1 MB threshold, JSON output
//! redis-bigkeys --host 10.0.0.5 --cluster --threshold 1048576 --output json
//!
//! # Stream results to a JSON-lines file as they are found
//! redis-bigkeys --host 10.0.0.5 --report-file bigkeys.jsonl
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use redis_bigkeys::core::client::{self, ConnectOptions};
use redis_bigkeys::core::reporter::{
    BigKeyRecord, CollectingSink, JsonLinesSink, ScanSummary, TeeSink,
};
use redis_bigkeys::core::scanner::{BigKeyScanner, CancelToken, ScanConfig};
use redis_bigkeys::error::{BigKeyError, Result};
use redis_bigkeys::events::{EventChannel, ScanEvent};
use std::path::PathBuf;
use std::thread;

/// Find the Redis keys whose memory footprint exceeds a threshold
#[derive(Parser, Debug)]
#[command(name = "redis-bigkeys")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Redis host
    #[arg(short = 'H', long)]
    host: String,

    /// Redis port
    #[arg(short = 'P', long, default_value = "6379")]
    port: u16,

    /// Redis password
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Logical database to scan (standalone only)
    #[arg(long, default_value = "0")]
    db: i64,

    /// Connect in cluster mode and scan every master node
    #[arg(short = 'c', long)]
    cluster: bool,

    /// Report keys strictly larger than this many bytes
    #[arg(short = 't', long, default_value = "10240")]
    threshold: u64,

    /// COUNT hint passed to SCAN per batch
    #[arg(long, default_value = "1000")]
    batch_size: usize,

    /// Output format
    #[arg(short = 'o', long, default_value = "pretty")]
    output: OutputFormat,

    /// Also stream results to this file as JSON lines
    #[arg(long)]
    report_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (key names only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    redis_bigkeys::init_tracing();

    if cli.cluster && cli.db != 0 {
        return Err(BigKeyError::Config(
            "clusters only expose database 0; drop --db or --cluster".to_string(),
        ));
    }
    if cli.batch_size == 0 {
        return Err(BigKeyError::Config(
            "--batch-size must be at least 1".to_string(),
        ));
    }

    let term = Term::stderr();
    if matches!(cli.output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("redis-bigkeys").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  scanning {} ({}), threshold {}",
            style(format!("{}:{}", cli.host, cli.port)).bold(),
            if cli.cluster { "cluster" } else { "standalone" },
            style(format_bytes(cli.threshold)).yellow()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Connect and run the preflight checks (version, topology)
    let opts = ConnectOptions {
        host: cli.host.clone(),
        port: cli.port,
        password: cli.password.clone(),
        db: cli.db,
    };
    let mut store = client::connect(&opts, cli.cluster)?;

    // Ctrl-C flips the cancellation token; the scanner stops at the next
    // batch boundary with everything found so far intact
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .map_err(|e| BigKeyError::Config(format!("failed to set signal handler: {}", e)))?;
    }

    let scanner = BigKeyScanner::new(ScanConfig {
        threshold_bytes: cli.threshold,
        batch_hint: cli.batch_size,
    })
    .with_cancel_token(cancel);

    // Progress display on a separate thread, fed by scan events
    let (events, receiver) = EventChannel::new();
    let progress = if matches!(cli.output, OutputFormat::Pretty) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                ScanEvent::ShardStarted { shard } => {
                    pb.set_message(format!("scanning {}", shard));
                }
                ScanEvent::Progress(p) => {
                    pb.set_message(format!(
                        "{}: {} keys visited, {} big, {} skipped",
                        p.shard, p.keys_visited, p.big_keys_found, p.keys_skipped
                    ));
                    pb.tick();
                }
                ScanEvent::Completed { .. } | ScanEvent::Cancelled { .. } => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Collect for terminal output, optionally teeing to a report file
    let mut collected = CollectingSink::new();
    let summary = match cli.report_file {
        Some(ref path) => {
            let mut file_sink = JsonLinesSink::create(path)?;
            let mut tee = TeeSink::new(&mut collected, &mut file_sink);
            scanner.run_with_events(store.as_mut(), &mut tee, &events)
        }
        None => scanner.run_with_events(store.as_mut(), &mut collected, &events),
    };

    // Drop the sender so the event thread drains and exits
    drop(events);
    event_thread.join().ok();

    let summary = summary?;
    let records = collected.into_records();

    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&term, &summary, &records, cli.threshold),
        OutputFormat::Json => print_json_results(&summary, &records),
        OutputFormat::Minimal => print_minimal_results(&records),
    }

    if summary.cancelled {
        // Conventional exit status for SIGINT termination
        std::process::exit(130);
    }
    Ok(())
}

fn print_pretty_results(
    term: &Term,
    summary: &ScanSummary,
    records: &[BigKeyRecord],
    threshold: u64,
) {
    term.write_line("").ok();
    if summary.cancelled {
        term.write_line(&format!(
            "{} Scan cancelled - partial results below",
            style("!").yellow().bold()
        ))
        .ok();
    } else {
        term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
            .ok();
    }
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} keys visited across {} shard(s) in {:.1}s",
        style(summary.keys_visited).cyan(),
        summary.shards,
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} keys over {}",
        style(summary.big_keys_found).cyan(),
        format_bytes(threshold)
    ))
    .ok();
    if summary.keys_skipped > 0 {
        term.write_line(&format!(
            "  {} keys skipped (see warnings above)",
            style(summary.keys_skipped).yellow()
        ))
        .ok();
    }
    term.write_line("").ok();

    if records.is_empty() {
        term.write_line(&format!(
            "  {} No big keys found!",
            style("✓").green()
        ))
        .ok();
        return;
    }

    term.write_line(&format!("{}", style("Big Keys:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for record in records {
        term.write_line(&format!(
            "  {}  {}  {}  {} members",
            style(record.key.render()).bold(),
            style(format!("[{}]", record.key_type)).yellow(),
            format_bytes(record.size_bytes),
            record.member_count
        ))
        .ok();
    }
}

fn print_json_results(summary: &ScanSummary, records: &[BigKeyRecord]) {
    let output = serde_json::json!({
        "summary": summary,
        "big_keys": records,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_results(records: &[BigKeyRecord]) {
    for record in records {
        println!("{}", record.key.render());
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
