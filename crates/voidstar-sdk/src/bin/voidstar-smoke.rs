//! Smoke test for the voidstar SDK outside the platform.
//!
//! Runs a small instrumented workload against a local JSON-lines sink and
//! reports what was written, which makes first-occurrence deduplication
//! visible end to end.
//!
//! # Usage
//!
//! ```bash
//! # Build with the CLI dependencies enabled
//! cargo build -p voidstar-sdk --features smoke
//!
//! # Run the workload, writing records to out.jsonl
//! voidstar-smoke run --output out.jsonl --iterations 1000 --threads 4
//!
//! # Count records per tag in an existing output file
//! voidstar-smoke summary --input out.jsonl
//! ```

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use voidstar_protocol::{ASSERT_TAG, ENVELOPE_FIELDS, SDK_STREAM};
use voidstar_sdk::local::LocalSink;
use voidstar_sdk::Sdk;

#[derive(Parser)]
#[command(name = "voidstar-smoke")]
#[command(about = "Exercise the voidstar SDK against a local output file")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an instrumented workload and summarize its output.
    Run {
        /// JSON-lines file to append records to.
        #[arg(short, long)]
        output: PathBuf,

        /// Loop iterations per thread.
        #[arg(short, long, default_value = "100")]
        iterations: u64,

        /// Worker threads sharing one catalog.
        #[arg(short, long, default_value = "1")]
        threads: usize,

        /// Source name stamped on every record.
        #[arg(short, long, default_value = "voidstar-smoke")]
        source_name: String,
    },

    /// Count records per tag in an output file.
    Summary {
        /// JSON-lines file written by the SDK.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            output,
            iterations,
            threads,
            source_name,
        } => cmd_run(&output, iterations, threads, &source_name),
        Commands::Summary { input } => cmd_summary(&input),
    }
}

fn cmd_run(output: &Path, iterations: u64, threads: usize, source_name: &str) {
    let sink = match LocalSink::open(output) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Failed to open output: {}", e);
            std::process::exit(1);
        }
    };
    let sdk = Sdk::with_sink(Arc::new(sink));
    sdk.set_source_name(source_name);

    sdk.send_event("workload_config", &json!({"threads": threads, "iterations": iterations}));
    sdk.setup_complete();

    std::thread::scope(|s| {
        for worker in 0..threads.max(1) {
            let sdk = Arc::clone(&sdk);
            s.spawn(move || workload(&sdk, worker, iterations));
        }
    });

    sdk.send_event("workload_done", &json!({"call_sites": sdk.tracker().len()}));
    sdk.sink().flush();

    eprintln!(
        "Evaluated {} assertion call sites across {} thread(s)",
        sdk.tracker().len(),
        threads.max(1)
    );
    cmd_summary(output);
}

fn workload(sdk: &Sdk, worker: usize, iterations: u64) {
    for i in 0..iterations {
        let roll = sdk.get_random() % 100;
        sdk.always(roll < 100, "roll in range", &json!({"roll": roll}));
        sdk.sometimes(roll == 0, "rolled zero", &json!({"worker": worker, "i": i}));
        sdk.always_or_unreachable(i < iterations, "index in bounds", &Value::Null);

        if i % 10 == 9 {
            sdk.reachable("every tenth iteration", &json!({"i": i}));
        }
        if i > iterations {
            sdk.unreachable("index past end", &json!({"i": i}));
        }
    }
}

fn cmd_summary(input: &Path) {
    let text = match std::fs::read_to_string(input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input.display(), e);
            std::process::exit(1);
        }
    };

    let mut tags: BTreeMap<String, u64> = BTreeMap::new();
    let mut conditions: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut malformed = 0u64;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(Value::Object(record)) = serde_json::from_str::<Value>(line) else {
            malformed += 1;
            continue;
        };
        if record.get("stream").and_then(Value::as_str) != Some(SDK_STREAM) {
            malformed += 1;
            continue;
        }
        for (key, value) in &record {
            if ENVELOPE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            *tags.entry(key.clone()).or_default() += 1;
            if key == ASSERT_TAG {
                let outcome = match value["condition"].as_bool() {
                    Some(true) => "pass",
                    _ => "fail",
                };
                *conditions.entry(outcome).or_default() += 1;
            }
        }
    }

    println!("=== {} ===", input.display());
    for (tag, count) in &tags {
        println!("  {:<24} {}", tag, count);
    }
    if !conditions.is_empty() {
        println!("Assertion records:");
        for (outcome, count) in &conditions {
            println!("  {:<24} {}", outcome, count);
        }
    }
    if malformed > 0 {
        println!("Skipped {} malformed line(s)", malformed);
    }
}
