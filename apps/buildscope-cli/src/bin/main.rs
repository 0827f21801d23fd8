use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use buildscope_cache::DictionaryStore;
use buildscope_core::config::{Config, EngineSettings};
use buildscope_core::traits::FetchTransport;
use buildscope_core::types::SearchResult;
use buildscope_session::{AggregateOutcome, BatchFetcher, FsTransport, JsonPreferenceStore, Progress, Session};
use buildscope_stats::dimension::format_percentage;
use buildscope_stats::{ProcessedDimension, ResolvedResult, Row};
use buildscope_wire::{encode_envelope, WireDecoder};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: buildscope <command> [args...]

Commands:
  decode <file.bin>                                  print a summary of an encoded result
  encode <result.json> <out.bin>                     encode a JSON result as an envelope
  dimensions <file.bin>                              resolve and print every dimension
  query <snapshot> [item] [skill]                    load one filtered result through a session
  aggregate <snapshot> <item> <bt,bt,...> [skill]    pool statistics across basetypes";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn required(args: &[String], idx: usize, what: &str) -> String {
    args.get(idx).cloned().unwrap_or_else(|| {
        eprintln!("Missing <{what}>\n\n{USAGE}");
        std::process::exit(1)
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn fixture_transport(config: &Config) -> Arc<dyn FetchTransport> {
    Arc::new(FsTransport::new(&config.fixtures_dir()))
}

fn open_session(config: &Config, settings: EngineSettings, snapshot: &str) -> Session {
    let preferences = Arc::new(JsonPreferenceStore::new(&config.preferences_file()));
    Session::new(snapshot, settings, fixture_transport(config), preferences)
}

fn print_dimension(dim: &ProcessedDimension, limit: usize) {
    println!("\n📊 {} ({} builds)", dim.display_name, dim.true_total);
    if dim.unresolved > 0 {
        println!("   ⚠️  {} unresolved keys", dim.unresolved);
    }
    for row in dim.top(limit) {
        match row {
            Row::Group(g) => {
                println!("   {:<40} {:>8} {:>6}%", g.name, g.count, g.display_percentage());
                for m in &g.members {
                    println!("     └ {:<36} {:>8} {:>6}%", m.name, m.count, m.display_percentage());
                }
            }
            Row::Entry(e) => println!("   {:<40} {:>8} {:>6}%", e.name, e.count, e.display_percentage()),
        }
    }
}

fn print_aggregate(outcome: &AggregateOutcome, limit: usize) {
    let report = outcome.report.truncated(limit);
    println!("\n📦 {} across {} basetypes: {} builds", outcome.category.display_name(), report.distribution.len(), report.total_builds);
    for d in &report.distribution {
        println!("   {:<40} {:>8} {:>6}%", d.name, d.count, format_percentage(d.percentage));
    }
    for (title, table) in [("Modifiers", &report.modifiers), ("Skills", &report.skills)] {
        println!("\n📊 {title}");
        for entry in table {
            let breakdown: Vec<String> = entry.breakdown.iter().map(ToString::to_string).collect();
            println!("   {:<40} {:>6}%  [{}]", entry.name, format_percentage(entry.percentage), breakdown.join(", "));
        }
    }
    if !outcome.skipped.is_empty() {
        println!("\n⚠️  Skipped: {}", outcome.skipped.join(", "));
    }
    for err in outcome.errors.iter().chain(&outcome.dictionary_errors) {
        println!("❌ {}: {}", err.item, err.message);
    }
    println!(
        "\n✅ Aggregated ({} fetched, {} reused{})",
        outcome.fetched,
        outcome.reused,
        if outcome.from_cache { ", from cache" } else { "" }
    );
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.engine()?;
    let (cmd, args) = parse_args();
    info!(command = %cmd, "starting");

    match cmd.as_str() {
        "decode" => {
            let path = PathBuf::from(required(&args, 0, "file.bin"));
            let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let result = WireDecoder::new(settings.max_message_bytes).decode(&bytes)?;
            let dims: Vec<_> = result
                .dimensions
                .iter()
                .map(|d| serde_json::json!({ "id": d.id, "dictionary": d.dictionary_id, "entries": d.counts.len(), "sum": d.sum() }))
                .collect();
            let summary = serde_json::json!({
                "total": result.total,
                "dimensions": dims,
                "value_lists": result.value_lists.len(),
                "dictionaries": result.dictionary_refs,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "encode" => {
            let input = PathBuf::from(required(&args, 0, "result.json"));
            let output = PathBuf::from(required(&args, 1, "out.bin"));
            let raw = fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
            let result: SearchResult = serde_json::from_str(&raw).with_context(|| format!("parsing {}", input.display()))?;
            let bytes = encode_envelope(&result);
            fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
            println!("✅ Wrote {} bytes to {}", bytes.len(), output.display());
        }
        "dimensions" => {
            let path = PathBuf::from(required(&args, 0, "file.bin"));
            let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let decoder = WireDecoder::new(settings.max_message_bytes);
            let result = decoder.decode(&bytes)?;
            let fetcher = BatchFetcher::new(
                fixture_transport(&config),
                decoder,
                Arc::new(DictionaryStore::new()),
                &settings.control_dimension,
            );
            let (dictionaries, errors) = fetcher.load_dictionaries(&result);
            for err in &errors {
                println!("⚠️  Dictionary {}: {}", err.item, err.message);
            }
            let resolved = ResolvedResult::new(result, dictionaries, &settings.control_dimension);
            let missing = resolved.missing_dictionaries();
            if !missing.is_empty() {
                println!("⚠️  Unresolved dictionaries: {}", missing.join(", "));
            }
            println!("Total builds: {}", resolved.true_total);
            for dim in resolved.process_all() {
                print_dimension(&dim, settings.display_limit);
            }
        }
        "query" => {
            let snapshot = required(&args, 0, "snapshot");
            let mut session = open_session(&config, settings.clone(), &snapshot);
            if let Some(item) = args.get(1) {
                session.select_item(item);
            }
            if let Some(skill) = args.get(2) {
                session.set_skills([skill.as_str()]);
            }
            let view = session.load()?;
            if let Some(warning) = view.warning() {
                println!("⚠️  {warning} (result not cached)");
            }
            println!("Total builds: {}", view.true_total);
            for dim in &view.dimensions {
                print_dimension(dim, settings.display_limit);
            }
        }
        "aggregate" => {
            let snapshot = required(&args, 0, "snapshot");
            let item = required(&args, 1, "item");
            let basetypes: Vec<String> = required(&args, 2, "bt,bt,...")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
            let mut session = open_session(&config, settings.clone(), &snapshot);
            session.select_item(&item);
            if let Some(skill) = args.get(3) {
                session.set_skills([skill.as_str()]);
            }

            let pb = ProgressBar::new(basetypes.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} basetypes {msg}")?
                    .progress_chars("#>-"),
            );
            let mut on_progress = |p: &Progress| {
                pb.set_length(p.total as u64);
                pb.set_position(p.current as u64);
                pb.set_message(p.label.clone());
            };
            let outcome = tokio::runtime::Runtime::new()?
                .block_on(async { session.aggregate_async(&basetypes, &mut on_progress).await })?;
            pb.finish_and_clear();
            print_aggregate(&outcome, settings.display_limit);
        }
        _ => {
            eprintln!("Unknown command: {cmd}\n\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
