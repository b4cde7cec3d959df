use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use mcw_action::{ActionKind, Script};
use mcw_diff::{output_lock, Comparator, Comparison, DiffConfig, OutputLock};
use tracing::info;

use crate::cli::*;
use crate::progress::ConsoleProgress;
use crate::report::ReportWriter;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Analyze(args) => cmd_analyze(args, cli.format),
        Command::Check(args) => cmd_check(args, cli.format),
    }
}

/// Refuse directories, and existing files unless `force` is set.
fn check_output(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.is_dir() {
        bail!("given output file path points to a directory: {}", path.display());
    }
    if path.is_file() && !force {
        bail!(
            "analysis results file already exists: {} (pass --force to overwrite it)",
            path.display()
        );
    }
    Ok(())
}

/// Settings file first, then command-line overrides.
fn load_config(args: &AnalyzeArgs) -> anyhow::Result<DiffConfig> {
    let mut config = match &args.config {
        Some(path) => DiffConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => DiffConfig::default(),
    };
    if args.strict {
        config.strict = true;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    Ok(config)
}

fn cmd_analyze(args: AnalyzeArgs, format: OutputFormat) -> anyhow::Result<()> {
    check_output(&args.output, args.force)?;
    let config = load_config(&args)?;
    let output = output_lock();

    let comparator = Comparator::open(&args.old, &args.new, config)?
        .with_progress(Arc::new(ConsoleProgress))
        .with_output_lock(output.clone());
    info!(
        old = comparator.old().version_name(),
        new = comparator.new_save().version_name(),
        workers = comparator.config().worker_count(),
        strict = comparator.config().strict,
        "comparing saves"
    );
    let comparison = comparator.compare()?;

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    match format {
        OutputFormat::Text => ReportWriter::new(out).comparison(&comparison, chrono::Local::now())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &comparison)?;
            std::io::Write::flush(&mut out)?;
        }
    }

    print_summary(&comparison, &args.output, &output);
    Ok(())
}

fn print_summary(comparison: &Comparison, path: &Path, output: &OutputLock) {
    let _guard = output.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    println!("{} Analysis written to {}", "✓".green().bold(), path.display().to_string().bold());
    let rows = [
        ("block renames", comparison.block_renames.len()),
        ("missing blocks", comparison.missing_blocks.len()),
        ("item renames", comparison.item_renames.len()),
        ("missing items", comparison.missing_items.len()),
        ("block swaps", comparison.block_swaps.len()),
        ("block entity renames", comparison.block_entity_renames.len()),
        ("missing block entities", comparison.missing_block_entities.len()),
    ];
    for (label, count) in rows {
        let count = if count == 0 {
            count.to_string().dimmed()
        } else {
            count.to_string().yellow()
        };
        println!("  {label}: {count}");
    }
    let stats = &comparison.stats;
    println!(
        "  chunks: {} compared of {} ({} regions, {} without counterpart)",
        stats.chunk_pairs, stats.chunks_total, stats.regions, stats.regions_skipped
    );
    if stats.failed_workers > 0 {
        println!(
            "  {} {} of {} workers failed; the results are incomplete",
            "!".red().bold(),
            stats.failed_workers,
            stats.workers
        );
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.report)
        .with_context(|| format!("reading {}", args.report.display()))?;
    let script = Script::parse(&text);

    match format {
        OutputFormat::Text => {
            for kind in ActionKind::ALL {
                println!("  {}: {}", kind, script.count(kind));
            }
            for error in &script.errors {
                println!("  {} line {}: {}", "✗".red(), error.line, error.error);
            }
        }
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = ActionKind::ALL
                .iter()
                .map(|kind| (kind.name().to_string(), script.count(*kind).into()))
                .collect();
            let errors: Vec<serde_json::Value> = script
                .errors
                .iter()
                .map(|e| serde_json::json!({ "line": e.line, "error": e.error.to_string() }))
                .collect();
            let summary = serde_json::json!({ "actions": counts, "errors": errors });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    if !script.is_clean() {
        bail!("{} malformed line(s) in {}", script.errors.len(), args.report.display());
    }
    if format == OutputFormat::Text {
        println!("{} {} actions, no errors", "✓".green().bold(), script.actions.len());
    }
    Ok(())
}
