use crate::api::{AttachInput, ProgressCallback, ProgressEvent, SequenceAttacher};
use crate::cli::AttachArgs;
use crate::commands::resolve_reference_length;
use crate::config::Config;
use crate::export::write_placement_report;
use crate::placement::load_queries;
use crate::utils::input::open_input;
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tracing::info;

pub fn run(args: AttachArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load(),
    };
    let mut options = config.batch_options();
    if let Some(policy) = args.on_unknown_target {
        options.on_unknown_target = policy;
    }
    if args.no_ladderize {
        options.ladderize = false;
    }

    let reference_length = resolve_reference_length(&args.reference)?;
    info!(reference_length, "Using reference length");

    let tree: Value = serde_json::from_reader(open_input(&args.tree_file)?)
        .with_context(|| format!("Failed to parse tree {}", args.tree_file.display()))?;
    let queries = load_queries(open_input(&args.queries_file)?)
        .with_context(|| format!("Failed to read queries {}", args.queries_file.display()))?;
    info!(queries = queries.len(), "Loaded queries");

    let progress = ProgressBarBuilder::new("Attaching sequences")
        .with_length(queries.len() as u64)
        .with_tick()
        .build()?;
    let bar = progress.clone();
    let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| match event {
        ProgressEvent::Progress { current, .. } => bar.set_position(current),
        ProgressEvent::Message { message, .. } => bar.println(message),
        ProgressEvent::Started { .. } | ProgressEvent::Completed { .. } => {}
    });

    let output = SequenceAttacher::new(options)
        .with_progress(callback)
        .attach(AttachInput {
            tree,
            reference_length,
            queries,
        })?;
    progress.finish_with_message("Sequences attached");

    let mut writer = BufWriter::new(
        File::create(&args.output_file)
            .with_context(|| format!("Failed to create {}", args.output_file.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, &output.tree)?;
    writeln!(writer)?;
    writer.flush()?;

    if let Some(report_path) = &args.report {
        let report_file = File::create(report_path)
            .with_context(|| format!("Failed to create {}", report_path.display()))?;
        write_placement_report(&output.report, BufWriter::new(report_file))?;
    }

    info!(
        placed = output.report.placements.len(),
        skipped = output.report.skipped.len(),
        output = %args.output_file.display(),
        "Wrote extended tree"
    );
    Ok(())
}
