//! DiskMapper — shows what is using space under a folder.
//!
//! Thin binary entry point. Scanning, aggregation and the display model
//! live in the `diskmapper-core` crate.

mod cli;
mod render;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use diskmapper_core::model::size::{format_count, format_size};
use diskmapper_core::{DisplayNode, Materializer, ScanController, ScanOutcome};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

/// Sleep between controller polls.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Minimum gap between two status lines on stderr.
const STATUS_INTERVAL: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the tree.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("DiskMapper starting");

    let mut controller = ScanController::new();
    let live_tree = controller
        .start(&cli.path)
        .with_context(|| format!("cannot scan {}", cli.path.display()))?;

    let deadline = cli
        .time_limit
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut cancel_requested = false;
    let mut last_status: Option<Instant> = None;

    while controller.is_running() {
        controller.poll();

        if !cancel_requested && deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!("Time limit reached, cancelling scan");
            controller.cancel();
            cancel_requested = true;
        }

        let status_due = last_status.is_none_or(|t| t.elapsed() >= STATUS_INTERVAL);
        if controller.is_running() && status_due {
            eprintln!(
                "{}",
                render::status_line(controller.status(), &controller.stats())
            );
            last_status = Some(Instant::now());
        }

        thread::sleep(POLL_INTERVAL);
    }

    let stats = controller.stats();
    match controller.outcome() {
        Some(ScanOutcome::Completed) => {}
        Some(ScanOutcome::Cancelled) => {
            tracing::warn!("Scan cancelled, showing partial results");
        }
        Some(ScanOutcome::Aborted) | None => {
            anyhow::bail!("scanner stopped without reporting a result");
        }
    }
    tracing::info!(
        "{} files, {} dirs, {} in {:.2?}",
        format_count(stats.files_found),
        format_count(stats.dirs_found),
        format_size(stats.total_size),
        controller.duration().unwrap_or_default(),
    );
    if stats.skipped > 0 {
        tracing::warn!(
            "{} directories could not be read",
            format_count(stats.skipped)
        );
    }

    let display = cli.display_config();
    let rendered = {
        let tree = live_tree.read();
        let mut materializer = Materializer::new(cli.materialize_config());
        render::snapshot(
            &tree,
            &mut materializer,
            &DisplayNode::root(&tree),
            display.depth,
        )
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &rendered).context("writing JSON output")?;
        writeln!(out)?;
    } else {
        out.write_all(render::render_text(&rendered, &display).as_bytes())?;
    }
    out.flush()?;

    Ok(())
}
