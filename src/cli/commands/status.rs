//! Status command - registration and cache buckets

use super::WorkerContext;
use crate::cache::{format_bytes, CacheStorage};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::SootResult;
use crate::ui::{self, UiContext};
use crate::worker::{Registration, VersionRecord};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One bucket as reported by status
#[derive(Debug, Serialize)]
struct BucketStatus {
    name: String,
    current: bool,
    entries: usize,
    size_bytes: u64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    state_dir: PathBuf,
    configured: String,
    registration: Registration,
    buckets: Vec<BucketStatus>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config, state_dir: &Path) -> SootResult<()> {
    let runtime = WorkerContext::open(config, state_dir)?;
    let configured = runtime.worker.cache_name().to_string();

    let mut buckets = vec![];
    for name in runtime.storage.keys().await? {
        let entries = runtime.storage.open(&name).await?.entries().await?;
        buckets.push(BucketStatus {
            current: name == configured,
            entries: entries.len(),
            size_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            name,
        });
    }

    let report = StatusReport {
        state_dir: state_dir.to_path_buf(),
        configured,
        registration: runtime.registration().await?,
        buckets,
    };

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report),
    }

    Ok(())
}

fn version_line(record: Option<&VersionRecord>) -> String {
    match record {
        Some(record) => match record.activated_at {
            Some(at) => format!("{} (since {})", record.cache_name, at.format("%Y-%m-%d %H:%M")),
            None => format!(
                "{} (installed {})",
                record.cache_name,
                record.installed_at.format("%Y-%m-%d %H:%M")
            ),
        },
        None => "none".to_string(),
    }
}

fn print_table(report: &StatusReport) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "sootcache status");

    let registration = &report.registration;
    ui::key_value(&ctx, "state dir", &report.state_dir.display().to_string());
    ui::key_value(&ctx, "configured", &report.configured);
    ui::key_value_status(
        &ctx,
        "active",
        &version_line(registration.controller()),
        registration.controller().is_some(),
    );
    ui::key_value(&ctx, "waiting", &version_line(registration.waiting.as_ref()));
    println!();

    if report.buckets.is_empty() {
        ui::step_info(&ctx, "No cache buckets");
        return;
    }

    println!(
        "{:<28} {:>8} {:>10}",
        style("BUCKET").bold(),
        style("ENTRIES").bold(),
        style("SIZE").bold()
    );
    println!("{}", "-".repeat(48));

    for bucket in &report.buckets {
        let name = if bucket.current {
            style(bucket.name.as_str()).green()
        } else {
            style(bucket.name.as_str()).dim()
        };
        println!(
            "{:<28} {:>8} {:>10}",
            name,
            bucket.entries,
            format_bytes(bucket.size_bytes)
        );
    }

    let total: u64 = report.buckets.iter().map(|b| b.size_bytes).sum();
    println!();
    println!("{} bucket(s), {}", report.buckets.len(), format_bytes(total));
}

fn print_plain(report: &StatusReport) {
    for bucket in &report.buckets {
        println!("{}\t{}\t{}", bucket.name, bucket.entries, bucket.size_bytes);
    }
}
