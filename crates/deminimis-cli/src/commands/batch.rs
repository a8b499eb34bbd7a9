//! Batch command - scan one fragment file per company.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, warn};

use deminimis_core::rules::{format_italian_amount, validate_partita_iva};
use deminimis_core::source::source_from_path;
use deminimis_core::{CeilingStatus, DeminimisConfig, ScanReport, Scanner, TracingSink};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern (.txt and .json fragment files)
    #[arg(required = true)]
    input: String,

    /// Directory for one JSON report per input file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// De Minimis ceiling in euro
    #[arg(long)]
    ceiling: Option<Decimal>,

    /// Read each file as table rows and count only aid granted in the
    /// last N years
    #[arg(long, value_name = "YEARS")]
    window_years: Option<u32>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of scanning a single file.
struct BatchEntry {
    path: PathBuf,
    report: Option<ScanReport>,
    error: Option<String>,
}

/// One row of the summary CSV.
#[derive(Serialize)]
struct SummaryRow<'a> {
    file: &'a str,
    identifier: &'a str,
    total: String,
    count: usize,
    percent_used: String,
    remaining: String,
    status: &'a str,
    error: &'a str,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(ceiling) = args.ceiling {
        config.ceiling.limit = ceiling;
    }
    if let Some(years) = args.window_years {
        config.window.enabled = true;
        config.window.years = years;
    }

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "json")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to scan",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut entries = Vec::with_capacity(files.len());

    for path in files {
        match scan_file(&path, &config) {
            Ok(report) => {
                entries.push(BatchEntry {
                    path,
                    report: Some(report),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to scan {}: {}", path.display(), error_msg);
                    entries.push(BatchEntry {
                        path,
                        report: None,
                        error: Some(error_msg),
                    });
                } else {
                    error!("Failed to scan {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Scan failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(ref output_dir) = args.output_dir {
        for entry in &entries {
            if let Some(report) = &entry.report {
                let output_name = entry
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("report");
                let output_path = output_dir.join(format!("{}.json", output_name));
                fs::write(&output_path, serde_json::to_string_pretty(report)?)?;
                debug!("Wrote report to {}", output_path.display());
            }
        }
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &entries)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_table(&entries);

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    eprintln!();
    eprintln!(
        "{} Scanned {} files in {:?}",
        style("✓").green(),
        entries.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(entries.len() - failed).green(),
        style(failed).red()
    );

    Ok(())
}

/// The file stem, when it is itself a valid P.IVA.
fn identifier_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|stem| validate_partita_iva(stem))
        .map(str::to_string)
}

fn scan_file(path: &Path, config: &DeminimisConfig) -> anyhow::Result<ScanReport> {
    let source = source_from_path(path)?;

    let mut scanner = Scanner::from_config(config);
    if let Some(identifier) = identifier_from_path(path) {
        scanner = scanner.with_identifier(Some(identifier));
    }

    let report = scanner.run(&*source, &mut TracingSink::new(io::sink()))?;
    Ok(report)
}

fn print_table(entries: &[BatchEntry]) {
    for entry in entries {
        let name = entry.path.display();
        match (&entry.report, &entry.error) {
            (Some(report), _) => {
                let status = match report.ceiling.status {
                    CeilingStatus::Exceeded => style(report.ceiling.status.as_str()).red(),
                    CeilingStatus::Warning => style(report.ceiling.status.as_str()).yellow(),
                    CeilingStatus::Ok | CeilingStatus::NoAid => {
                        style(report.ceiling.status.as_str()).green()
                    }
                };
                let identifier = report
                    .identifier
                    .clone()
                    .unwrap_or_else(|| name.to_string());
                println!(
                    "{}\t€{}\t{} aiuti\t{}%\t{}",
                    identifier,
                    format_italian_amount(report.total()),
                    report.result.count(),
                    report.ceiling.percent_used,
                    status
                );
            }
            (None, error) => {
                println!(
                    "{}\t{}",
                    name,
                    style(error.as_deref().unwrap_or("unknown error")).red()
                );
            }
        }
    }
}

fn write_summary(path: &Path, entries: &[BatchEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for entry in entries {
        let file = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let row = match &entry.report {
            Some(report) => SummaryRow {
                file,
                identifier: report.identifier.as_deref().unwrap_or(""),
                total: report.total().to_string(),
                count: report.result.count(),
                percent_used: report.ceiling.percent_used.to_string(),
                remaining: report.ceiling.remaining.to_string(),
                status: report.ceiling.status.as_str(),
                error: "",
            },
            None => SummaryRow {
                file,
                identifier: "",
                total: String::new(),
                count: 0,
                percent_used: String::new(),
                remaining: String::new(),
                status: "error",
                error: entry.error.as_deref().unwrap_or(""),
            },
        };

        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}
