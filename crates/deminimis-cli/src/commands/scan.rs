//! Scan command - total the amounts in a single fragment file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::{debug, info};

use deminimis_core::report::{summary_block, SummaryLabel};
use deminimis_core::rules::{format_italian_amount, Normalization};
use deminimis_core::source::{source_from_path, FragmentSource, LineSource};
use deminimis_core::{CeilingStatus, DeminimisConfig, ScanReport, Scanner, TracingSink};

use super::load_config;

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Fragment file: one cell per line, or a JSON array (use - for stdin)
    #[arg(required = true)]
    input: String,

    /// P.IVA the table belongs to (detected from the cells if omitted)
    #[arg(short, long)]
    piva: Option<String>,

    /// Amounts not greater than this are ignored
    #[arg(short, long)]
    threshold: Option<Decimal>,

    /// De Minimis ceiling in euro
    #[arg(long)]
    ceiling: Option<Decimal>,

    /// How to read `.` and `,` in amounts
    #[arg(long, value_enum)]
    normalization: Option<NormalizationArg>,

    /// Accept a P.IVA with a bad check digit
    #[arg(long)]
    no_validate: bool,

    /// Read the input as table rows and count only aid granted in the
    /// last N years (header row first)
    #[arg(long, value_name = "YEARS")]
    window_years: Option<u32>,

    /// Date the window is measured back from (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// File receiving the summary line (clipboard stand-in)
    #[arg(long)]
    copy_to: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report
    Json,
    /// CSV of matched amounts
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum NormalizationArg {
    /// Dots group thousands, comma is decimal
    Italian,
    /// A trailing two-digit group is decimal
    Positional,
}

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Italian => Normalization::Italian,
            NormalizationArg::Positional => Normalization::Positional,
        }
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut DeminimisConfig, args: &ScanArgs) {
    if let Some(threshold) = args.threshold {
        config.extraction.min_threshold = threshold;
    }
    if let Some(normalization) = args.normalization {
        config.extraction.normalization = normalization.into();
    }
    if let Some(ceiling) = args.ceiling {
        config.ceiling.limit = ceiling;
    }
    if args.piva.is_some() {
        config.report.identifier = args.piva.clone();
    }
    if args.no_validate {
        config.report.validate_identifier = false;
    }
    if let Some(years) = args.window_years {
        config.window.enabled = true;
        config.window.years = years;
    }
    if args.as_of.is_some() {
        config.window.enabled = true;
    }
}

/// Scanner for the effective configuration, with the window pinned to
/// `--as-of` when given.
fn build_scanner(config: &DeminimisConfig, as_of: Option<NaiveDate>) -> Scanner {
    let scanner = Scanner::from_config(config);
    match (scanner.window().copied(), as_of) {
        (Some(window), Some(_)) => scanner.with_window(Some(window.with_as_of(as_of))),
        _ => scanner,
    }
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, &args);

    let source = read_source(&args.input)?;
    info!("Loaded {}", args.input);

    let scanner = build_scanner(&config, args.as_of);

    let report = match &args.copy_to {
        Some(path) => {
            let mut sink = TracingSink::new(File::create(path)?);
            let report = scanner.run(&*source, &mut sink)?;
            eprintln!(
                "{} Summary copied to {}",
                style("✓").green(),
                path.display()
            );
            report
        }
        None => scanner.run(&*source, &mut TracingSink::new(io::sink()))?,
    };

    let output = format_report(&report, &config, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    warn_on_ceiling(&report);

    debug!("Scan complete, total {}", report.total());

    Ok(())
}

/// Source for a path, or for stdin when `input` is `-`.
pub fn read_source(input: &str) -> anyhow::Result<Box<dyn FragmentSource>> {
    if input == "-" {
        return Ok(Box::new(LineSource::from_reader(io::stdin().lock())?));
    }

    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    Ok(source_from_path(path)?)
}

fn warn_on_ceiling(report: &ScanReport) {
    match report.ceiling.status {
        CeilingStatus::Exceeded => {
            let excess = report.ceiling.excess().unwrap_or_default();
            eprintln!(
                "{} De Minimis ceiling exceeded by €{}",
                style("✗").red(),
                format_italian_amount(excess)
            );
        }
        CeilingStatus::Warning => {
            eprintln!(
                "{} {}% of the De Minimis ceiling already used",
                style("!").yellow(),
                report.ceiling.percent_used
            );
        }
        CeilingStatus::Ok | CeilingStatus::NoAid => {}
    }
}

pub fn format_report(
    report: &ScanReport,
    config: &DeminimisConfig,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report, config)),
    }
}

fn format_csv(report: &ScanReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["original_text", "value"])?;

    for matched in report.result.matches() {
        wtr.write_record([matched.original_text.clone(), matched.value.to_string()])?;
    }

    wtr.write_record(["TOTAL".to_string(), report.total().to_string()])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ScanReport, config: &DeminimisConfig) -> String {
    let mut output = String::new();

    for matched in report.result.matches() {
        output.push_str(&format!(
            "  {} → €{}\n",
            matched.original_text,
            format_italian_amount(matched.value)
        ));
    }

    let label = SummaryLabel::new(config.report.id_label.clone(), report.identifier.clone());
    for line in summary_block(&label, &report.result) {
        output.push_str(&line);
        output.push('\n');
    }

    let ceiling = &report.ceiling;
    output.push_str(&format!(
        "Soglia: €{} | Utilizzato: {}% | Margine: €{} | Stato: {}\n",
        format_italian_amount(ceiling.limit),
        ceiling.percent_used,
        format_italian_amount(ceiling.remaining),
        ceiling.status
    ));

    if let Some(window) = &report.window {
        output.push_str(&format!(
            "Finestra: dal {} al {} | Righe lette: {} | Fuori finestra: {}{}\n",
            window.from.format("%d/%m/%Y"),
            window.as_of.format("%d/%m/%Y"),
            window.rows_read,
            window.rows_outside,
            if window.stopped_early { " (lettura interrotta)" } else { "" }
        ));
    }

    output.push('\n');
    output.push_str(&report.summary);
    output.push('\n');

    output
}
