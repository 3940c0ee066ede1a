pub mod cli;
pub mod comparison;
pub mod data;
pub mod duplicates;
pub mod error;
pub mod ingest;
pub mod io_utils;
pub mod mismatch;
pub mod normalize;
pub mod output;
pub mod report;
pub mod schema;
pub mod table;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs, PreviewArgs, ReportArgs, SchemaArgs},
    duplicates::DuplicateKeyOptions,
    error::ErrorCategory,
    ingest::Upload,
    output::OutputOptions,
    report::{ReportOptions, ReportSet},
    schema::ReportSchema,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("attendance_audit", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => handle_report(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn load_schema(args: &InputArgs) -> Result<ReportSchema> {
    match &args.schema {
        Some(path) => {
            ReportSchema::load(path).with_context(|| format!("Loading schema from {path:?}"))
        }
        None => Ok(ReportSchema::default()),
    }
}

fn report_options(args: &InputArgs) -> ReportOptions {
    let mut options = ReportOptions {
        duplicate_key: DuplicateKeyOptions {
            include_session_datetime: args.include_date,
        },
        ..ReportOptions::default()
    };
    if !args.rules.is_empty() {
        options.rules = args.rules.iter().map(|rule| (*rule).into()).collect();
    }
    options
}

/// Reads, normalizes and analyses the input named by `args`.
fn analyse(args: &InputArgs) -> Result<ReportSet> {
    let schema = load_schema(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Analysing '{}' (encoding {}, delimiter '{}')",
        args.input.display(),
        encoding.name(),
        io_utils::printable_delimiter(delimiter)
    );
    let options = report_options(args);
    debug!("Report options: {options:?}");

    let result = Upload::from_path(&args.input)
        .and_then(|upload| ingest::read_upload(Some(&upload), encoding, delimiter))
        .and_then(|raw| report::run_pipeline(&raw, &schema, &options));
    result.map_err(|err| {
        let prefix = match err.category() {
            ErrorCategory::Upload => "Upload rejected",
            ErrorCategory::Parse => "Could not parse the export",
            ErrorCategory::Content => "The export breaks the attendance column contract",
            ErrorCategory::Output => "Could not store the reports",
        };
        anyhow::Error::new(err).context(format!("{prefix}: {:?}", args.input))
    })
}

fn handle_report(args: &ReportArgs) -> Result<()> {
    let reports = analyse(&args.input)?;
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let tables = reports.tables();
    let options = OutputOptions {
        directory: &args.output_dir,
        delimiter: io_utils::DEFAULT_CSV_DELIMITER,
        encoding,
        bundle: !args.no_archive,
    };
    let written = output::write_reports(&tables, &options)
        .with_context(|| format!("Writing reports to {:?}", args.output_dir))?;
    for path in &written {
        info!("Wrote {:?}", path);
    }
    if args.json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &reports).context("Serializing reports")?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let reports = analyse(&args.input)?;
    let mut stdout = std::io::stdout().lock();
    for mut report in reports.tables() {
        if args.rows > 0 && report.rows.len() > args.rows {
            report.rows.truncate(args.rows);
        }
        write!(stdout, "{}", table::render_report(&report))?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let schema = ReportSchema::default();
    match &args.output {
        Some(path) => {
            schema.save(path)?;
            info!("Default column descriptor written to {:?}", path);
        }
        None => print!("{}", schema.to_yaml_string()?),
    }
    Ok(())
}
