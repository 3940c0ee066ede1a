use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::comparison::NormalizationRule;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Audit training-attendance CSV exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the duplicate, count-mismatch and course-name reports and write them as CSV files
    Report(ReportArgs),
    /// Print the reports for an export to the terminal without writing files
    Preview(PreviewArgs),
    /// Write the default column descriptor as YAML
    Schema(SchemaArgs),
}

/// Options shared by every command that reads an export.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Attendance export to analyse (banner line, header line, data rows)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML column descriptor overriding the built-in export layout
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to cp949)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Add the session date/time column to the duplicate key
    #[arg(long = "include-date")]
    pub include_date: bool,
    /// Course-name normalization rules to compare (repeatable; defaults to both)
    #[arg(long = "rule", value_enum, action = clap::ArgAction::Append)]
    pub rules: Vec<RuleArg>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Directory that receives the report files
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: PathBuf,
    /// Character encoding for the report files (defaults to cp949)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Skip the zip archive bundling every report
    #[arg(long = "no-archive")]
    pub no_archive: bool,
    /// Print the reports as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Maximum rows shown per report (0 shows all)
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum RuleArg {
    /// Remove spaces only
    Whitespace,
    /// Remove spaces and a trailing `(<digits><unit>)` session suffix
    WhitespaceAndSuffix,
}

impl From<RuleArg> for NormalizationRule {
    fn from(value: RuleArg) -> Self {
        match value {
            RuleArg::Whitespace => NormalizationRule::WHITESPACE,
            RuleArg::WhitespaceAndSuffix => NormalizationRule::WHITESPACE_AND_SUFFIX,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
