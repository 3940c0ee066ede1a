//! Builds every derived table for one upload.
//!
//! [`build_reports`] is a pure function of the normalized table and the
//! options: no state survives between calls, so two runs over the same table
//! produce identical [`ReportSet`]s.

use log::info;
use serde::Serialize;

use crate::{
    comparison::{CourseNameNormalizer, NameVariantGroup, NormalizationRule, compare_normalized_names},
    data::{NormalizedTable, RawTable},
    duplicates::{DuplicateKeyOptions, find_duplicates},
    error::ReportError,
    mismatch::{CountMismatch, find_count_mismatch},
    normalize::normalize,
    schema::ReportSchema,
};

pub const DUPLICATES_FILE: &str = "1_과정명_일치.csv";
pub const MISMATCH_FILE: &str = "2_이름_개수_불일치.csv";
pub const MISMATCH_HEADERS: [&str; 3] = ["과정명", "고유개수", "이름개수"];
pub const COMPARISON_HEADERS: [&str; 3] = ["과정명", "구분 별 개수", "전체 개수"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub duplicate_key: DuplicateKeyOptions,
    /// One comparison report is produced per rule, in this order.
    pub rules: Vec<NormalizationRule>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            duplicate_key: DuplicateKeyOptions::default(),
            rules: vec![
                NormalizationRule::WHITESPACE,
                NormalizationRule::WHITESPACE_AND_SUFFIX,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ComparisonReport {
    pub rule: NormalizationRule,
    pub rows: Vec<NameVariantGroup>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportSet {
    pub duplicates: NormalizedTable,
    pub count_mismatches: Vec<CountMismatch>,
    pub comparisons: Vec<ComparisonReport>,
}

/// A derived table flattened to text, ready for a file, a zip entry or a
/// terminal.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn build_reports(
    table: &NormalizedTable,
    schema: &ReportSchema,
    options: &ReportOptions,
) -> Result<ReportSet, ReportError> {
    let normalizers = options
        .rules
        .iter()
        .map(|rule| CourseNameNormalizer::new(*rule, &schema.session_units))
        .collect::<Result<Vec<_>, _>>()?;

    let duplicates = find_duplicates(table, options.duplicate_key);
    let count_mismatches = find_count_mismatch(table);
    let comparisons = normalizers
        .iter()
        .map(|normalizer| ComparisonReport {
            rule: normalizer.rule(),
            rows: compare_normalized_names(table, normalizer),
        })
        .collect::<Vec<_>>();

    info!(
        "Built reports: {} duplicate row(s), {} count mismatch(es), {} comparison table(s)",
        duplicates.len(),
        count_mismatches.len(),
        comparisons.len()
    );
    Ok(ReportSet {
        duplicates,
        count_mismatches,
        comparisons,
    })
}

/// Normalizes a raw export and builds its reports. Nothing is produced when
/// normalization fails.
pub fn run_pipeline(
    raw: &RawTable,
    schema: &ReportSchema,
    options: &ReportOptions,
) -> Result<ReportSet, ReportError> {
    let table = normalize(raw, schema)?;
    build_reports(&table, schema, options)
}

impl ReportSet {
    pub fn tables(&self) -> Vec<ReportTable> {
        let mut tables = vec![
            ReportTable {
                title: "과정명 일치 (중복 기록)".to_string(),
                file_name: DUPLICATES_FILE.to_string(),
                headers: self.duplicates.columns.clone(),
                rows: self.duplicates.rendered_rows(),
            },
            ReportTable {
                title: "이름 개수 불일치".to_string(),
                file_name: MISMATCH_FILE.to_string(),
                headers: MISMATCH_HEADERS.iter().map(|h| h.to_string()).collect(),
                rows: self
                    .count_mismatches
                    .iter()
                    .map(|m| {
                        vec![
                            m.course_name.clone(),
                            m.unique_attendee_count.to_string(),
                            m.total_record_count.to_string(),
                        ]
                    })
                    .collect(),
            },
        ];
        for (offset, comparison) in self.comparisons.iter().enumerate() {
            let label = comparison.rule.label();
            tables.push(ReportTable {
                title: label.replace('_', " "),
                file_name: format!("{}_{label}.csv", offset + 3),
                headers: COMPARISON_HEADERS.iter().map(|h| h.to_string()).collect(),
                rows: comparison
                    .rows
                    .iter()
                    .map(|group| {
                        vec![
                            group.normalized_course_name.clone(),
                            group.literal_count_breakdown.clone(),
                            group.total_count.to_string(),
                        ]
                    })
                    .collect(),
            });
        }
        tables
    }
}
