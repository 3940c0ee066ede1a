//! Detects course names that differ only by spacing or by a trailing session
//! suffix such as `(2차시)`.
//!
//! Rows are counted per literal course name, the literal names are rewritten
//! by a [`NormalizationRule`], and every normalized name reached by more than
//! one literal spelling is reported with the per-spelling counts. A name with
//! a single spelling always agrees with itself and is never reported.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
};

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::{data::NormalizedTable, error::SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizationRule {
    pub strip_whitespace: bool,
    pub strip_session_suffix: bool,
}

impl NormalizationRule {
    pub const WHITESPACE: Self = Self {
        strip_whitespace: true,
        strip_session_suffix: false,
    };
    pub const WHITESPACE_AND_SUFFIX: Self = Self {
        strip_whitespace: true,
        strip_session_suffix: true,
    };

    /// Short Korean label used in report titles and file names.
    pub fn label(&self) -> &'static str {
        match (self.strip_whitespace, self.strip_session_suffix) {
            (true, false) => "띄어쓰기_제거",
            (true, true) => "띄어쓰기_괄호_제거",
            (false, true) => "괄호_제거",
            (false, false) => "과정명_비교",
        }
    }
}

/// A [`NormalizationRule`] bound to the session-unit words it recognises.
#[derive(Debug, Clone)]
pub struct CourseNameNormalizer {
    rule: NormalizationRule,
    suffix: Option<Regex>,
}

impl CourseNameNormalizer {
    pub fn new(rule: NormalizationRule, session_units: &[String]) -> Result<Self, SchemaError> {
        let suffix = if rule.strip_session_suffix {
            if session_units.is_empty() {
                return Err(SchemaError::InvalidDescriptor(
                    "suffix stripping needs at least one session unit".to_string(),
                ));
            }
            let units = session_units.iter().map(|unit| regex::escape(unit.trim())).join("|");
            let pattern = format!(r"\s*\(\s*[0-9]+\s*(?:{units})\s*\)\s*$");
            Some(Regex::new(&pattern).map_err(|err| {
                SchemaError::InvalidDescriptor(format!("session unit pattern: {err}"))
            })?)
        } else {
            None
        };
        Ok(Self { rule, suffix })
    }

    pub fn rule(&self) -> NormalizationRule {
        self.rule
    }

    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(name);
        if self.rule.strip_whitespace && current.contains(' ') {
            current = Cow::Owned(current.replace(' ', ""));
        }
        if let Some(suffix) = &self.suffix
            && let Some(found) = suffix.find(&current)
        {
            current = Cow::Owned(current[..found.start()].to_string());
        }
        current
    }
}

/// One normalized course name reached by several literal spellings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NameVariantGroup {
    pub normalized_course_name: String,
    /// Literal spellings in ascending order, aligned with the breakdown.
    pub literal_names: Vec<String>,
    /// Per-spelling row counts joined with `", "`.
    pub literal_count_breakdown: String,
    pub total_count: usize,
}

pub fn compare_normalized_names(
    table: &NormalizedTable,
    normalizer: &CourseNameNormalizer,
) -> Vec<NameVariantGroup> {
    let course = table.roles.course;
    let mut literal_counts: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        if let Some(value) = row[course].as_ref() {
            *literal_counts.entry(value.as_display()).or_insert(0) += 1;
        }
    }

    let mut groups: BTreeMap<String, Vec<(String, usize)>> = BTreeMap::new();
    for (literal, count) in literal_counts {
        let normalized = normalizer.normalize(&literal).into_owned();
        groups.entry(normalized).or_default().push((literal, count));
    }

    groups
        .into_iter()
        .filter(|(_, variants)| variants.len() > 1)
        .map(|(normalized, mut variants)| {
            variants.sort_by(|a, b| a.0.cmp(&b.0));
            NameVariantGroup {
                normalized_course_name: normalized,
                literal_count_breakdown: variants.iter().map(|(_, count)| count).join(", "),
                total_count: variants.iter().map(|(_, count)| count).sum(),
                literal_names: variants.into_iter().map(|(literal, _)| literal).collect(),
            }
        })
        .collect()
}
