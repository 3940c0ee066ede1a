//! Column contract for attendance exports.
//!
//! A [`ReportSchema`] names every column the report pipeline touches: the
//! identity columns whose null rows are discarded, the remark and artifact
//! columns that are dropped, header renames for cells that carry an embedded
//! line break, the integer columns, and the duplicate-key columns. The default
//! descriptor matches the Korean training-attendance export; alternative
//! exports are described in YAML and loaded with [`ReportSchema::load`].

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

pub const SEQUENCE_COLUMN: &str = "연번";
pub const NAME_COLUMN: &str = "이름";
pub const CATEGORY1_COLUMN: &str = "구분1(외부/내부)";
pub const CATEGORY2_COLUMN: &str = "구분2(법정의무/직무역량)";
pub const SUBTYPE3_COLUMN: &str = "과정구분3";
pub const COURSE_COLUMN: &str = "과정명";
pub const SESSION_COLUMN: &str = "교육일시";
pub const HOURS_COLUMN: &str = "교육시간";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Source column holding the exported sequence number.
    pub sequence_column: String,
    /// Source column holding the attendee name.
    pub name_column: String,
    /// Columns removed when present.
    #[serde(default)]
    pub dropped_columns: Vec<String>,
    #[serde(default)]
    pub renames: Vec<ColumnRename>,
    /// Columns cast to integers, named after renames are applied.
    #[serde(default)]
    pub integer_columns: Vec<String>,
    /// Duplicate-key columns, named after renames are applied.
    pub key_columns: Vec<String>,
    pub course_column: String,
    pub session_column: String,
    /// Unit words accepted inside a trailing `(<digits><unit>)` course suffix.
    #[serde(default = "ReportSchema::default_session_units")]
    pub session_units: Vec<String>,
}

impl Default for ReportSchema {
    fn default() -> Self {
        ReportSchema {
            schema_version: Some("1".to_string()),
            sequence_column: SEQUENCE_COLUMN.to_string(),
            name_column: NAME_COLUMN.to_string(),
            dropped_columns: vec![
                "비고1".to_string(),
                "비고2".to_string(),
                "Unnamed: 14".to_string(),
            ],
            renames: vec![
                ColumnRename {
                    from: "교육\n일시".to_string(),
                    to: SESSION_COLUMN.to_string(),
                },
                ColumnRename {
                    from: "교육\n시간".to_string(),
                    to: HOURS_COLUMN.to_string(),
                },
            ],
            integer_columns: vec![SEQUENCE_COLUMN.to_string(), HOURS_COLUMN.to_string()],
            key_columns: vec![
                NAME_COLUMN.to_string(),
                CATEGORY1_COLUMN.to_string(),
                CATEGORY2_COLUMN.to_string(),
                SUBTYPE3_COLUMN.to_string(),
                COURSE_COLUMN.to_string(),
            ],
            course_column: COURSE_COLUMN.to_string(),
            session_column: SESSION_COLUMN.to_string(),
            session_units: Self::default_session_units(),
        }
    }
}

impl ReportSchema {
    pub fn default_session_units() -> Vec<String> {
        vec!["시간".to_string(), "차시".to_string()]
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: ReportSchema =
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        schema
            .validate()
            .with_context(|| format!("Validating schema file {path:?}"))?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML string")
    }

    /// Checks that the descriptor is internally consistent. Whether the
    /// columns exist in a given upload is checked during normalization.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |message: String| Err(SchemaError::InvalidDescriptor(message));
        if self.sequence_column.is_empty() || self.name_column.is_empty() {
            return invalid("sequence and name columns must be named".to_string());
        }
        if self.key_columns.is_empty() {
            return invalid("at least one key column is required".to_string());
        }
        if self.course_column.is_empty() || self.session_column.is_empty() {
            return invalid("course and session columns must be named".to_string());
        }
        if self.session_units.iter().any(|unit| unit.trim().is_empty()) {
            return invalid("session units cannot be blank".to_string());
        }
        for rename in &self.renames {
            if rename.to.is_empty() {
                return invalid(format!("rename of '{}' has an empty target", rename.from));
            }
            if self.dropped_columns.contains(&rename.from) {
                return invalid(format!("column '{}' is both dropped and renamed", rename.from));
            }
        }
        for required in [&self.sequence_column, &self.name_column] {
            if self.dropped_columns.contains(required) {
                return invalid(format!("required column '{required}' is listed as dropped"));
            }
        }
        Ok(())
    }

    /// Output name for a source header after renames. Carriage returns inside
    /// a header are folded so `교육\r\n일시` matches a `교육\n일시` rename.
    pub fn output_name(&self, header: &str) -> String {
        let folded = header.replace("\r\n", "\n");
        self.renames
            .iter()
            .find(|rename| rename.from == folded)
            .map(|rename| rename.to.clone())
            .unwrap_or(folded)
    }

    pub fn is_dropped(&self, header: &str) -> bool {
        self.dropped_columns.iter().any(|dropped| dropped == header)
    }

    /// Duplicate key, optionally extended with the session column.
    pub fn duplicate_key(&self, include_session: bool) -> Vec<String> {
        let mut key = self.key_columns.clone();
        if include_session && !key.contains(&self.session_column) {
            key.push(self.session_column.clone());
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_is_valid() {
        let schema = ReportSchema::default();
        schema.validate().expect("valid");
        assert_eq!(schema.key_columns.len(), 5);
        assert_eq!(schema.output_name("교육\n일시"), SESSION_COLUMN);
        assert_eq!(schema.output_name("교육\r\n시간"), HOURS_COLUMN);
        assert_eq!(schema.output_name(COURSE_COLUMN), COURSE_COLUMN);
    }

    #[test]
    fn duplicate_key_appends_session_once() {
        let schema = ReportSchema::default();
        let key = schema.duplicate_key(true);
        assert_eq!(key.len(), 6);
        assert_eq!(key.last().map(String::as_str), Some(SESSION_COLUMN));
        assert_eq!(schema.duplicate_key(false), schema.key_columns);
    }

    #[test]
    fn yaml_round_trip_preserves_descriptor() {
        let schema = ReportSchema::default();
        let yaml = schema.to_yaml_string().expect("yaml");
        let parsed: ReportSchema = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed, schema);
    }

    #[test]
    fn missing_session_units_fall_back_to_defaults() {
        let yaml = r#"
sequence_column: id
name_column: name
key_columns: [name, course]
course_column: course
session_column: held_at
"#;
        let schema: ReportSchema = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(schema.session_units, ReportSchema::default_session_units());
        assert!(schema.dropped_columns.is_empty());
        schema.validate().expect("valid");
    }

    #[test]
    fn dropping_a_required_column_is_rejected() {
        let mut schema = ReportSchema::default();
        schema.dropped_columns.push(NAME_COLUMN.to_string());
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("required column"));
    }
}
