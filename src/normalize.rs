//! Cleans a raw export into a [`NormalizedTable`].
//!
//! The steps run in a fixed order: dropped columns are removed, headers are
//! renamed and the report columns resolved, rows without a sequence number or
//! an attendee name are discarded, and the integer columns are cast. A cast
//! failure rejects the whole upload.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    data::{ColumnRoles, NormalizedTable, RawTable, Value, parse_integer, unique_column_name},
    error::{ReportError, SchemaError},
    schema::ReportSchema,
};

pub fn normalize(raw: &RawTable, schema: &ReportSchema) -> Result<NormalizedTable, ReportError> {
    schema.validate()?;
    let sequence_idx = require_raw(raw, &schema.sequence_column)?;
    let name_idx = require_raw(raw, &schema.name_column)?;

    let role_names = role_columns(schema);
    let mut source_indices = Vec::new();
    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    for (idx, header) in raw.headers.iter().enumerate() {
        if schema.is_dropped(header) {
            debug!("Dropping column '{}'", header.escape_debug());
            continue;
        }
        let mut output = schema.output_name(header);
        if output != *header {
            debug!("Renaming column '{}' to '{output}'", header.escape_debug());
        }
        if seen.contains(&output) {
            if role_names.contains(&output) {
                return Err(SchemaError::AmbiguousColumn(output).into());
            }
            let unique = unique_column_name(&mut seen, &output);
            debug!("Column '{output}' repeats after renaming; keeping it as '{unique}'");
            output = unique;
        } else {
            seen.insert(output.clone());
        }
        source_indices.push(idx);
        columns.push(output);
    }

    let position = |name: &str| -> Result<usize, SchemaError> {
        columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    };
    let integer_positions = schema
        .integer_columns
        .iter()
        .map(|name| position(name.as_str()))
        .collect::<Result<HashSet<_>, _>>()?;
    let roles = ColumnRoles {
        sequence: position(schema.output_name(&schema.sequence_column).as_str())?,
        name: position(schema.output_name(&schema.name_column).as_str())?,
        course: position(schema.course_column.as_str())?,
        session: position(schema.session_column.as_str())?,
        key: schema
            .key_columns
            .iter()
            .map(|name| position(name.as_str()))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let kept_rows = raw
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| has_value(row, sequence_idx) && has_value(row, name_idx))
        .collect::<Vec<_>>();
    let dropped = raw.rows.len() - kept_rows.len();
    if dropped > 0 {
        info!("Dropped {dropped} row(s) without a sequence number or name");
    }
    if kept_rows.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    let mut rows = Vec::with_capacity(kept_rows.len());
    for (row_idx, raw_row) in kept_rows {
        let mut row = Vec::with_capacity(columns.len());
        for (position, &source) in source_indices.iter().enumerate() {
            let cell = raw_row.get(source).and_then(|cell| cell.as_deref());
            if integer_positions.contains(&position) {
                let value = cell.and_then(parse_integer).ok_or_else(|| SchemaError::NotInteger {
                    column: columns[position].clone(),
                    row: row_idx + 1,
                    value: cell.unwrap_or_default().to_string(),
                })?;
                row.push(Some(Value::Integer(value)));
            } else {
                row.push(cell.map(|text| Value::Text(text.to_string())));
            }
        }
        rows.push(row);
    }

    info!(
        "Normalized {} row(s) across {} column(s)",
        rows.len(),
        columns.len()
    );
    Ok(NormalizedTable {
        columns,
        rows,
        roles,
    })
}

/// Output names the reports read; a repeat of one of these is ambiguous.
fn role_columns(schema: &ReportSchema) -> HashSet<String> {
    let mut names = HashSet::new();
    names.insert(schema.output_name(&schema.sequence_column));
    names.insert(schema.output_name(&schema.name_column));
    names.insert(schema.course_column.clone());
    names.insert(schema.session_column.clone());
    names.extend(schema.key_columns.iter().cloned());
    names.extend(schema.integer_columns.iter().cloned());
    names
}

fn has_value(row: &[Option<String>], idx: usize) -> bool {
    row.get(idx).is_some_and(Option::is_some)
}

fn require_raw(raw: &RawTable, name: &str) -> Result<usize, SchemaError> {
    raw.column_index(name)
        .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
}
