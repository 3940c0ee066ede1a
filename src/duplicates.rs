use std::collections::HashMap;

use log::debug;

use crate::data::{NormalizedTable, Value, compare_nulls_last};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateKeyOptions {
    /// Append the session date/time column to the base key.
    pub include_session_datetime: bool,
}

impl DuplicateKeyOptions {
    pub fn key_columns(&self, table: &NormalizedTable) -> Vec<usize> {
        let mut key = table.roles.key.clone();
        if self.include_session_datetime && !key.contains(&table.roles.session) {
            key.push(table.roles.session);
        }
        key
    }
}

/// Every row whose duplicate key occurs at least twice, all members kept,
/// stably sorted by attendee name then course name.
pub fn find_duplicates(table: &NormalizedTable, options: DuplicateKeyOptions) -> NormalizedTable {
    let key_columns = options.key_columns(table);
    let key_of = |row: &[Option<Value>]| -> Vec<Option<Value>> {
        key_columns
            .iter()
            .map(|&idx| row.get(idx).cloned().flatten())
            .collect()
    };

    let mut occurrences: HashMap<Vec<Option<Value>>, usize> = HashMap::new();
    for row in &table.rows {
        *occurrences.entry(key_of(row)).or_insert(0) += 1;
    }

    let mut rows = table
        .rows
        .iter()
        .filter(|row| occurrences.get(&key_of(row)).copied().unwrap_or_default() >= 2)
        .cloned()
        .collect::<Vec<_>>();

    let (name, course) = (table.roles.name, table.roles.course);
    rows.sort_by(|a, b| {
        compare_nulls_last(a[name].as_ref(), b[name].as_ref())
            .then_with(|| compare_nulls_last(a[course].as_ref(), b[course].as_ref()))
    });
    debug!(
        "{} of {} row(s) share a duplicate key over {} column(s)",
        rows.len(),
        table.len(),
        key_columns.len()
    );
    table.with_rows(rows)
}
