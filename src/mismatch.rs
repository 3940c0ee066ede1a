use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::data::{NormalizedTable, Value};

/// A course whose record count differs from its distinct attendee count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountMismatch {
    pub course_name: String,
    pub unique_attendee_count: usize,
    pub total_record_count: usize,
}

struct CourseTally<'a> {
    course: &'a Value,
    attendees: HashSet<&'a Value>,
    records: usize,
}

/// Groups rows by course name in first-occurrence order and reports the
/// groups where some attendee appears more than once. Rows without a course
/// name belong to no group.
pub fn find_count_mismatch(table: &NormalizedTable) -> Vec<CountMismatch> {
    let (name, course) = (table.roles.name, table.roles.course);
    let mut order: Vec<CourseTally<'_>> = Vec::new();
    let mut positions: HashMap<&Value, usize> = HashMap::new();

    for row in &table.rows {
        let Some(course_value) = row[course].as_ref() else {
            continue;
        };
        let slot = *positions.entry(course_value).or_insert_with(|| {
            order.push(CourseTally {
                course: course_value,
                attendees: HashSet::new(),
                records: 0,
            });
            order.len() - 1
        });
        let tally = &mut order[slot];
        tally.records += 1;
        if let Some(attendee) = row[name].as_ref() {
            tally.attendees.insert(attendee);
        }
    }

    order
        .into_iter()
        .filter(|tally| tally.attendees.len() != tally.records)
        .map(|tally| CountMismatch {
            course_name: tally.course.as_display(),
            unique_attendee_count: tally.attendees.len(),
            total_record_count: tally.records,
        })
        .collect()
}
