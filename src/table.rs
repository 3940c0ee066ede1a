//! Terminal rendering for report tables.
//!
//! Hangul and other East Asian wide characters occupy two terminal columns,
//! so widths are measured in display columns rather than chars.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::report::ReportTable;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);
    let rule_widths: Vec<usize> = widths.iter().map(|width| (*width).max(3)).collect();
    let rules: Vec<String> = rule_widths.iter().map(|width| "-".repeat(*width)).collect();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let _ = writeln!(output, "{}", format_row(&rules, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| display_width(&sanitize_cell(header)))
        .collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(&sanitize_cell(cell)));
        }
    }
    widths.iter().map(|width| (*width).max(1)).collect()
}

/// Title line, table body, and a row count; an empty report says so.
pub fn render_report(report: &ReportTable) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "== {} ({})", report.title, report.file_name);
    if report.rows.is_empty() {
        let _ = writeln!(output, "(no rows)");
    } else {
        output.push_str(&render_table(&report.headers, &report.rows));
        let _ = writeln!(output, "{} row(s)", report.rows.len());
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end_matches(' ').to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    if is_wide(ch) { 2 } else { 1 }
}

fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}

/// Header cells such as `교육\n일시` carry line breaks; flatten them.
fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
