//! Plain-text rendering for terminal summaries.

use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;

use crate::{consistency::ConsistencyReport, schema::Schema};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// One line per column: name, type, match ratio and mismatch count. Columns
/// without audit data show `-` for the ratio.
pub fn schema_summary_rows(schema: &Schema, report: &ConsistencyReport) -> Vec<Vec<String>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let audit = report.columns.get(idx);
            vec![
                column.origin_name.clone(),
                column.inferred_type.to_string(),
                audit
                    .map(|a| format!("{:.2}%", a.match_ratio * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
                audit
                    .map(|a| a.mismatch_count.to_string())
                    .unwrap_or_else(|| "0".to_string()),
            ]
        })
        .collect()
}

pub fn schema_summary_headers() -> Vec<String> {
    ["column", "type", "match", "mismatches"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Column count per type, in first-seen order.
pub fn type_totals(schema: &Schema) -> Vec<(String, usize)> {
    let counts = schema.columns.iter().map(|c| c.inferred_type).counts();
    schema
        .columns
        .iter()
        .map(|c| c.inferred_type)
        .unique()
        .map(|ty| (ty.to_string(), counts[&ty]))
        .collect()
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

/// Terminal column width: ANSI escapes take no space and East Asian wide
/// characters take two cells.
fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else if is_wide(ch) {
            width += 2;
        } else {
            width += 1;
        }
    }
    width
}

fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
