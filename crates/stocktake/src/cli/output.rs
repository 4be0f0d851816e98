//! Output formatting utilities for CLI commands

use chrono::{DateTime, Local, Utc};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use stocktake_audit::{ReportStatus, ScanClassification};

/// Format a UTC timestamp in local time, minute precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Text progress bar, e.g. `[#####-----] 50%`.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

pub fn classification_color(classification: ScanClassification) -> Color {
    match classification {
        ScanClassification::Confirmed => Color::Green,
        ScanClassification::Duplicate => Color::DarkGrey,
        ScanClassification::Intruder => Color::Yellow,
        ScanClassification::Unknown => Color::Red,
    }
}

pub fn report_status_color(status: ReportStatus) -> Color {
    match status {
        ReportStatus::Complete => Color::Green,
        ReportStatus::Partial => Color::Yellow,
    }
}

/// Print a simple table.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let colored = rows
        .into_iter()
        .map(|row| row.into_iter().map(|text| (text, None)).collect())
        .collect();
    print_table_colored(headers, colored);
}

/// Print a table with per-cell colors.
pub fn print_table_colored(headers: &[&str], rows: Vec<Vec<(String, Option<Color>)>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .map(|(text, color)| {
                let cell = Cell::new(text);
                if let Some(c) = color {
                    cell.fg(c)
                } else {
                    cell
                }
            })
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
}

/// Print `{"ok": true, "data": ...}` on stdout.
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let value = serde_json::json!({ "ok": true, "data": data });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Print one compact `{"ok": true, "kind": ..., "data": ...}` line, for
/// output streamed while a command runs.
pub fn print_json_line<T: Serialize + ?Sized>(kind: &str, data: &T) -> anyhow::Result<()> {
    println!("{}", json_line(kind, data)?);
    Ok(())
}

fn json_line<T: Serialize + ?Sized>(kind: &str, data: &T) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({ "ok": true, "kind": kind, "data": data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_envelope() {
        let line = json_line("status", &serde_json::json!({"progressPercent": 50})).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["kind"], "status");
        assert_eq!(value["data"]["progressPercent"], 50);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------] 0%");
        assert_eq!(progress_bar(50, 10), "[#####-----] 50%");
        assert_eq!(progress_bar(100, 4), "[####] 100%");
        assert_eq!(progress_bar(33, 3), "[---] 33%");
    }
}
