//! Terminal rendering of drift results.

use crate::compare::DriftReport;
use crate::report::SchemaSummary;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use schemadrift_mapping::Diagnostic;

/// Build a table with the standard styling.
pub fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);
    table
}

/// One row per drifted table: name, status, columns only in the mapping,
/// columns only in the database.
pub fn drift_rows(report: &DriftReport) -> Vec<Vec<String>> {
    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    for table in &report.tables_only_in_mapping {
        rows.push((
            table.clone(),
            vec![
                table.clone(),
                "missing in database".to_string(),
                String::new(),
                String::new(),
            ],
        ));
    }
    for table in &report.tables_only_in_database {
        rows.push((
            table.clone(),
            vec![
                table.clone(),
                "not mapped".to_string(),
                String::new(),
                String::new(),
            ],
        ));
    }
    for (table, drift) in &report.columns {
        rows.push((
            table.clone(),
            vec![
                table.clone(),
                "column drift".to_string(),
                drift.only_in_mapping.join(", "),
                drift.only_in_database.join(", "),
            ],
        ));
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

fn status_color(status: &str) -> Color {
    match status {
        "missing in database" => Color::Red,
        "not mapped" => Color::Yellow,
        _ => Color::Magenta,
    }
}

/// Print the comparison summary, the drifted tables and any diagnostics.
pub fn print_drift_summary(
    mapping: &SchemaSummary,
    database: &SchemaSummary,
    report: &DriftReport,
    diagnostics: &[Diagnostic],
) {
    let mut sides = styled_table(&["Side", "Source", "Tables", "Columns"]);
    for (side, summary) in [("mapping", mapping), ("database", database)] {
        sides.add_row(vec![
            side.to_string(),
            summary.source.clone(),
            summary.tables.to_string(),
            summary.columns.to_string(),
        ]);
    }
    println!("{}", sides);

    if report.is_clean() {
        println!(
            "No drift: {} table(s) match between mapping and database.",
            report.tables_compared
        );
    } else {
        let mut table = styled_table(&["Table", "Status", "Only in mapping", "Only in database"]);
        for row in drift_rows(report) {
            let color = status_color(&row[1]);
            let cells: Vec<Cell> = row
                .into_iter()
                .enumerate()
                .map(|(i, text)| if i == 1 { Cell::new(text).fg(color) } else { Cell::new(text) })
                .collect();
            table.add_row(cells);
        }
        println!("{}", table);
        println!(
            "Drift detected: {} finding(s) across {} table(s).",
            report.finding_count(),
            report.tables_only_in_mapping.len()
                + report.tables_only_in_database.len()
                + report.columns.len()
        );
    }

    if !diagnostics.is_empty() {
        println!();
        println!("Warnings ({}):", diagnostics.len());
        for diag in diagnostics {
            println!("  {}", diag);
        }
    }
}
