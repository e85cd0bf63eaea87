//! Plain-text rendering of a [`DashboardSnapshot`] for the terminal.

use std::fmt::Write;

use crate::format;
use crate::pipeline::aggregate::{AggregateTable, Unit};
use crate::pipeline::DashboardSnapshot;

const TITLE: &str = "HealthyJuice @ WellMart - Retail Dashboard";

fn cell(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Currency => format::currency(value),
        Unit::Units => format::units(value),
        Unit::Percent => format::percent(value),
    }
}

fn render_table(out: &mut String, table: &AggregateTable) -> std::fmt::Result {
    writeln!(out, "\n## {}", table.title)?;
    if table.is_empty() {
        return writeln!(out, "(no data)");
    }

    let mut header = vec![table.key_label.to_string()];
    header.extend(table.columns.iter().map(|c| c.name.to_string()));

    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut line = vec![row.key.clone()];
            line.extend(
                row.values
                    .iter()
                    .zip(&table.columns)
                    .map(|(v, c)| cell(*v, c.unit)),
            );
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|line| line[i].len())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for line in std::iter::once(&header).chain(&body) {
        let mut text = String::new();
        for (i, field) in line.iter().enumerate() {
            if i == 0 {
                write!(text, "{field:<w$}", w = widths[i])?;
            } else {
                write!(text, "  {field:>w$}", w = widths[i])?;
            }
        }
        writeln!(out, "{}", text.trim_end())?;
    }
    Ok(())
}

/// Render KPIs followed by every view.
pub fn render(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(&mut out, snapshot);
    out
}

fn render_into(out: &mut String, snapshot: &DashboardSnapshot) -> std::fmt::Result {
    writeln!(out, "# {TITLE}")?;
    let range = &snapshot.selection.date_range;
    writeln!(out, "{} to {}, {} rows", range.start, range.end, snapshot.row_count)?;
    writeln!(out)?;
    for (label, value) in snapshot.kpi.cards() {
        writeln!(out, "{label:<16} {value}")?;
    }
    for table in &snapshot.views {
        render_table(out, table)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::filter::{DateRange, FilterSelection};
    use crate::data::model::{RetailDataset, TransactionRecord};
    use crate::pipeline;

    #[test]
    fn renders_kpis_and_tables() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let ds = RetailDataset::from_records(vec![TransactionRecord {
            date: Some(day),
            state: Some("CA".into()),
            store_id: Some("S1".into()),
            sales_amount: Some(1234.5),
            sales_units: Some(1500),
            out_of_stock: Some(true),
            ..Default::default()
        }]);
        let snap = pipeline::run(&ds, &FilterSelection::new(DateRange::new(day, day)));
        let text = render(&snap);

        assert!(text.contains("Total Sales ($)  $1,234.50"));
        assert!(text.contains("Units Sold       1,500"));
        assert!(text.contains("## Monthly Sales Trend"));
        assert!(text.contains("2024-01  $1,234.50"));
        assert!(text.contains("S1       100.0%"));
        // No city was recorded, so that chart is empty.
        assert!(text.contains("## Sales by City\n(no data)"));
    }
}
