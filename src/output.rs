use crate::error::Result;
use crate::types::{ChartSeries, Dashboard, DeploymentSelection, ReportView, UploadLogEntry};
use crate::util::{format_int, format_money};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", s)?;
    Ok(())
}

pub fn render_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::markdown()).to_string()
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Cost per Year")]
    value: String,
}

#[derive(Tabled)]
struct UploadRow {
    #[tabled(rename = "File")]
    key: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Account")]
    account_name: String,
    #[tabled(rename = "Date")]
    extracted_date: String,
    #[tabled(rename = "Uploaded")]
    upload_timestamp: String,
}

fn or_dash(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "-".to_string())
}

fn series_table(series: &ChartSeries) -> String {
    let rows: Vec<SeriesRow> = series
        .points()
        .map(|(label, value)| SeriesRow {
            label: label.to_string(),
            value: format_money(value),
        })
        .collect();
    render_table(&rows)
}

pub fn render_dashboard(d: &Dashboard) -> String {
    format!(
        "Dashboard: {}\n\nTotal yearly RAM cost: {}\n\nBy deployment\n\n{}\n\nBy provider\n\n{}\n",
        d.display_name,
        format_money(d.total_yearly_cost),
        series_table(&d.by_deployment),
        series_table(&d.by_provider),
    )
}

pub fn render_report(r: &ReportView) -> String {
    format!(
        "Report: {} ({} rows)\n\n{}\n\nTotals: {} per hour, {} per day, {} per year ({} billed in period)\n",
        r.display_name,
        format_int(r.rows.len() as u64),
        render_table(&r.rows),
        format_money(r.totals.hour),
        format_money(r.totals.day),
        format_money(r.totals.year),
        format_money(r.totals.period),
    )
}

pub fn render_selection(s: &DeploymentSelection) -> String {
    let mut out = format!("Deployments in {} (column \"{}\"):\n", s.filename, s.column);
    for d in &s.deployments {
        out.push_str(&format!("  - {}\n", d));
    }
    out
}

pub fn render_uploads(entries: &[UploadLogEntry]) -> String {
    let rows: Vec<UploadRow> = entries
        .iter()
        .map(|e| UploadRow {
            key: e.key.clone(),
            display_name: or_dash(&e.display_name),
            account_name: or_dash(&e.account_name),
            extracted_date: or_dash(&e.extracted_date),
            upload_timestamp: or_dash(&e.upload_timestamp),
        })
        .collect();
    render_table(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportTotals;
    use tempfile::TempDir;

    #[test]
    fn test_render_dashboard() {
        let mut by_deployment = ChartSeries::default();
        by_deployment.push("prod", 21900.0);
        let dash = Dashboard {
            filename: "f.csv".into(),
            display_name: "acme_2024-05-01".into(),
            deployment_column: "Deployment name".into(),
            total_yearly_cost: 21900.0,
            by_deployment,
            by_provider: ChartSeries::default(),
        };
        let text = render_dashboard(&dash);
        assert!(text.contains("acme_2024-05-01"));
        assert!(text.contains("$21,900.00"));
        assert!(text.contains("| prod"));
        assert!(text.contains("(no rows)"));
    }

    #[test]
    fn test_render_empty_report() {
        let report = ReportView {
            filename: "f.csv".into(),
            deployment: "prod".into(),
            display_name: "prod".into(),
            columns: vec![],
            rows: vec![],
            totals: ReportTotals::default(),
        };
        let text = render_report(&report);
        assert!(text.contains("(0 rows)"));
        assert!(text.contains("$0.00 per hour"));
    }

    #[test]
    fn test_render_uploads_fills_missing() {
        let entries = vec![UploadLogEntry {
            key: "a.csv".into(),
            ..Default::default()
        }];
        let text = render_uploads(&entries);
        assert!(text.contains("a.csv"));
        assert!(text.contains(" - "));
    }

    #[test]
    fn test_write_csv() {
        #[derive(Serialize)]
        struct Row {
            #[serde(rename = "Deployment")]
            deployment: &'static str,
            #[serde(rename = "CostPerYear")]
            cost: f64,
        }
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &[Row { deployment: "prod", cost: 21900.0 }]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Deployment,CostPerYear\nprod,21900.0\n");
    }
}
