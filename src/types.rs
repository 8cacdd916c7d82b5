use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

use crate::util::{format_money, format_number};

/// Header name the deployment identifier is normalized to.
pub const DEPLOYMENT_COLUMN: &str = "Deployment name";

/// A billing export as read from CSV: trimmed headers plus untyped rows.
///
/// Column names vary between exports, so nothing here is typed; the loader
/// resolves the columns it needs by name.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl RawTable {
    /// Build a table from header names (trimmed here) and rows.
    ///
    /// When a trimmed header appears twice, the first occurrence wins.
    pub fn new<I, S>(headers: I, rows: Vec<StringRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            index,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell lookup; short rows yield `None` for their missing trailing cells.
    pub fn cell<'a>(&self, row: &'a StringRecord, column: Option<usize>) -> Option<&'a str> {
        column.and_then(|i| row.get(i))
    }

    /// Keep only rows whose `column` equals `value` exactly.
    ///
    /// Filtering on a column the export does not have keeps every row.
    pub fn retain_matching(&mut self, column: &str, value: &str) {
        if let Some(i) = self.column_index(column) {
            self.rows.retain(|r| r.get(i) == Some(value));
        }
    }
}

/// One billing line item after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub deployment_name: String,
    pub tier: String,
    pub sku_code_full: String,
    pub region: String,
    pub provider: String,
    pub edition: String,
    pub sku_code: String,
    pub size_gb: u64,
    pub number_of_nodes: u64,
    pub component: String,
    pub cost_per_hour: f64,
    pub cost_per_day: f64,
    pub cost_per_year: f64,
    pub total_cost_period: f64,
}

fn display_money(v: &f64) -> String {
    format_money(*v)
}

fn display_rate(v: &f64) -> String {
    format!("${}", format_number(*v, 4))
}

/// Full listing row: every output column, deployment first.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ListingRow {
    #[serde(rename = "DeploymentName")]
    #[tabled(rename = "Deployment name")]
    pub deployment_name: String,
    #[serde(rename = "Tier")]
    #[tabled(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "Provider")]
    #[tabled(rename = "Provider")]
    pub provider: String,
    #[serde(rename = "Edition")]
    #[tabled(rename = "Edition")]
    pub edition: String,
    #[serde(rename = "SKUCode")]
    #[tabled(rename = "SKU Code")]
    pub sku_code: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "SizeGB")]
    #[tabled(rename = "Size in GB")]
    pub size_gb: u64,
    #[serde(rename = "NumberOfNodes")]
    #[tabled(rename = "Number of Nodes")]
    pub number_of_nodes: u64,
    #[serde(rename = "CostPerHour")]
    #[tabled(rename = "Cost per Hour", display_with = "display_rate")]
    pub cost_per_hour: f64,
    #[serde(rename = "CostPerDay")]
    #[tabled(rename = "Cost per Day", display_with = "display_money")]
    pub cost_per_day: f64,
    #[serde(rename = "CostPerYear")]
    #[tabled(rename = "Cost per Year", display_with = "display_money")]
    pub cost_per_year: f64,
}

/// Per-deployment report row; the deployment is implied by the report.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ReportRow {
    #[serde(rename = "Tier")]
    #[tabled(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "Provider")]
    #[tabled(rename = "Provider")]
    pub provider: String,
    #[serde(rename = "Edition")]
    #[tabled(rename = "Edition")]
    pub edition: String,
    #[serde(rename = "SKUCode")]
    #[tabled(rename = "SKU Code")]
    pub sku_code: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "SizeGB")]
    #[tabled(rename = "Size in GB")]
    pub size_gb: u64,
    #[serde(rename = "NumberOfNodes")]
    #[tabled(rename = "Number of Nodes")]
    pub number_of_nodes: u64,
    #[serde(rename = "CostPerHour")]
    #[tabled(rename = "Cost per Hour", display_with = "display_rate")]
    pub cost_per_hour: f64,
    #[serde(rename = "CostPerDay")]
    #[tabled(rename = "Cost per Day", display_with = "display_money")]
    pub cost_per_day: f64,
    #[serde(rename = "CostPerYear")]
    #[tabled(rename = "Cost per Year", display_with = "display_money")]
    pub cost_per_year: f64,
}

/// Unrounded cost sums over a report's rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub hour: f64,
    pub day: f64,
    pub year: f64,
    /// Sum of the export's own `Total` column over the same rows.
    pub period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub filename: String,
    pub deployment: String,
    pub display_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

/// Label/value pairs in chart order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub filename: String,
    pub display_name: String,
    pub deployment_column: String,
    pub total_yearly_cost: f64,
    pub by_deployment: ChartSeries,
    pub by_provider: ChartSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentSelection {
    pub filename: String,
    /// Column the deployment values were read from, used to request a report.
    pub column: String,
    pub deployments: Vec<String>,
}

/// Stored metadata about one uploaded export, keyed by file name.
///
/// Fields are optional because the log store merges partial writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadLogEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<String>,
}

/// Fields to merge into an [`UploadLogEntry`]; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadLogPatch {
    pub account_name: Option<String>,
    pub extracted_date: Option<String>,
    pub display_name: Option<String>,
    pub upload_timestamp: Option<String>,
}

impl UploadLogEntry {
    pub fn merge(&mut self, patch: UploadLogPatch) {
        if patch.account_name.is_some() {
            self.account_name = patch.account_name;
        }
        if patch.extracted_date.is_some() {
            self.extracted_date = patch.extracted_date;
        }
        if patch.display_name.is_some() {
            self.display_name = patch.display_name;
        }
        if patch.upload_timestamp.is_some() {
            self.upload_timestamp = patch.upload_timestamp;
        }
    }
}
