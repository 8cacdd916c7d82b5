//! Shared fixtures for the integration tests.

#![allow(dead_code)]

/// Builder for billing-export CSV text.
pub struct ExportBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ExportBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// The column set of a typical export.
    pub fn standard() -> Self {
        Self::new(&["Deployment name", "SKU Name", "Usage type", "Unit price", "Total"])
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn build(&self) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.headers).unwrap();
        for r in &self.rows {
            wtr.write_record(r).unwrap();
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }
}

pub const AZURE_SKU: &str = "Standard_Azure.Postgres.General_eastus_65536_2";
pub const AWS_SKU: &str = "Premium_AWS.Redis.Cache_us-east-1_131072_4";
pub const GCP_SKU: &str = "Basic_GCP.Mysql.Small_europe-west1_32768_0";
