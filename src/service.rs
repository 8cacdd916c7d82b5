//! The request-level views over stored billing exports.
//!
//! Every view re-fetches and re-parses its source object; nothing is cached
//! between calls. A missing object or unreadable CSV fails the view, while
//! upload-log lookups only ever degrade the display name.

use crate::error::{BillingError, Result};
use crate::loader::{load_and_normalize, normalize, read_table};
use crate::reports::{
    build_dashboard, distinct_deployments, generate_listing, generate_report, SeriesMode,
    REPORT_COLUMNS,
};
use crate::storage::{ObjectStore, UploadLog};
use crate::types::{
    Dashboard, DeploymentSelection, ListingRow, ReportView, UploadLogEntry, UploadLogPatch,
};
use crate::util::extract_date;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

pub const DEFAULT_ACCOUNT: &str = "UnknownAccount";
pub const NO_DATE: &str = "NoDate";

pub struct CostReportService<S, L> {
    store: S,
    log: L,
}

impl<S: ObjectStore, L: UploadLog> CostReportService<S, L> {
    pub fn new(store: S, log: L) -> Self {
        Self { store, log }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Store an export and record it in the upload log.
    pub fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        account_name: Option<&str>,
    ) -> Result<UploadLogEntry> {
        self.upload_at(filename, bytes, account_name, Utc::now())
    }

    /// [`upload`](Self::upload) with an explicit upload time.
    pub fn upload_at(
        &self,
        filename: &str,
        bytes: &[u8],
        account_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<UploadLogEntry> {
        if filename.trim().is_empty() {
            return Err(BillingError::EmptyFilename);
        }
        self.store.put_object(filename, bytes)?;

        let account_name = account_name
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_ACCOUNT);
        let extracted_date = extract_date(filename).unwrap_or(NO_DATE);
        let patch = UploadLogPatch {
            account_name: Some(account_name.to_string()),
            extracted_date: Some(extracted_date.to_string()),
            display_name: Some(format!("{account_name}_{extracted_date}")),
            upload_timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
        };
        let entry = self.log.upsert_entry(filename, patch)?;
        info!(filename, bytes = bytes.len(), account_name, "uploaded billing export");
        Ok(entry)
    }

    /// All upload log entries, newest upload first.
    ///
    /// A failing log store yields an empty list.
    pub fn list_uploads(&self) -> Vec<UploadLogEntry> {
        let mut entries = match self.log.list_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "could not read upload log");
                return Vec::new();
            }
        };
        entries.sort_by(|a, b| {
            let a = a.upload_timestamp.as_deref().unwrap_or("");
            let b = b.upload_timestamp.as_deref().unwrap_or("");
            b.cmp(a)
        });
        entries
    }

    pub fn dashboard(&self, filename: &str, mode: SeriesMode) -> Result<Dashboard> {
        let bytes = self.store.fetch_object(filename)?;
        let (rows, _) = load_and_normalize(&bytes)?;
        let display_name = self.display_name_or(filename, filename);
        let dashboard = build_dashboard(filename, display_name, &rows, mode);
        info!(
            filename,
            rows = rows.len(),
            total_yearly_cost = dashboard.total_yearly_cost,
            "built dashboard"
        );
        Ok(dashboard)
    }

    /// Distinct deployments of an export, for choosing a report.
    pub fn select_deployment(&self, filename: &str) -> Result<DeploymentSelection> {
        let bytes = self.store.fetch_object(filename)?;
        let table = read_table(&bytes)?;
        let (column, deployments) = distinct_deployments(&table);
        info!(filename, column = %column, count = deployments.len(), "listed deployments");
        Ok(DeploymentSelection {
            filename: filename.to_string(),
            column,
            deployments,
        })
    }

    /// Itemized report for the rows whose `column` equals `deployment`.
    ///
    /// A `column` the export does not have leaves every row in the report.
    pub fn report(&self, filename: &str, column: &str, deployment: &str) -> Result<ReportView> {
        let bytes = self.store.fetch_object(filename)?;
        let mut table = read_table(&bytes)?;
        table.retain_matching(column, deployment);
        let (rows, _) = normalize(&table);
        let (report_rows, totals) = generate_report(&rows);
        info!(filename, column, deployment, rows = report_rows.len(), "built report");
        Ok(ReportView {
            filename: filename.to_string(),
            deployment: deployment.to_string(),
            display_name: self.display_name_or(filename, deployment),
            columns: REPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: report_rows,
            totals,
        })
    }

    /// Every normalized row of an export with its deployment.
    pub fn listing(&self, filename: &str) -> Result<Vec<ListingRow>> {
        let bytes = self.store.fetch_object(filename)?;
        let (rows, _) = load_and_normalize(&bytes)?;
        Ok(generate_listing(&rows))
    }

    fn display_name_or(&self, key: &str, fallback: &str) -> String {
        match self.log.get_entry(key) {
            Ok(Some(entry)) => entry.display_name.unwrap_or_else(|| fallback.to_string()),
            Ok(None) => fallback.to_string(),
            Err(e) => {
                warn!(key, error = %e, "could not look up display name");
                fallback.to_string()
            }
        }
    }
}
