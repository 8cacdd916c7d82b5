use crate::loader::resolve_deployment_column;
use crate::types::{
    CanonicalRow, ChartSeries, Dashboard, ListingRow, RawTable, ReportRow, ReportTotals,
    DEPLOYMENT_COLUMN,
};
use crate::util::round_to;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Slices kept by [`SeriesMode::TopWithOthers`] before the remainder bucket.
pub const TOP_DEPLOYMENTS: usize = 5;
pub const OTHERS_LABEL: &str = "Others";
/// Remainder label used when a kept deployment is itself named `Others`.
pub const OTHERS_FALLBACK_LABEL: &str = "Others (remaining)";

/// Column used by deployment selection when the export has no alias column.
pub const DEFAULT_DEPLOYMENT_COLUMN: &str = "__Default_Deployment__";
pub const DEFAULT_DEPLOYMENT_VALUE: &str = "All Data";

/// Column order of the per-deployment report.
pub const REPORT_COLUMNS: [&str; 10] = [
    "Tier",
    "Provider",
    "Edition",
    "SKUCode",
    "Region",
    "SizeGB",
    "NumberOfNodes",
    "CostPerHour",
    "CostPerDay",
    "CostPerYear",
];

/// How the by-deployment series is shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeriesMode {
    /// Every deployment with a positive cost, ordered by label.
    #[default]
    All,
    /// The five most expensive deployments plus an `Others` bucket.
    TopWithOthers,
}

/// Sum yearly cost per group, in first-seen group order.
fn yearly_by<F>(rows: &[CanonicalRow], key: F) -> Vec<(String, f64)>
where
    F: Fn(&CanonicalRow) -> &str,
{
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for r in rows {
        let k = key(r);
        match index.get(k) {
            Some(&i) => order[i].1 += r.cost_per_year,
            None => {
                index.insert(k, order.len());
                order.push((k.to_string(), r.cost_per_year));
            }
        }
    }
    order
}

fn positive_rounded(groups: Vec<(String, f64)>) -> Vec<(String, f64)> {
    groups
        .into_iter()
        .map(|(label, sum)| (label, round_to(sum, 2)))
        .filter(|(_, sum)| *sum > 0.0)
        .collect()
}

/// Rounded positive sums ordered by label.
fn series_by_label(groups: Vec<(String, f64)>) -> ChartSeries {
    let sorted: BTreeMap<String, f64> = positive_rounded(groups).into_iter().collect();
    let mut series = ChartSeries::default();
    for (label, value) in sorted {
        series.push(label, value);
    }
    series
}

/// Top `n` groups by value, ties kept in first-seen order, plus the rest
/// summed into `Others` when that sum is positive.
///
/// Labels stay unique: a kept group named `Others` moves the remainder to
/// [`OTHERS_FALLBACK_LABEL`].
fn series_top_with_others(groups: Vec<(String, f64)>, n: usize) -> ChartSeries {
    let mut groups = positive_rounded(groups);
    // `sort_by` is stable, so equal values keep first-seen order.
    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut series = ChartSeries::default();
    let rest = if groups.len() > n { groups.split_off(n) } else { Vec::new() };
    let others_label = if groups.iter().any(|(label, _)| label == OTHERS_LABEL) {
        OTHERS_FALLBACK_LABEL
    } else {
        OTHERS_LABEL
    };
    for (label, value) in groups {
        series.push(label, value);
    }
    let others = round_to(rest.iter().map(|(_, v)| v).sum(), 2);
    if others > 0.0 {
        series.push(others_label, others);
    }
    series
}

pub fn total_yearly_cost(rows: &[CanonicalRow]) -> f64 {
    rows.iter().map(|r| r.cost_per_year).sum()
}

/// Rows with an empty deployment cell count toward the total and the
/// provider series but get no slice of their own.
pub fn deployment_series(rows: &[CanonicalRow], mode: SeriesMode) -> ChartSeries {
    let mut groups = yearly_by(rows, |r| r.deployment_name.as_str());
    groups.retain(|(label, _)| !label.is_empty());
    match mode {
        SeriesMode::All => series_by_label(groups),
        SeriesMode::TopWithOthers => series_top_with_others(groups, TOP_DEPLOYMENTS),
    }
}

pub fn provider_series(rows: &[CanonicalRow]) -> ChartSeries {
    series_by_label(yearly_by(rows, |r| r.provider.as_str()))
}

pub fn build_dashboard(
    filename: &str,
    display_name: String,
    rows: &[CanonicalRow],
    mode: SeriesMode,
) -> Dashboard {
    Dashboard {
        filename: filename.to_string(),
        display_name,
        deployment_column: DEPLOYMENT_COLUMN.to_string(),
        total_yearly_cost: total_yearly_cost(rows),
        by_deployment: deployment_series(rows, mode),
        by_provider: provider_series(rows),
    }
}

/// Full listing of every canonical row, deployment first.
pub fn generate_listing(rows: &[CanonicalRow]) -> Vec<ListingRow> {
    rows.iter()
        .map(|r| ListingRow {
            deployment_name: r.deployment_name.clone(),
            tier: r.tier.clone(),
            provider: r.provider.clone(),
            edition: r.edition.clone(),
            sku_code: r.sku_code.clone(),
            region: r.region.clone(),
            size_gb: r.size_gb,
            number_of_nodes: r.number_of_nodes,
            cost_per_hour: r.cost_per_hour,
            cost_per_day: r.cost_per_day,
            cost_per_year: r.cost_per_year,
        })
        .collect()
}

/// Report rows in [`REPORT_COLUMNS`] order plus their unrounded totals.
pub fn generate_report(rows: &[CanonicalRow]) -> (Vec<ReportRow>, ReportTotals) {
    let mut totals = ReportTotals::default();
    let report_rows = rows
        .iter()
        .map(|r| {
            totals.hour += r.cost_per_hour;
            totals.day += r.cost_per_day;
            totals.year += r.cost_per_year;
            totals.period += r.total_cost_period;
            ReportRow {
                tier: r.tier.clone(),
                provider: r.provider.clone(),
                edition: r.edition.clone(),
                sku_code: r.sku_code.clone(),
                region: r.region.clone(),
                size_gb: r.size_gb,
                number_of_nodes: r.number_of_nodes,
                cost_per_hour: r.cost_per_hour,
                cost_per_day: r.cost_per_day,
                cost_per_year: r.cost_per_year,
            }
        })
        .collect();
    (report_rows, totals)
}

/// Distinct non-empty deployment values of the raw export, first-seen order.
///
/// Returns the column they came from so a report can filter on it. Exports
/// without any alias column yield a single synthetic `All Data` value.
pub fn distinct_deployments(table: &RawTable) -> (String, Vec<String>) {
    let Some(column) = resolve_deployment_column(table) else {
        return (
            DEFAULT_DEPLOYMENT_COLUMN.to_string(),
            vec![DEFAULT_DEPLOYMENT_VALUE.to_string()],
        );
    };
    let idx = table.column_index(column);
    let mut seen: Vec<String> = Vec::new();
    for row in table.rows() {
        if let Some(value) = table.cell(row, idx).filter(|v| !v.is_empty()) {
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_string());
            }
        }
    }
    (column.to_string(), seen)
}
