use crate::error::Result;
use crate::sku::{SkuAttributes, UNKNOWN};
use crate::types::{CanonicalRow, RawTable, DEPLOYMENT_COLUMN};
use crate::util::parse_number_or_default;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

/// Columns that identify a deployment, in priority order.
pub const DEPLOYMENT_ALIASES: [&str; 4] = ["Deployment name", "Cluster Name", "Cluster", "ClusterName"];

pub const SKU_NAME_COLUMN: &str = "SKU Name";
pub const USAGE_TYPE_COLUMN: &str = "Usage type";
pub const UNIT_PRICE_COLUMN: &str = "Unit price";
pub const TOTAL_COLUMN: &str = "Total";

/// The only usage component that survives normalization.
pub const RAM_HOURS: &str = "ram hours";

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Alias column the deployment names came from, if any.
    pub deployment_column: Option<&'static str>,
    pub has_sku_column: bool,
}

/// Hourly unit price projected to a day and a year. Unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostProjection {
    pub per_hour: f64,
    pub per_day: f64,
    pub per_year: f64,
}

impl CostProjection {
    pub fn from_unit_price(unit_price: Option<&str>) -> Self {
        let per_hour = parse_number_or_default(unit_price, 0.0);
        let per_day = per_hour * HOURS_PER_DAY;
        Self {
            per_hour,
            per_day,
            per_year: per_day * DAYS_PER_YEAR,
        }
    }
}

/// Read CSV bytes (header row first) into a [`RawTable`].
///
/// Rows may be shorter or longer than the header; undecodable input is an
/// error for the whole request.
pub fn read_table(bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = rdr.headers()?.clone();
    let rows = rdr.records().collect::<std::result::Result<Vec<StringRecord>, _>>()?;
    debug!(columns = headers.len(), rows = rows.len(), "read billing export");
    Ok(RawTable::new(headers.iter(), rows))
}

/// First deployment alias present in the table.
pub fn resolve_deployment_column(table: &RawTable) -> Option<&'static str> {
    DEPLOYMENT_ALIASES
        .iter()
        .copied()
        .find(|alias| table.has_column(alias))
}

pub fn is_ram_hours(component: &str) -> bool {
    component.eq_ignore_ascii_case(RAM_HOURS)
}

/// Normalize every row of a billing export and keep the RAM-hour rows.
///
/// Bad cells fall back to defaults; this never fails.
pub fn normalize(table: &RawTable) -> (Vec<CanonicalRow>, LoadReport) {
    let deployment_column = resolve_deployment_column(table);
    let deployment_idx = deployment_column.and_then(|c| table.column_index(c));
    let sku_idx = table.column_index(SKU_NAME_COLUMN);
    let usage_idx = table.column_index(USAGE_TYPE_COLUMN);
    let price_idx = table.column_index(UNIT_PRICE_COLUMN);
    let total_idx = table.column_index(TOTAL_COLUMN);

    let mut rows = Vec::new();
    for raw in table.rows() {
        let component = table
            .cell(raw, usage_idx)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN);
        if !is_ram_hours(component) {
            continue;
        }

        // An empty cell in a present alias column stays empty; only a
        // missing alias column yields "Unknown".
        let deployment_name = match deployment_idx {
            Some(_) => table.cell(raw, deployment_idx).unwrap_or("").to_string(),
            None => UNKNOWN.to_string(),
        };

        let sku = match sku_idx {
            Some(_) => SkuAttributes::parse(table.cell(raw, sku_idx)),
            None => SkuAttributes::unknown(),
        };

        let cost = CostProjection::from_unit_price(table.cell(raw, price_idx));
        let total_cost_period = parse_number_or_default(table.cell(raw, total_idx), 0.0);

        rows.push(CanonicalRow {
            deployment_name,
            tier: sku.tier,
            sku_code_full: sku.sku_code_full,
            region: sku.region,
            provider: sku.provider,
            edition: sku.edition,
            sku_code: sku.sku_code,
            size_gb: sku.size_gb,
            number_of_nodes: sku.number_of_nodes,
            component: component.to_string(),
            cost_per_hour: cost.per_hour,
            cost_per_day: cost.per_day,
            cost_per_year: cost.per_year,
            total_cost_period,
        });
    }

    let report = LoadReport {
        total_rows: table.len(),
        kept_rows: rows.len(),
        deployment_column,
        has_sku_column: sku_idx.is_some(),
    };
    debug!(
        total = report.total_rows,
        kept = report.kept_rows,
        deployment_column = report.deployment_column.unwrap_or(DEPLOYMENT_COLUMN),
        sku = report.has_sku_column,
        "normalized billing rows"
    );
    (rows, report)
}

/// Read and normalize in one step.
pub fn load_and_normalize(bytes: &[u8]) -> Result<(Vec<CanonicalRow>, LoadReport)> {
    let table = read_table(bytes)?;
    Ok(normalize(&table))
}
