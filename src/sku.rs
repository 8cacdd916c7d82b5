//! Decomposition of the compound `SKU Name` code.
//!
//! A SKU name packs five `_`-separated dimensions,
//! `Tier_Provider.Edition.Code_Region_SizeMB_Nodes`, e.g.
//! `Standard_Azure.Postgres.General_eastus_65536_2`. Any part may be missing
//! or malformed; missing text parts become `"Unknown"` and missing numbers
//! become zero.

use crate::util::parse_f64_safe;

pub const UNKNOWN: &str = "Unknown";

/// Sizes above this many GB on a multi-node SKU are cluster totals and get
/// divided across nodes. Sizes at or below it are already per node.
///
/// Inferred from the shape of billing data rather than a documented rule;
/// revisit if the export format changes.
pub const PER_NODE_THRESHOLD_GB: f64 = 64.0;

const SKU_PARTS: usize = 5;

/// Structured view of one SKU name.
#[derive(Debug, Clone, PartialEq)]
pub struct SkuAttributes {
    pub tier: String,
    pub sku_code_full: String,
    pub region: String,
    pub provider: String,
    pub edition: String,
    pub sku_code: String,
    pub size_gb: u64,
    pub number_of_nodes: u64,
}

impl SkuAttributes {
    /// Attributes for an export without any `SKU Name` column.
    pub fn unknown() -> Self {
        Self {
            tier: UNKNOWN.to_string(),
            sku_code_full: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            provider: UNKNOWN.to_string(),
            edition: UNKNOWN.to_string(),
            sku_code: UNKNOWN.to_string(),
            size_gb: 0,
            number_of_nodes: 0,
        }
    }

    /// Decompose one `SKU Name` cell. Never fails.
    pub fn parse(sku_name: Option<&str>) -> Self {
        let sku_name = sku_name.map(str::trim).filter(|s| !s.is_empty());

        // At most five parts; anything after the fifth `_` stays in the last.
        let mut parts = sku_name
            .map(|s| s.splitn(SKU_PARTS, '_').collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();
        let tier = parts.next();
        let sku_code_full = parts.next();
        let region = parts.next();
        let size_mb = parse_f64_safe(parts.next());
        let nodes = parse_f64_safe(parts.next());

        let (provider, edition, sku_code) = split_code(sku_code_full);
        let (size_gb, number_of_nodes) = derive_size(size_mb, nodes);

        Self {
            tier: or_unknown(tier),
            sku_code_full: or_unknown(sku_code_full),
            region: or_unknown(region),
            provider,
            edition,
            sku_code,
            size_gb,
            number_of_nodes,
        }
    }
}

fn or_unknown(part: Option<&str>) -> String {
    part.unwrap_or(UNKNOWN).to_string()
}

/// Split `Provider.Edition.Code`; the code keeps any further dots.
fn split_code(full: Option<&str>) -> (String, String, String) {
    let mut segments = full.map(|f| f.splitn(3, '.')).into_iter().flatten();
    let provider = or_unknown(segments.next());
    let edition = or_unknown(segments.next());
    let sku_code = segments
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string();
    (provider, edition, sku_code)
}

/// Size in whole GB per node plus the node count.
pub fn derive_size(size_mb: Option<f64>, nodes: Option<f64>) -> (u64, u64) {
    let mut size_gb = size_mb.unwrap_or(0.0) / 1024.0;
    let nodes = nodes.unwrap_or(0.0).trunc().max(0.0);

    if size_gb > PER_NODE_THRESHOLD_GB && nodes > 0.0 {
        size_gb /= nodes;
    }

    (size_gb.round_ties_even().max(0.0) as u64, nodes as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sku_decomposition() {
        let sku = SkuAttributes::parse(Some("Standard_Azure.Postgres.General_eastus_65536_2"));
        assert_eq!(sku.tier, "Standard");
        assert_eq!(sku.sku_code_full, "Azure.Postgres.General");
        assert_eq!(sku.region, "eastus");
        assert_eq!(sku.provider, "Azure");
        assert_eq!(sku.edition, "Postgres");
        assert_eq!(sku.sku_code, "General");
        // 64 GB is not above the threshold, so it stays as-is.
        assert_eq!(sku.size_gb, 64);
        assert_eq!(sku.number_of_nodes, 2);
    }

    #[test]
    fn test_extra_underscores_stay_in_last_part() {
        let sku = SkuAttributes::parse(Some("Gold_AWS.Redis.Cache_us-east-1_2048_3_extra"));
        assert_eq!(sku.region, "us-east-1");
        // "3_extra" is not a number.
        assert_eq!(sku.number_of_nodes, 0);
        assert_eq!(sku.size_gb, 2);
    }

    #[test]
    fn test_sku_code_keeps_further_dots() {
        let sku = SkuAttributes::parse(Some("Std_GCP.Mysql.N2.Highmem_europe-west1_4096_1"));
        assert_eq!(sku.provider, "GCP");
        assert_eq!(sku.edition, "Mysql");
        assert_eq!(sku.sku_code, "N2.Highmem");
    }

    #[test]
    fn test_short_sku_defaults() {
        let sku = SkuAttributes::parse(Some("Basic_Azure"));
        assert_eq!(sku.tier, "Basic");
        assert_eq!(sku.provider, "Azure");
        assert_eq!(sku.edition, UNKNOWN);
        assert_eq!(sku.sku_code, UNKNOWN);
        assert_eq!(sku.region, UNKNOWN);
        assert_eq!(sku.size_gb, 0);
        assert_eq!(sku.number_of_nodes, 0);

        let sku = SkuAttributes::parse(Some("Basic_Azure.Redis._westus"));
        assert_eq!(sku.sku_code, UNKNOWN);
    }

    #[test]
    fn test_empty_cell_is_unknown() {
        assert_eq!(SkuAttributes::parse(Some("   ")), SkuAttributes::unknown());
        assert_eq!(SkuAttributes::parse(None), SkuAttributes::unknown());
    }

    #[test]
    fn test_per_node_rule() {
        // 128 GB over 4 nodes
        assert_eq!(derive_size(Some(131072.0), Some(4.0)), (32, 4));
        // 32 GB, no nodes: untouched
        assert_eq!(derive_size(Some(32768.0), Some(0.0)), (32, 0));
        // 128 GB without nodes stays a total
        assert_eq!(derive_size(Some(131072.0), None), (128, 0));
        // fractional node counts are truncated before dividing
        assert_eq!(derive_size(Some(131072.0), Some(2.9)), (64, 2));
    }

    #[test]
    fn test_size_rounds_half_to_even() {
        // 2.5 GB
        assert_eq!(derive_size(Some(2560.0), Some(1.0)), (2, 1));
        // 3.5 GB
        assert_eq!(derive_size(Some(3584.0), Some(1.0)), (4, 1));
    }

    #[test]
    fn test_negative_numbers_clamp_to_zero() {
        assert_eq!(derive_size(Some(-4096.0), Some(-3.0)), (0, 0));
    }
}
