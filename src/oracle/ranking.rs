//! Wealth percentile band and the oracle's confidence phrase.

use super::reference::{PERCENTILE_ORDER, WealthTable};

const NO_TABLE_BAND: &str = "Top 20% - Comfortable";
const BOTTOM_BAND: &str = "Bottom 50%";

/// Place a lifetime net worth into a global percentile band.
///
/// The figure is scaled by the table's multiplier for `country` (1.0 when
/// absent) and checked against each band's threshold, richest first.
pub fn rank_band(table: &WealthTable, net_worth: f64, country: &str) -> String {
    let percentiles = &table.global_wealth_percentiles;
    if percentiles.is_empty() {
        return NO_TABLE_BAND.to_string();
    }

    let multiplier = table.country_multipliers.get(country).copied().unwrap_or(1.0);
    let adjusted = net_worth * multiplier;

    PERCENTILE_ORDER
        .iter()
        .filter_map(|key| percentiles.get(*key))
        .find(|band| adjusted >= band.min_nw)
        .or_else(|| percentiles.get("bottom_50"))
        .map_or_else(|| BOTTOM_BAND.to_string(), |band| band.label.clone())
}

pub fn oracle_confidence(probability: f64) -> &'static str {
    if probability >= 0.8 {
        "The stars align powerfully in your favor"
    } else if probability >= 0.6 {
        "The cosmic forces show strong promise"
    } else if probability >= 0.4 {
        "The universe whispers of potential"
    } else if probability >= 0.2 {
        "A challenging but possible path lies ahead"
    } else {
        "The journey requires extraordinary determination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::reference::PercentileBand;

    #[test]
    fn builtin_bands() {
        let table = WealthTable::builtin();
        assert_eq!(
            rank_band(&table, 60_000_000.0, "USA"),
            "Top 0.1% - Ultra High Net Worth"
        );
        assert_eq!(rank_band(&table, 1_000_000.0, "USA"), "Top 5% - Millionaire");
        assert_eq!(rank_band(&table, 10.0, "USA"), "Bottom 50% - Building Wealth");
    }

    #[test]
    fn country_multiplier_scales_net_worth() {
        let mut table = WealthTable::builtin();
        table.country_multipliers.insert("India".into(), 5.0);
        assert_eq!(rank_band(&table, 1_000_000.0, "India"), "Top 1% - Elite Wealth");
        // Exact key match only.
        assert_eq!(rank_band(&table, 1_000_000.0, "india"), "Top 5% - Millionaire");
    }

    #[test]
    fn sparse_table() {
        let mut table = WealthTable::default();
        assert_eq!(rank_band(&table, 1.0, "USA"), "Top 20% - Comfortable");

        table.global_wealth_percentiles.insert(
            "top_1".into(),
            PercentileBand {
                min_nw: 1_000_000.0,
                label: "Top 1%".into(),
            },
        );
        assert_eq!(rank_band(&table, 2_000_000.0, "USA"), "Top 1%");
        assert_eq!(rank_band(&table, 10.0, "USA"), "Bottom 50%");
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(oracle_confidence(0.8), "The stars align powerfully in your favor");
        assert_eq!(oracle_confidence(0.65), "The cosmic forces show strong promise");
        assert_eq!(oracle_confidence(0.4), "The universe whispers of potential");
        assert_eq!(oracle_confidence(0.25), "A challenging but possible path lies ahead");
        assert_eq!(
            oracle_confidence(0.1),
            "The journey requires extraordinary determination"
        );
    }
}
