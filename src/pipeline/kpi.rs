use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::model::TransactionRecord;
use crate::format;

/// The four headline numbers above the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpi {
    pub total_sales: f64,
    pub units_sold: i64,
    pub oos_incidents: usize,
    pub store_count: usize,
}

impl Kpi {
    /// Summarise the filtered rows. Missing measures count as zero and
    /// missing store ids are not counted as a store.
    pub fn compute(filtered: &[&TransactionRecord]) -> Self {
        let mut stores = BTreeSet::new();
        let mut kpi = Kpi::default();

        for rec in filtered {
            kpi.total_sales += rec.sales_amount.unwrap_or(0.0);
            kpi.units_sold = kpi.units_sold.saturating_add(rec.sales_units.unwrap_or(0));
            if rec.is_out_of_stock() {
                kpi.oos_incidents += 1;
            }
            if let Some(store) = rec.store_id.as_deref() {
                stores.insert(store);
            }
        }
        kpi.store_count = stores.len();
        kpi
    }

    /// `(label, display value)` pairs in card order.
    pub fn cards(&self) -> [(&'static str, String); 4] {
        [
            ("Total Sales ($)", format::currency(self.total_sales)),
            ("Units Sold", format::units(self.units_sold as f64)),
            ("OOS Incidents", self.oos_incidents.to_string()),
            ("Stores", self.store_count.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        store: Option<&str>,
        amount: Option<f64>,
        units: Option<i64>,
        oos: Option<bool>,
    ) -> TransactionRecord {
        TransactionRecord {
            store_id: store.map(str::to_string),
            sales_amount: amount,
            sales_units: units,
            out_of_stock: oos,
            ..Default::default()
        }
    }

    #[test]
    fn sums_and_counts() {
        let records = [
            rec(Some("S1"), Some(1000.25), Some(3), Some(true)),
            rec(Some("S1"), None, Some(1200), Some(false)),
            rec(Some("S2"), Some(234.25), None, None),
            rec(None, Some(0.5), Some(2), Some(true)),
        ];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        let kpi = Kpi::compute(&refs);

        assert_eq!(kpi.total_sales, 1235.0);
        assert_eq!(kpi.units_sold, 1205);
        assert_eq!(kpi.oos_incidents, 2);
        assert_eq!(kpi.store_count, 2);

        let cards = kpi.cards();
        assert_eq!(cards[0].1, "$1,235.00");
        assert_eq!(cards[1].1, "1,205");
        assert_eq!(cards[2].1, "2");
        assert_eq!(cards[3].1, "2");
    }

    #[test]
    fn units_saturate_instead_of_wrapping() {
        let half = i64::MAX / 2 + 1;
        let records = [
            rec(Some("S1"), None, Some(half), None),
            rec(Some("S1"), None, Some(half), None),
        ];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        assert_eq!(Kpi::compute(&refs).units_sold, i64::MAX);
    }

    #[test]
    fn empty_selection_is_all_zero() {
        assert_eq!(Kpi::compute(&[]), Kpi::default());
        assert_eq!(Kpi::default().cards()[0].1, "$0.00");
    }
}
