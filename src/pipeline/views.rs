use serde::Serialize;

use super::aggregate::{
    aggregate, Aggregate, AggregateTable, ColumnSpec, GroupKey, Measure, RowFilter, SortBy,
    SortOrder, Unit, ViewSpec,
};
use crate::data::model::{Dimension, TransactionRecord};

/// Stable identifier of each dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    MonthlySalesTrend,
    SalesByState,
    SalesByCity,
    SalesByZip,
    SalesByCategory,
    SalesByBrand,
    SalesByType,
    InventoryByState,
    OutOfStockByState,
    TopStores,
    BottomStores,
    StoreOutOfStockRate,
}

const STORE_RANK_LIMIT: usize = 10;

const SALES: &[ColumnSpec] = &[ColumnSpec::new(
    "Sales",
    Aggregate::Sum(Measure::SalesAmount),
    Unit::Currency,
)];

const INVENTORY: &[ColumnSpec] = &[
    ColumnSpec::new("On Hand Units", Aggregate::Sum(Measure::OnHandUnits), Unit::Units),
    ColumnSpec::new("Receipt Units", Aggregate::Sum(Measure::ReceiptUnits), Unit::Units),
];

const OOS_INCIDENTS: &[ColumnSpec] = &[ColumnSpec::new(
    "OOS Incidents",
    Aggregate::Count,
    Unit::Units,
)];

const STORE_TOTALS: &[ColumnSpec] = &[
    ColumnSpec::new("Sales", Aggregate::Sum(Measure::SalesAmount), Unit::Currency),
    ColumnSpec::new("Units Sold", Aggregate::Sum(Measure::SalesUnits), Unit::Units),
    ColumnSpec::new("OOS Incidents", Aggregate::Sum(Measure::OutOfStock), Unit::Units),
];

const STORE_OOS_RATE: &[ColumnSpec] = &[
    ColumnSpec::new("OOS Rate", Aggregate::Mean(Measure::OutOfStock), Unit::Percent).scaled(100.0),
    ColumnSpec::new("Sales", Aggregate::Sum(Measure::SalesAmount), Unit::Currency),
];

const fn by_sum(id: ViewId, title: &'static str, key: GroupKey) -> ViewSpec {
    ViewSpec {
        id,
        title,
        key,
        rows: RowFilter::All,
        columns: SALES,
        sort: None,
        limit: None,
    }
}

const fn ranked(
    id: ViewId,
    title: &'static str,
    columns: &'static [ColumnSpec],
    order: SortOrder,
) -> ViewSpec {
    ViewSpec {
        id,
        title,
        key: GroupKey::Store,
        rows: RowFilter::All,
        columns,
        sort: Some(SortBy { column: 0, order }),
        limit: Some(STORE_RANK_LIMIT),
    }
}

/// Every view on the dashboard, in display order.
pub const VIEWS: &[ViewSpec] = &[
    by_sum(ViewId::MonthlySalesTrend, "Monthly Sales Trend", GroupKey::Month),
    by_sum(ViewId::SalesByState, "Sales by State", GroupKey::Dimension(Dimension::State)),
    by_sum(ViewId::SalesByCity, "Sales by City", GroupKey::Dimension(Dimension::City)),
    by_sum(ViewId::SalesByZip, "Sales by ZIP Code", GroupKey::Dimension(Dimension::Zip)),
    by_sum(
        ViewId::SalesByCategory,
        "Sales by Product Category",
        GroupKey::Dimension(Dimension::Category),
    ),
    by_sum(ViewId::SalesByBrand, "Sales by Brand", GroupKey::Dimension(Dimension::Brand)),
    by_sum(ViewId::SalesByType, "Top Product Types", GroupKey::Dimension(Dimension::ProductType)),
    ViewSpec {
        id: ViewId::InventoryByState,
        title: "Inventory by State",
        key: GroupKey::Dimension(Dimension::State),
        rows: RowFilter::All,
        columns: INVENTORY,
        sort: None,
        limit: None,
    },
    ViewSpec {
        id: ViewId::OutOfStockByState,
        title: "OOS Incidents by State",
        key: GroupKey::Dimension(Dimension::State),
        rows: RowFilter::OutOfStockOnly,
        columns: OOS_INCIDENTS,
        sort: None,
        limit: None,
    },
    ranked(ViewId::TopStores, "Top 10 Stores by Sales", STORE_TOTALS, SortOrder::Descending),
    ranked(ViewId::BottomStores, "Bottom 10 Stores by Sales", STORE_TOTALS, SortOrder::Ascending),
    ranked(
        ViewId::StoreOutOfStockRate,
        "Top 10 Stores by OOS Rate",
        STORE_OOS_RATE,
        SortOrder::Descending,
    ),
];

/// Look up a view definition.
pub fn spec(id: ViewId) -> Option<&'static ViewSpec> {
    VIEWS.iter().find(|v| v.id == id)
}

/// Compute every view over the same filtered rows.
pub fn compute_views(filtered: &[&TransactionRecord]) -> Vec<AggregateTable> {
    VIEWS
        .iter()
        .map(|spec| aggregate(filtered.iter().copied(), spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn store_sale(store: usize, amount: f64, oos: bool) -> TransactionRecord {
        TransactionRecord {
            date: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            state: Some(if store % 2 == 0 { "CA" } else { "TX" }.to_string()),
            store_id: Some(format!("S{store:02}")),
            sales_amount: Some(amount),
            sales_units: Some(1),
            out_of_stock: Some(oos),
            ..Default::default()
        }
    }

    #[test]
    fn view_table_is_well_formed() {
        let ids: BTreeSet<ViewId> = VIEWS.iter().map(|v| v.id).collect();
        assert_eq!(ids.len(), VIEWS.len());
        for view in VIEWS {
            assert!(!view.columns.is_empty(), "{:?} has no columns", view.id);
            if let Some(sort) = view.sort {
                assert!(sort.column < view.columns.len(), "{:?} sorts past its columns", view.id);
            }
        }
        assert!(spec(ViewId::StoreOutOfStockRate).is_some());
    }

    #[test]
    fn every_view_is_empty_for_no_rows() {
        let tables = compute_views(&[]);
        assert_eq!(tables.len(), VIEWS.len());
        assert!(tables.iter().all(AggregateTable::is_empty));
    }

    #[test]
    fn store_rankings_take_ten() {
        let records: Vec<TransactionRecord> = (0..15)
            .map(|i| store_sale(i, i as f64 * 10.0, i % 3 == 0))
            .collect();
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        let tables = compute_views(&refs);
        let find = |id| tables.iter().find(|t| t.id == id).unwrap();

        let top = find(ViewId::TopStores);
        assert_eq!(top.rows.len(), 10);
        assert_eq!(top.rows[0].key, "S14");
        assert_eq!(top.rows[0].values, vec![140.0, 1.0, 0.0]);

        let bottom = find(ViewId::BottomStores);
        assert_eq!(bottom.rows[0].key, "S00");
        assert_eq!(bottom.rows[9].key, "S09");

        let rate = find(ViewId::StoreOutOfStockRate);
        assert_eq!(rate.rows.len(), 10);
        // Five stores are fully out of stock; they lead in key order.
        assert_eq!(&rate.keys()[..5], ["S00", "S03", "S06", "S09", "S12"]);
        assert_eq!(rate.rows[0].values, vec![100.0, 0.0]);
        assert_eq!(rate.rows[5].values[0], 0.0);
    }

    #[test]
    fn inventory_sums_both_measures() {
        let mut a = store_sale(0, 1.0, false);
        a.on_hand_units = Some(5);
        a.receipt_units = Some(2);
        let mut b = store_sale(2, 1.0, false);
        b.on_hand_units = Some(7);
        b.receipt_units = None;
        let tables = compute_views(&[&a, &b]);
        let inventory = tables.iter().find(|t| t.id == ViewId::InventoryByState).unwrap();
        assert_eq!(inventory.rows.len(), 1);
        assert_eq!(inventory.rows[0].values, vec![12.0, 2.0]);
    }
}
