use std::collections::BTreeSet;

use chrono::NaiveDate;
use retail_dashboard::pipeline::views::ViewId;
use retail_dashboard::{
    apply_filters, run, DateRange, Dimension, FilterSelection, RetailDataset, TransactionRecord,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn sale(state: &str, day: &str, amount: f64, oos: bool) -> TransactionRecord {
    TransactionRecord {
        date: Some(date(day)),
        state: Some(state.to_string()),
        store_id: Some(format!("{state}-1")),
        sales_amount: Some(amount),
        sales_units: Some(1),
        out_of_stock: Some(oos),
        ..Default::default()
    }
}

fn all_2024() -> DateRange {
    DateRange::new(date("2024-01-01"), date("2024-12-31"))
}

/// A larger dataset: 25 stores over four states and three months.
fn chain() -> RetailDataset {
    let states = ["CA", "TX", "NY", "WA"];
    let brands = ["Acme", "Zest", "Pulp"];
    let mut records = Vec::new();
    for store in 0..25u32 {
        for month in 1..=3u32 {
            for day in [3u32, 17] {
                records.push(TransactionRecord {
                    date: NaiveDate::from_ymd_opt(2024, month, day),
                    state: Some(states[store as usize % states.len()].to_string()),
                    city: Some(format!("City{}", store % 7)),
                    brand: Some(brands[(store + month) as usize % brands.len()].to_string()),
                    store_id: Some(format!("S{store:02}")),
                    sales_amount: Some(f64::from(store * 10 + month + day)),
                    sales_units: Some(i64::from(store % 4)),
                    on_hand_units: Some(10),
                    receipt_units: Some(2),
                    out_of_stock: Some((store + day) % 5 == 0),
                    ..Default::default()
                });
            }
        }
    }
    RetailDataset::from_records(records)
}

#[test]
fn three_record_scenario() {
    let ds = RetailDataset::from_records(vec![
        sale("CA", "2024-01-05", 10.0, false),
        sale("CA", "2024-02-10", 20.0, true),
        sale("TX", "2024-01-15", 5.0, false),
    ]);
    let sel = FilterSelection::new(all_2024()).with(Dimension::State, ["CA"]);
    let snap = run(&ds, &sel);

    assert_eq!(snap.row_count, 2);
    assert_eq!(snap.kpi.total_sales, 30.0);
    assert_eq!(snap.kpi.oos_incidents, 1);

    let trend = snap.view(ViewId::MonthlySalesTrend).unwrap();
    let rows: Vec<(&str, f64)> = trend
        .rows
        .iter()
        .map(|r| (r.key.as_str(), r.values[0]))
        .collect();
    assert_eq!(rows, [("2024-01", 10.0), ("2024-02", 20.0)]);
}

#[test]
fn kpi_matches_sales_by_state() {
    let ds = chain();
    for sel in [
        FilterSelection::new(all_2024()),
        FilterSelection::new(all_2024()).with(Dimension::Brand, ["Zest"]),
        FilterSelection::new(DateRange::new(date("2024-02-01"), date("2024-02-29"))),
    ] {
        let snap = run(&ds, &sel);
        let by_state = snap.view(ViewId::SalesByState).unwrap();
        assert_eq!(snap.kpi.total_sales, by_state.column_total(0));
    }
}

#[test]
fn values_within_a_dimension_are_a_union() {
    let ds = chain();
    let rows_for = |states: &[&str]| -> BTreeSet<usize> {
        let sel = FilterSelection::new(all_2024()).with(Dimension::State, states.iter().copied());
        apply_filters(&ds.records, &sel)
            .into_iter()
            .map(|r| ds.records.iter().position(|x| std::ptr::eq(x, r)).unwrap())
            .collect()
    };

    let ca = rows_for(&["CA"]);
    let tx = rows_for(&["TX"]);
    let both = rows_for(&["CA", "TX"]);
    assert!(!ca.is_empty() && !tx.is_empty());
    assert_eq!(ca.union(&tx).copied().collect::<BTreeSet<_>>(), both);
}

#[test]
fn selecting_every_choice_equals_no_filter() {
    let ds = chain();
    let unfiltered = run(&ds, &FilterSelection::new(all_2024()));
    for dim in [Dimension::State, Dimension::City, Dimension::Brand] {
        let everything = ds.candidates(dim).iter().cloned();
        let widened = run(&ds, &FilterSelection::new(all_2024()).with(dim, everything));
        assert_eq!(widened.row_count, unfiltered.row_count, "{dim}");
    }
}

#[test]
fn reversed_range_yields_empty_outputs() {
    let ds = chain();
    let sel = FilterSelection::new(DateRange::new(date("2024-03-01"), date("2024-01-01")));
    let snap = run(&ds, &sel);

    assert_eq!(snap.row_count, 0);
    assert_eq!(snap.kpi.total_sales, 0.0);
    assert_eq!(snap.kpi.units_sold, 0);
    assert_eq!(snap.kpi.oos_incidents, 0);
    assert_eq!(snap.kpi.store_count, 0);
    assert!(snap.views.iter().all(|v| v.is_empty()));
}

#[test]
fn top_and_bottom_stores_are_disjoint() {
    let ds = chain();
    let snap = run(&ds, &FilterSelection::new(all_2024()));
    assert_eq!(snap.kpi.store_count, 25);

    let top: BTreeSet<&str> = snap
        .view(ViewId::TopStores)
        .unwrap()
        .keys()
        .into_iter()
        .collect();
    let bottom: BTreeSet<&str> = snap
        .view(ViewId::BottomStores)
        .unwrap()
        .keys()
        .into_iter()
        .collect();
    assert_eq!(top.len(), 10);
    assert_eq!(bottom.len(), 10);
    assert!(top.is_disjoint(&bottom));
    assert_eq!(top.union(&bottom).count(), 20);
    assert!(top.contains("S24"));
    assert!(bottom.contains("S00"));
}

#[test]
fn oos_views_agree_with_kpi() {
    let ds = chain();
    let snap = run(&ds, &FilterSelection::new(all_2024()));

    let by_state = snap.view(ViewId::OutOfStockByState).unwrap();
    assert_eq!(by_state.column_total(0), snap.kpi.oos_incidents as f64);

    let rates = snap.view(ViewId::StoreOutOfStockRate).unwrap();
    assert_eq!(rates.rows.len(), 10);
    assert!(rates.rows.windows(2).all(|w| w[0].values[0] >= w[1].values[0]));
    assert!(rates.rows.iter().all(|r| (0.0..=100.0).contains(&r.values[0])));
}

#[test]
fn snapshot_serializes_to_json() {
    let ds = chain();
    let snap = run(&ds, &FilterSelection::new(all_2024()).with(Dimension::State, ["CA"]));
    let json = serde_json::to_value(&snap).unwrap();

    assert_eq!(json["selection"]["dimensions"]["state"][0], "CA");
    assert_eq!(json["views"][0]["id"], "monthly_sales_trend");
    assert_eq!(json["kpi"]["store_count"], 7);
}
