use std::collections::BTreeMap;

use serde::Serialize;

use super::views::ViewId;
use crate::data::model::{Dimension, TransactionRecord};

// ---------------------------------------------------------------------------
// View building blocks
// ---------------------------------------------------------------------------

/// What a view groups rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Calendar month of the sale date, rendered `YYYY-MM`.
    Month,
    Dimension(Dimension),
    Store,
}

impl GroupKey {
    /// The group a record falls into; `None` keeps it out of every group.
    pub fn extract(&self, record: &TransactionRecord) -> Option<String> {
        match self {
            GroupKey::Month => record.month_label(),
            GroupKey::Dimension(dim) => dim.value(record).map(str::to_string),
            GroupKey::Store => record.store_id.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupKey::Month => "Month",
            GroupKey::Dimension(dim) => dim.label(),
            GroupKey::Store => "Store",
        }
    }
}

/// A numeric field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    SalesAmount,
    SalesUnits,
    OnHandUnits,
    ReceiptUnits,
    /// The stock-out flag read as 0 or 1.
    OutOfStock,
}

impl Measure {
    pub fn value(&self, record: &TransactionRecord) -> Option<f64> {
        match self {
            Measure::SalesAmount => record.sales_amount,
            Measure::SalesUnits => record.sales_units.map(|u| u as f64),
            Measure::OnHandUnits => record.on_hand_units.map(|u| u as f64),
            Measure::ReceiptUnits => record.receipt_units.map(|u| u as f64),
            Measure::OutOfStock => record.out_of_stock.map(|f| if f { 1.0 } else { 0.0 }),
        }
    }
}

/// Per-group aggregation verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Missing values count as zero.
    Sum(Measure),
    /// Average over the rows where the measure is present.
    Mean(Measure),
    /// Number of rows in the group.
    Count,
}

/// How a column's values should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Currency,
    Units,
    Percent,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aggregate: Aggregate,
    /// Applied to the finished value, e.g. 100.0 to turn a rate into a percentage.
    pub scale: f64,
    pub unit: Unit,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, aggregate: Aggregate, unit: Unit) -> Self {
        ColumnSpec {
            name,
            aggregate,
            scale: 1.0,
            unit,
        }
    }

    pub const fn scaled(self, scale: f64) -> Self {
        ColumnSpec { scale, ..self }
    }
}

/// Which rows a view looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
    All,
    OutOfStockOnly,
}

impl RowFilter {
    fn admits(&self, record: &TransactionRecord) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::OutOfStockOnly => record.is_out_of_stock(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Stable sort on one column's value.
#[derive(Debug, Clone, Copy)]
pub struct SortBy {
    pub column: usize,
    pub order: SortOrder,
}

/// One row of the declarative view table.
#[derive(Debug, Clone, Copy)]
pub struct ViewSpec {
    pub id: ViewId,
    pub title: &'static str,
    pub key: GroupKey,
    pub rows: RowFilter,
    pub columns: &'static [ColumnSpec],
    pub sort: Option<SortBy>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Output table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub name: &'static str,
    pub unit: Unit,
}

/// A grouped summary: one row per distinct group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub id: ViewId,
    pub title: &'static str,
    pub key_label: &'static str,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Sum of one column over every row.
    pub fn column_total(&self, column: usize) -> f64 {
        self.rows.iter().filter_map(|r| r.values.get(column)).sum()
    }

    /// Value of `column` for the row keyed `key`.
    pub fn value(&self, key: &str, column: usize) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key == key)
            .and_then(|r| r.values.get(column).copied())
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, aggregate: Aggregate, record: &TransactionRecord) {
        match aggregate {
            Aggregate::Sum(measure) => self.sum += measure.value(record).unwrap_or(0.0),
            Aggregate::Mean(measure) => {
                if let Some(v) = measure.value(record) {
                    self.sum += v;
                    self.count += 1;
                }
            }
            Aggregate::Count => self.count += 1,
        }
    }

    fn finish(&self, aggregate: Aggregate) -> f64 {
        match aggregate {
            Aggregate::Sum(_) => self.sum,
            Aggregate::Mean(_) if self.count == 0 => 0.0,
            Aggregate::Mean(_) => self.sum / self.count as f64,
            Aggregate::Count => self.count as f64,
        }
    }
}

/// Group `records` per `spec` and reduce each group to one row.
///
/// Groups come out in ascending key order; a spec with a sort applies a
/// stable sort on top of that, so ties keep key order. An empty input gives
/// an empty table.
pub fn aggregate<'a, I>(records: I, spec: &ViewSpec) -> AggregateTable
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut groups: BTreeMap<String, Vec<Accumulator>> = BTreeMap::new();

    for record in records {
        if !spec.rows.admits(record) {
            continue;
        }
        let Some(key) = spec.key.extract(record) else {
            continue;
        };
        let accs = groups
            .entry(key)
            .or_insert_with(|| vec![Accumulator::default(); spec.columns.len()]);
        for (acc, col) in accs.iter_mut().zip(spec.columns) {
            acc.push(col.aggregate, record);
        }
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, accs)| AggregateRow {
            key,
            values: accs
                .iter()
                .zip(spec.columns)
                .map(|(acc, col)| acc.finish(col.aggregate) * col.scale)
                .collect(),
        })
        .collect();

    if let Some(sort) = spec.sort {
        rows.sort_by(|a, b| {
            let ord = a.values[sort.column].total_cmp(&b.values[sort.column]);
            match sort.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
    }
    if let Some(limit) = spec.limit {
        rows.truncate(limit);
    }

    AggregateTable {
        id: spec.id,
        title: spec.title,
        key_label: spec.key.label(),
        columns: spec
            .columns
            .iter()
            .map(|c| TableColumn {
                name: c.name,
                unit: c.unit,
            })
            .collect(),
        rows,
    }
}
