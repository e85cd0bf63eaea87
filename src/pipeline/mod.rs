//! Filter-and-aggregate pipeline: one selection in, one complete snapshot out.
//!
//! ```text
//!   filtered rows ──┬──▶ kpi        four headline numbers
//!                   └──▶ views      VIEWS table → aggregate() per row
//! ```

pub mod aggregate;
pub mod kpi;
pub mod views;

use serde::Serialize;

use crate::data::filter::{apply_filters, FilterSelection};
use crate::data::model::{RetailDataset, TransactionRecord};
use aggregate::AggregateTable;
use kpi::Kpi;
use views::{compute_views, ViewId};

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub selection: FilterSelection,
    pub row_count: usize,
    pub kpi: Kpi,
    pub views: Vec<AggregateTable>,
}

impl DashboardSnapshot {
    /// Build KPIs and every view from the same filtered rows.
    pub fn from_filtered(selection: FilterSelection, filtered: &[&TransactionRecord]) -> Self {
        DashboardSnapshot {
            selection,
            row_count: filtered.len(),
            kpi: Kpi::compute(filtered),
            views: compute_views(filtered),
        }
    }

    pub fn view(&self, id: ViewId) -> Option<&AggregateTable> {
        self.views.iter().find(|v| v.id == id)
    }
}

/// Filter `dataset` by `selection` and summarise the result.
pub fn run(dataset: &RetailDataset, selection: &FilterSelection) -> DashboardSnapshot {
    let filtered = apply_filters(&dataset.records, selection);
    DashboardSnapshot::from_filtered(selection.clone(), &filtered)
}
