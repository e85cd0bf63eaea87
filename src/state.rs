use std::sync::Arc;

use crate::data::filter::{filtered_indices, DateRange, FilterSelection};
use crate::data::model::{Dimension, RetailDataset, TransactionRecord};
use crate::pipeline::DashboardSnapshot;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// One user's dashboard session, independent of rendering.
///
/// Every mutation recomputes the whole snapshot before returning, so callers
/// never see KPIs and views built from different selections.
pub struct DashboardState {
    /// Loaded dataset, shared with the cache.
    dataset: Arc<RetailDataset>,

    /// Current filter selections.
    selection: FilterSelection,

    /// Indices of rows passing the current filters (cached).
    visible_indices: Vec<usize>,

    /// KPIs and views for `selection`.
    snapshot: DashboardSnapshot,
}

impl DashboardState {
    /// Start a session over a loaded dataset with nothing filtered out.
    pub fn new(dataset: Arc<RetailDataset>) -> Self {
        let selection = FilterSelection::for_dataset(&dataset);
        let (visible_indices, snapshot) = summarize(&dataset, &selection);
        DashboardState {
            dataset,
            selection,
            visible_indices,
            snapshot,
        }
    }

    pub fn dataset(&self) -> &RetailDataset {
        &self.dataset
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn visible_indices(&self) -> &[usize] {
        &self.visible_indices
    }

    /// Replace the whole selection.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
        self.refilter();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.selection.date_range = range;
        self.refilter();
    }

    /// Recompute `visible_indices` and the snapshot after a filter change.
    pub fn refilter(&mut self) {
        if self.selection.date_range.is_reversed() {
            log::warn!(
                "Date range {} > {} selects nothing",
                self.selection.date_range.start,
                self.selection.date_range.end
            );
        }
        let (visible_indices, snapshot) = summarize(&self.dataset, &self.selection);
        self.visible_indices = visible_indices;
        self.snapshot = snapshot;
        log::debug!(
            "{} of {} rows visible",
            self.visible_indices.len(),
            self.dataset.len()
        );
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = self.selection.dimensions.entry(dim).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every offered value in a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        let all_vals = self.dataset.candidates(dim).clone();
        self.selection.dimensions.insert(dim, all_vals);
        self.refilter();
    }

    /// Clear a dimension's filter, which lifts its restriction.
    pub fn select_none(&mut self, dim: Dimension) {
        self.selection.dimensions.remove(&dim);
        self.refilter();
    }
}

fn summarize(
    dataset: &RetailDataset,
    selection: &FilterSelection,
) -> (Vec<usize>, DashboardSnapshot) {
    let indices = filtered_indices(dataset, selection);
    let rows: Vec<&TransactionRecord> = indices.iter().map(|&i| &dataset.records[i]).collect();
    let snapshot = DashboardSnapshot::from_filtered(selection.clone(), &rows);
    (indices, snapshot)
}
