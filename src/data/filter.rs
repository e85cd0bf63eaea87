use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::{Dimension, RetailDataset, TransactionRecord};
use crate::error::SelectionError;

// ---------------------------------------------------------------------------
// Date interval
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` date interval. A reversed interval is kept as
/// given and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Build an interval from the list a date picker hands back.
    ///
    /// One date means a single-day interval; anything other than one or
    /// two dates is rejected.
    pub fn from_bounds(bounds: &[NaiveDate]) -> Result<Self, SelectionError> {
        match *bounds {
            [day] => Ok(DateRange::new(day, day)),
            [start, end] => Ok(DateRange::new(start, end)),
            _ => Err(SelectionError::MalformedDateRange(bounds.len())),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }
}

// ---------------------------------------------------------------------------
// Filter selection: which values are allowed per dimension
// ---------------------------------------------------------------------------

/// One request's worth of filters.
///
/// A dimension that is absent from `dimensions`, or mapped to an empty set,
/// is unrestricted. The date interval always applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub dimensions: BTreeMap<Dimension, BTreeSet<String>>,
    pub date_range: DateRange,
}

impl FilterSelection {
    /// No categorical restriction, only the given dates.
    pub fn new(date_range: DateRange) -> Self {
        FilterSelection {
            dimensions: BTreeMap::new(),
            date_range,
        }
    }

    /// The default selection for a dataset: everything, over its full date span.
    pub fn for_dataset(dataset: &RetailDataset) -> Self {
        let range = match dataset.date_span() {
            Some((start, end)) => DateRange::new(start, end),
            None => DateRange::new(NaiveDate::MIN, NaiveDate::MAX),
        };
        FilterSelection::new(range)
    }

    /// Allow `values` for `dim`, replacing any previous choice.
    pub fn with<I, S>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions
            .insert(dim, values.into_iter().map(Into::into).collect());
        self
    }

    /// The active restriction for `dim`, or `None` when every value passes.
    pub fn allowed(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.dimensions.get(&dim).filter(|set| !set.is_empty())
    }

    /// Whether a record passes every dimension and the date interval.
    ///
    /// A record missing a value only fails a dimension that is actively
    /// restricted.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let dims_pass = Dimension::ALL.iter().all(|&dim| match self.allowed(dim) {
            None => true,
            Some(allowed) => dim.value(record).is_some_and(|v| allowed.contains(v)),
        });
        dims_pass && record.date.is_some_and(|d| self.date_range.contains(d))
    }
}

/// Restrict `records` to those passing `selection`, keeping source order.
pub fn apply_filters<'a>(
    records: &'a [TransactionRecord],
    selection: &FilterSelection,
) -> Vec<&'a TransactionRecord> {
    records.iter().filter(|rec| selection.matches(rec)).collect()
}

/// Return indices of rows that pass all active filters.
pub fn filtered_indices(dataset: &RetailDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn rec(state: Option<&str>, brand: Option<&str>, day: &str) -> TransactionRecord {
        TransactionRecord {
            date: Some(date(day)),
            state: state.map(str::to_string),
            brand: brand.map(str::to_string),
            ..Default::default()
        }
    }

    fn january() -> DateRange {
        DateRange::new(date("2024-01-01"), date("2024-01-31"))
    }

    #[test]
    fn empty_set_means_no_restriction() {
        let records = vec![
            rec(Some("CA"), None, "2024-01-02"),
            rec(Some("TX"), None, "2024-01-03"),
        ];
        let sel = FilterSelection::new(january()).with(Dimension::State, Vec::<String>::new());

        assert_eq!(apply_filters(&records, &sel).len(), 2);
        assert!(sel.allowed(Dimension::State).is_none());
    }

    #[test]
    fn missing_value_passes_only_unrestricted_dimensions() {
        let records = vec![
            rec(None, Some("Acme"), "2024-01-02"),
            rec(Some("CA"), Some("Acme"), "2024-01-03"),
        ];

        let by_brand = FilterSelection::new(january()).with(Dimension::Brand, ["Acme"]);
        assert_eq!(apply_filters(&records, &by_brand).len(), 2);

        let by_state = FilterSelection::new(january()).with(Dimension::State, ["CA"]);
        let kept = apply_filters(&records, &by_state);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].state.as_deref(), Some("CA"));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let records = vec![
            rec(Some("CA"), Some("Acme"), "2024-01-02"),
            rec(Some("CA"), Some("Zest"), "2024-01-02"),
            rec(Some("TX"), Some("Acme"), "2024-01-02"),
        ];
        let sel = FilterSelection::new(january())
            .with(Dimension::State, ["CA"])
            .with(Dimension::Brand, ["Acme"]);
        assert_eq!(apply_filters(&records, &sel), vec![&records[0]]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let records = vec![
            rec(None, None, "2023-12-31"),
            rec(None, None, "2024-01-01"),
            rec(None, None, "2024-01-31"),
            rec(None, None, "2024-02-01"),
            TransactionRecord::default(),
        ];
        let sel = FilterSelection::new(january());
        let ds = RetailDataset::from_records(records);
        assert_eq!(filtered_indices(&ds, &sel), vec![1, 2]);
    }

    #[test]
    fn reversed_range_matches_nothing() {
        let records = vec![rec(Some("CA"), None, "2024-01-15")];
        let range = DateRange::new(date("2024-01-31"), date("2024-01-01"));
        assert!(range.is_reversed());
        assert!(apply_filters(&records, &FilterSelection::new(range)).is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let records = vec![
            rec(Some("TX"), None, "2024-01-09"),
            rec(Some("CA"), None, "2024-01-01"),
            rec(Some("TX"), None, "2024-01-05"),
        ];
        let ds = RetailDataset::from_records(records);
        let sel = FilterSelection::new(january()).with(Dimension::State, ["TX"]);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);
    }

    #[test]
    fn date_range_from_picker_bounds() {
        let a = date("2024-01-01");
        let b = date("2024-02-01");
        assert_eq!(DateRange::from_bounds(&[a, b]).unwrap(), DateRange::new(a, b));
        assert_eq!(DateRange::from_bounds(&[b]).unwrap(), DateRange::new(b, b));
        assert_eq!(
            DateRange::from_bounds(&[]),
            Err(SelectionError::MalformedDateRange(0))
        );
        assert_eq!(
            DateRange::from_bounds(&[a, b, b]),
            Err(SelectionError::MalformedDateRange(3))
        );
    }

    #[test]
    fn default_selection_spans_dataset() {
        let ds = RetailDataset::from_records(vec![
            rec(None, None, "2024-01-10"),
            rec(None, None, "2024-03-02"),
        ]);
        let sel = FilterSelection::for_dataset(&ds);
        assert_eq!(sel.date_range, DateRange::new(date("2024-01-10"), date("2024-03-02")));
        assert_eq!(filtered_indices(&ds, &sel).len(), 2);
    }
}
