use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

// ---------------------------------------------------------------------------
// Dimension – the six categorical filter axes
// ---------------------------------------------------------------------------

/// A categorical column the dashboard can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    State,
    City,
    Zip,
    Category,
    Brand,
    ProductType,
}

impl Dimension {
    /// Every dimension, in sidebar order.
    pub const ALL: [Dimension; 6] = [
        Dimension::State,
        Dimension::City,
        Dimension::Zip,
        Dimension::Category,
        Dimension::Brand,
        Dimension::ProductType,
    ];

    /// Read this dimension's value from a record.
    pub fn value<'a>(&self, record: &'a TransactionRecord) -> Option<&'a str> {
        let field = match self {
            Dimension::State => &record.state,
            Dimension::City => &record.city,
            Dimension::Zip => &record.zip,
            Dimension::Category => &record.category,
            Dimension::Brand => &record.brand,
            Dimension::ProductType => &record.product_type,
        };
        field.as_deref()
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::State => "State",
            Dimension::City => "City",
            Dimension::Zip => "ZIP Code",
            Dimension::Category => "Category",
            Dimension::Brand => "Brand",
            Dimension::ProductType => "Product Type",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Dimension {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "state" => Ok(Dimension::State),
            "city" => Ok(Dimension::City),
            "zip" | "zip_code" => Ok(Dimension::Zip),
            "category" => Ok(Dimension::Category),
            "brand" => Ok(Dimension::Brand),
            "type" | "product_type" => Ok(Dimension::ProductType),
            _ => Err(SelectionError::UnknownDimension(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionRecord – one row of the POS table
// ---------------------------------------------------------------------------

/// A single point-of-sale line.
///
/// Every field is optional: a blank cell in the source becomes `None`.
/// Missing measures count as zero when summed; a missing date never
/// falls inside a date filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: Option<NaiveDate>,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Kept as text so leading zeros survive.
    pub zip: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub store_id: Option<String>,
    pub sales_amount: Option<f64>,
    pub sales_units: Option<i64>,
    pub on_hand_units: Option<i64>,
    pub receipt_units: Option<i64>,
    pub out_of_stock: Option<bool>,
}

impl TransactionRecord {
    /// `YYYY-MM` label of the sale date.
    pub fn month_label(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m").to_string())
    }

    /// Whether a stock-out was recorded on this row.
    pub fn is_out_of_stock(&self) -> bool {
        self.out_of_stock == Some(true)
    }
}

// ---------------------------------------------------------------------------
// RetailDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed filter choices.
#[derive(Debug, Clone, Default)]
pub struct RetailDataset {
    /// All rows, in source order.
    pub records: Vec<TransactionRecord>,
    /// Distinct non-missing values per dimension, indexed by `Dimension`.
    candidates: [BTreeSet<String>; 6],
    /// Earliest and latest non-missing sale date.
    date_span: Option<(NaiveDate, NaiveDate)>,
}

impl RetailDataset {
    /// Build the choice lists and date span from the loaded rows.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut candidates: [BTreeSet<String>; 6] = Default::default();
        let mut date_span: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            for dim in Dimension::ALL {
                if let Some(val) = dim.value(rec) {
                    candidates[dim.index()].insert(val.to_string());
                }
            }
            if let Some(date) = rec.date {
                date_span = Some(match date_span {
                    Some((lo, hi)) => (lo.min(date), hi.max(date)),
                    None => (date, date),
                });
            }
        }

        RetailDataset {
            records,
            candidates,
            date_span,
        }
    }

    /// Filter choices offered for a dimension. Missing values are never listed.
    pub fn candidates(&self, dim: Dimension) -> &BTreeSet<String> {
        &self.candidates[dim.index()]
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
