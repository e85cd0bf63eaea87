pub mod data;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod report;
pub mod state;

pub use data::filter::{apply_filters, DateRange, FilterSelection};
pub use data::model::{Dimension, RetailDataset, TransactionRecord};
pub use pipeline::{run, DashboardSnapshot};
