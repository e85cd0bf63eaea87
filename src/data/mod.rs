//! Data layer: core types, loading, caching and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → RetailDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ RetailDataset │  Vec<TransactionRecord>, filter choices
//!   └──────────────┘        (held by cache across requests)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSelection → filtered rows
//!   └──────────┘
//! ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
