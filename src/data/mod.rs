/// Data layer: core types, loading, cleaning, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (raw)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  sentinels, coercion, group-median imputation
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  price range / manufacturer pair → row indices
///   └──────────┘
/// ```
///
/// `cache` memoizes the first two stages per file version and the last per
/// selection.
pub mod cache;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
