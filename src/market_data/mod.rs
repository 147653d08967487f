pub mod history;
pub mod merge;

// Re-export for convenient access (e.g. `use crate::market_data::History`).
pub use history::{History, HistoryError, HistoryPoint};
pub use merge::merge;
