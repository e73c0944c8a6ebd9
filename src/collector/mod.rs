//! Collector module - the end-to-end run
//!
//! Contains the page workflow and the writers for its result files.

pub mod output;
pub mod workflow;

pub use output::{save_report, write_products, write_stats};
pub use workflow::Collector;
