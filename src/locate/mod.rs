//! Element location on page snapshots
//!
//! Every lookup here is a cascade: exact site selectors first, then looser
//! attribute and text heuristics. Nothing in this module talks to the browser.

pub mod controls;
pub mod dom;
pub mod pagination;
pub mod products;

pub use controls::{Located, Strategy};
pub use dom::Page;
pub use pagination::{estimate_total_pages, Estimate, EstimateMethod};
pub use products::ProductExtractor;
