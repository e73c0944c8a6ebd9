//! Gondola - supermarket category page collector
//!
//! Drives a browser through agent-browser to set a delivery postal code on a
//! storefront category page, walks the result pages, and extracts product
//! listings (title, price, link) along with extraction statistics.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, logging, and error handling
//! - **Browser**: `PageDriver` trait and the agent-browser executor
//! - **Locate**: Fallback cascades that find controls and product fields in
//!   page snapshots
//! - **Collector**: The linear workflow and its output files
//!
//! # Usage
//!
//! ```rust,no_run
//! use gondola::{BrowserExecutor, Collector, Config};
//!
//! #[tokio::main]
//! async fn main() -> gondola::Result<()> {
//!     let config = Config::load();
//!     let driver = BrowserExecutor::from_config(&config.browser);
//!     let mut collector = Collector::new(driver, config.clone());
//!
//!     let report = collector.run().await?;
//!     gondola::collector::save_report(&report, &config.output)?;
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod collector;
pub mod core;
pub mod locate;

// Re-export commonly used items
pub use browser::{BrowserExecutor, PageDriver};
pub use collector::Collector;
pub use core::{Config, GondolaError, Result};
