//! Browser automation module
//!
//! Wraps agent-browser CLI for web automation.

mod driver;
mod executor;

pub use driver::{hide_elements_script, PageDriver, OUTER_HTML_SCRIPT};
pub use executor::{extract_eval_result, BrowserExecutor};
