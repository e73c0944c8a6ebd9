//! Result files
//!
//! Products and statistics are written as pretty-printed UTF-8 JSON.

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::core::config::OutputConfig;
use crate::core::{CollectionReport, GondolaError, PageStats, Product, Result};

/// Write the product list
pub fn write_products(path: &Path, products: &[Product]) -> Result<()> {
    debug!(count = products.len(), path = %path.display(), "saving products");
    write_json(path, products)
}

/// Write the statistics summed over all pages
pub fn write_stats(path: &Path, stats: &PageStats) -> Result<()> {
    debug!(path = %path.display(), "saving stats");
    write_json(path, stats)
}

/// Write both files for a finished run and log the totals
pub fn save_report(report: &CollectionReport, output: &OutputConfig) -> Result<PageStats> {
    let products = report.products();
    let totals = report.totals();

    write_products(&output.products_path, &products)?;
    write_stats(&output.stats_path, &totals)?;

    info!(
        collected = products.len(),
        found = totals.total,
        missing_title = totals.missing_title,
        missing_price = totals.missing_price,
        missing_link = totals.missing_link,
        complete = totals.complete,
        "collection finished"
    );

    Ok(totals)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)
        .map_err(|e| GondolaError::with_context(format!("Failed to write {}", path.display()), e))
}
