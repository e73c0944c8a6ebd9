//! Shared types used across Gondola modules
//!
//! Contains product records, collection statistics, and the page controls
//! the locators look for.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// A product listing extracted from a results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Sequential identifier, unique within one run
    pub id: u64,
    /// Product title with whitespace collapsed
    pub title: String,
    /// Price as shown on the card, e.g. "R$ 12,99"
    pub price: String,
    /// Absolute product page URL, if the card had a link
    pub link: Option<String>,
}

/// Extraction counters for one page, or summed across pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStats {
    /// Number of product cards found
    pub total: usize,
    /// Cards where no title element was found
    pub missing_title: usize,
    /// Cards where no price element was found
    pub missing_price: usize,
    /// Cards where no link element was found
    pub missing_link: usize,
    /// Cards that produced a complete product record
    pub complete: usize,
}

impl Add for PageStats {
    type Output = PageStats;

    fn add(mut self, rhs: PageStats) -> PageStats {
        self += rhs;
        self
    }
}

impl AddAssign for PageStats {
    fn add_assign(&mut self, rhs: PageStats) {
        self.total += rhs.total;
        self.missing_title += rhs.missing_title;
        self.missing_price += rhs.missing_price;
        self.missing_link += rhs.missing_link;
        self.complete += rhs.complete;
    }
}

impl std::iter::Sum for PageStats {
    fn sum<I: Iterator<Item = PageStats>>(iter: I) -> Self {
        iter.fold(PageStats::default(), Add::add)
    }
}

/// Products and statistics collected from a single results page
#[derive(Debug, Clone, Default)]
pub struct PageResult {
    /// 1-based page number
    pub page: usize,
    /// Complete product records
    pub products: Vec<Product>,
    /// Extraction counters
    pub stats: PageStats,
}

/// Everything collected during one run
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    /// Total pages the run planned to visit
    pub total_pages: usize,
    /// Per-page results in visiting order
    pub pages: Vec<PageResult>,
}

impl CollectionReport {
    /// All products across pages, in page order
    pub fn products(&self) -> Vec<Product> {
        self.pages
            .iter()
            .flat_map(|p| p.products.iter().cloned())
            .collect()
    }

    /// Statistics summed over every page
    pub fn totals(&self) -> PageStats {
        self.pages.iter().map(|p| p.stats).sum()
    }
}

/// UI controls located on the storefront page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Button that opens the postal code modal
    PostalCodeButton,
    /// Text field for the postal code
    PostalCodeInput,
    /// Button that confirms the postal code
    SubmitButton,
    /// Floating chat widget covering the page
    ChatWidget,
    /// Button that opens the products-per-page menu
    PageSizeControl,
    /// Menu entry for the desired page size
    PageSizeOption,
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Control::PostalCodeButton => write!(f, "postal code button"),
            Control::PostalCodeInput => write!(f, "postal code input"),
            Control::SubmitButton => write!(f, "submit button"),
            Control::ChatWidget => write!(f, "chat widget"),
            Control::PageSizeControl => write!(f, "page size control"),
            Control::PageSizeOption => write!(f, "page size option"),
        }
    }
}
