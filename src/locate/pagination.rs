//! Page count estimation
//!
//! The results page does not expose its page count in one reliable place, so
//! several indicators are tried in order of trust.

use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::locate::dom::{self, Page};

static PAGES_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)de\s+(\d[\d.]*)\s+páginas").expect("valid regex"));

static PAGE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)página\s+\d+\s+de\s+(\d[\d.]*)").expect("valid regex"));

static PRODUCTS_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)de\s+(\d[\d.]*)\s+produtos").expect("valid regex"));

static PRODUCTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d.]*)\s+produtos").expect("valid regex"));

static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"page=(\d+)").expect("valid regex"));

const PAGINATION_CONTAINERS: &[&str] = &[
    r#"[data-testid="pagination"]"#,
    ".pagination",
    r#"[class*="pagination"]"#,
];

const NEXT_WORDS: &[&str] = &["próxima", "próximo", "última", "ultimo"];

/// Which indicator produced the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateMethod {
    /// "de N páginas" or "página X de N"
    PageText,
    /// "N produtos" divided by the page size
    ProductCount,
    /// Highest numbered button inside a pagination container
    PaginationContainer,
    /// Highest `page=` value among links
    PageLinks,
    /// Highest numbered button anywhere
    NumericButtons,
    /// A next/last button exists but gives no number
    NextButton,
    /// Nothing found
    Fallback,
}

/// Estimated number of result pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub pages: usize,
    pub method: EstimateMethod,
}

impl Estimate {
    fn new(pages: usize, method: EstimateMethod) -> Self {
        Self { pages, method }
    }

    /// The estimate used when no indicator is present
    pub fn fallback(pages: usize) -> Self {
        Self::new(pages, EstimateMethod::Fallback)
    }

    /// Replace a page count above `ceiling` with the fallback
    pub fn bounded(self, ceiling: usize, fallback: usize) -> Self {
        if self.pages <= ceiling {
            return self;
        }
        warn!(
            pages = self.pages,
            method = ?self.method,
            ceiling,
            "implausible page count, using fallback"
        );
        Self::fallback(fallback)
    }

    /// Limit the page count to an optional maximum
    pub fn capped(self, max_pages: Option<usize>) -> Self {
        match max_pages {
            Some(max) if max < self.pages => Self::new(max, self.method),
            _ => self,
        }
    }
}

/// Estimate how many result pages there are
pub fn estimate_total_pages(page: &Page, page_size: usize, fallback: usize) -> Estimate {
    let text = page.text();

    if let Some(pages) = first_count(&text, &[&*PAGES_TOTAL, &*PAGE_OF]) {
        debug!(pages, "page count found in text");
        return Estimate::new(pages, EstimateMethod::PageText);
    }

    if let Some(products) = first_count(&text, &[&*PRODUCTS_OF, &*PRODUCTS]) {
        let pages = products.div_ceil(page_size.max(1));
        debug!(products, pages, "page count estimated from product total");
        return Estimate::new(pages, EstimateMethod::ProductCount);
    }

    if let Some(container) = PAGINATION_CONTAINERS
        .iter()
        .find_map(|sel| page.select_first(sel))
    {
        debug!("pagination container found");
        let buttons = dom::select_within(container, "button");
        if let Some(max) = max_numeric_label(buttons) {
            debug!(max, "highest page button in container");
            return Estimate::new(max, EstimateMethod::PaginationContainer);
        }
    }

    let links = page.select(r#"a[href*="page="]"#);
    debug!(count = links.len(), "pagination links");
    let max_link = links
        .iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| PAGE_PARAM.captures(href))
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|n| *n > 0)
        .max();
    if let Some(max) = max_link {
        debug!(max, "highest page in links");
        return Estimate::new(max, EstimateMethod::PageLinks);
    }

    let buttons = page.select("button");
    if let Some(max) = max_numeric_label(buttons.iter().copied()) {
        debug!(max, "highest page button");
        return Estimate::new(max, EstimateMethod::NumericButtons);
    }

    let has_next = buttons.iter().any(|b| {
        let text = dom::visible_text(*b).to_lowercase();
        NEXT_WORDS.iter().any(|w| text.contains(w))
    });
    if has_next {
        debug!(fallback, "next/last button found without page numbers");
        return Estimate::new(fallback, EstimateMethod::NextButton);
    }

    debug!(fallback, "no pagination indicator found");
    Estimate::fallback(fallback)
}

/// First positive count captured by any of the patterns, in order
///
/// Every match of a pattern is considered, so an empty counter earlier on the
/// page does not hide a later one.
fn first_count(text: &str, patterns: &[&Regex]) -> Option<usize> {
    patterns.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| parse_count(&caps[1]))
            .find(|n| *n > 0)
    })
}

/// Parse a count that may use `.` as thousands separator
pub fn parse_count(raw: &str) -> Option<usize> {
    raw.trim_end_matches('.').replace('.', "").parse().ok()
}

fn max_numeric_label<'a>(buttons: impl IntoIterator<Item = ElementRef<'a>>) -> Option<usize> {
    buttons
        .into_iter()
        .map(dom::visible_text)
        .filter(|t| dom::is_numeric_label(t))
        .filter_map(|t| t.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(body: &str) -> Estimate {
        let page = Page::parse(&format!("<html><body>{}</body></html>", body), None);
        estimate_total_pages(&page, 60, 23)
    }

    #[test]
    fn test_page_text() {
        let e = estimate("<span>Página 1 de 12</span>");
        assert_eq!(e, Estimate::new(12, EstimateMethod::PageText));

        let e = estimate("<span>Mostrando 1 de 7 páginas</span>");
        assert_eq!(e.pages, 7);
    }

    #[test]
    fn test_product_count() {
        let e = estimate("<p>1-60 de 1.380 produtos</p><button>2</button>");
        assert_eq!(e, Estimate::new(23, EstimateMethod::ProductCount));

        let e = estimate("<p>61 produtos</p>");
        assert_eq!(e.pages, 2);
    }

    #[test]
    fn test_later_count_wins_over_empty_one() {
        let e = estimate("<header>Carrinho 0 produtos</header><p>Encontramos 120 produtos</p>");
        assert_eq!(e, Estimate::new(2, EstimateMethod::ProductCount));

        let e = estimate("<p>Página 1 de 0</p><p>Página 1 de 4</p>");
        assert_eq!(e, Estimate::new(4, EstimateMethod::PageText));
    }

    #[test]
    fn test_zero_products_falls_through() {
        let e = estimate("<p>0 produtos</p>");
        assert_eq!(e.method, EstimateMethod::Fallback);
    }

    #[test]
    fn test_pagination_container() {
        let e = estimate(
            r#"<nav data-testid="pagination"><button>1</button><button>2</button><button>9</button><button>Próxima</button></nav><button>60</button>"#,
        );
        assert_eq!(e, Estimate::new(9, EstimateMethod::PaginationContainer));
    }

    #[test]
    fn test_page_links() {
        let e = estimate(
            r#"<a href="/bebidas?page=2">2</a><a href="/bebidas?page=14">14</a><a href="/bebidas?sort=x">x</a>"#,
        );
        assert_eq!(e, Estimate::new(14, EstimateMethod::PageLinks));
    }

    #[test]
    fn test_numeric_buttons_anywhere() {
        let e = estimate("<div><button>1</button><button>5</button><button>Filtrar</button></div>");
        assert_eq!(e, Estimate::new(5, EstimateMethod::NumericButtons));
    }

    #[test]
    fn test_next_button_and_fallback() {
        let e = estimate("<button>Próxima página</button>");
        assert_eq!(e, Estimate::new(23, EstimateMethod::NextButton));

        let e = estimate("<p>Nada aqui</p>");
        assert_eq!(e, Estimate::fallback(23));
    }

    #[test]
    fn test_scripts_are_not_scanned() {
        let e = estimate(r#"<script>var t = "de 99 páginas";</script><p>vazio</p>"#);
        assert_eq!(e.method, EstimateMethod::Fallback);
    }

    #[test]
    fn test_capped() {
        let e = Estimate::new(23, EstimateMethod::ProductCount);
        assert_eq!(e.capped(Some(3)).pages, 3);
        assert_eq!(e.capped(Some(50)).pages, 23);
        assert_eq!(e.capped(None).pages, 23);
    }

    #[test]
    fn test_bounded_rejects_huge_counts() {
        let e = estimate("<span>Página 1 de 9223372036854775807</span>");
        assert_eq!(e.method, EstimateMethod::PageText);
        assert_eq!(e.bounded(1000, 23), Estimate::fallback(23));

        let e = Estimate::new(1000, EstimateMethod::PageLinks);
        assert_eq!(e.bounded(1000, 23), e);
    }

    #[test]
    fn test_overflowing_count_is_ignored() {
        let e = estimate("<span>Página 1 de 99999999999999999999999</span>");
        assert_eq!(e, Estimate::fallback(23));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1.380"), Some(1380));
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count("12."), Some(12));
        assert_eq!(parse_count("."), None);
    }
}
