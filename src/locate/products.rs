//! Product card extraction
//!
//! Cards and their fields are found through ordered selector lists with
//! text-based last resorts.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::core::{PageResult, PageStats, Product};
use crate::locate::dom::{self, Page};

/// "R$ 1.234,56" or "R$ 12,99" / "R$12.99"
static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"R\$\s*(?:\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2})").expect("valid regex")
});

/// Card containers, most specific first
pub const CARD_SELECTORS: &[&str] = &[
    r#"[data-testid="product-card-container"]"#,
    ".product-card",
    ".product-item",
    r#"[data-testid*="product"]:not([data-testid="product-link"])"#,
    ".vtex-search-result-3-x-galleryItem",
    ".vtex-product-summary-2-x-container",
    ".shelf-item",
    "article",
    ".col-span-1",
];

const PRODUCT_LINK_SELECTOR: &str = r#"a[data-testid="product-link"]"#;

const TITLE_SELECTORS: &[&str] = &[
    r#"a[href*="/p"]"#,
    r#"a.after\:content-\[\'\'\]"#,
    r#"[data-testid="product-card-name"]"#,
    r#"[data-testid="product-title"]"#,
    ".product-name",
    ".product-title",
    "h3",
    "h2",
    "a",
    ".vtex-product-summary-2-x-productNameContainer",
    ".vtex-product-summary-2-x-productBrandName",
];

const PRICE_SELECTORS: &[&str] = &[
    r#"span[data-test-id="price"].text-blue-royal:not(.line-through)"#,
    r#"span[data-test-id="price"]:not(.line-through)"#,
    r#"span[data-test-id="price"].text-blue-royal"#,
    r#"span[data-test-id="price"].font-medium"#,
    "[data-value]:not(.line-through)",
    r#"[data-testid="price"]:not(.line-through)"#,
    ".text-blue-royal:not(.line-through)",
    ".product-price:not(.line-through)",
    ".price:not(.line-through)",
    ".best-price:not(.line-through)",
    ".vtex-product-price-1-x-sellingPrice",
    ".vtex-product-price-1-x-sellingPriceValue",
    r#"*[class*="price"]:not(.line-through)"#,
];

static CARDS: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| dom::compile_selectors(CARD_SELECTORS).unwrap_or_default());

static TITLES: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| dom::compile_selectors(TITLE_SELECTORS).unwrap_or_default());

static PRICES: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| dom::compile_selectors(PRICE_SELECTORS).unwrap_or_default());

/// How many ancestors to climb from a product link looking for its card
const MAX_CARD_CLIMB: usize = 5;

/// Strikethrough prices are the old price, never the current one
const STRUCK_CLASS: &str = "line-through";

/// Turns result pages into product records
///
/// Holds the id counter so ids stay unique across all pages of a run.
#[derive(Debug, Default)]
pub struct ProductExtractor {
    last_id: u64,
}

impl ProductExtractor {
    /// Create an extractor whose first product gets id 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of products handed out so far
    pub fn issued(&self) -> u64 {
        self.last_id
    }

    /// Extract every complete product on a page, with counters
    pub fn extract_page(&mut self, page: &Page, page_number: usize) -> PageResult {
        let cards = find_product_cards(page);
        let mut stats = PageStats {
            total: cards.len(),
            ..Default::default()
        };
        let mut products = Vec::new();

        debug!(page = page_number, cards = cards.len(), "product cards found");
        if let Some(first) = cards.first() {
            debug!(html = %dom::html_preview(*first, 300), "first card");
        }

        for (index, card) in cards.iter().enumerate() {
            let n = index + 1;
            let title_el = find_title(*card);
            let price_el = find_price(*card);
            let link_el = match title_el {
                Some(t) if dom::tag(t) == "a" => Some(t),
                _ => dom::select_within(*card, "a").into_iter().next(),
            };

            if title_el.is_none() {
                debug!(card = n, "title not found");
                stats.missing_title += 1;
            }
            if price_el.is_none() {
                debug!(card = n, "price not found");
                stats.missing_price += 1;
            }
            if link_el.is_none() {
                debug!(card = n, "link not found");
                stats.missing_link += 1;
            }

            let title = title_el
                .map(dom::visible_text)
                .filter(|t| !t.is_empty());
            let price = price_el
                .map(|el| extract_price(&dom::visible_text(el)))
                .filter(|p| !p.is_empty());
            let link = link_el
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| page.resolve_href(href));

            match (title, price) {
                (Some(title), Some(price)) => {
                    self.last_id += 1;
                    debug!(card = n, %title, %price, "product");
                    products.push(Product {
                        id: self.last_id,
                        title,
                        price,
                        link,
                    });
                    stats.complete += 1;
                }
                (title, price) => {
                    debug!(
                        card = n,
                        title = title.is_some(),
                        price = price.is_some(),
                        link = link.is_some(),
                        "incomplete product"
                    );
                }
            }
        }

        debug!(
            page = page_number,
            missing_title = stats.missing_title,
            missing_price = stats.missing_price,
            missing_link = stats.missing_link,
            complete = stats.complete,
            "page extraction stats"
        );

        PageResult {
            page: page_number,
            products,
            stats,
        }
    }
}

/// Locate product cards on a results page
pub fn find_product_cards(page: &Page) -> Vec<ElementRef<'_>> {
    for (source, selector) in CARDS.iter() {
        let cards = page.select_with(selector);
        debug!(selector = *source, count = cards.len(), "card selector");
        if !cards.is_empty() {
            return cards;
        }
    }

    let links = page.select(PRODUCT_LINK_SELECTOR);
    if !links.is_empty() {
        debug!(count = links.len(), "cards from product links");
        let mut seen = HashSet::new();
        return links
            .into_iter()
            .map(card_for_link)
            .filter(|card| seen.insert(card.id()))
            .collect();
    }

    let generic: Vec<_> = page
        .select("div, li, article")
        .into_iter()
        .filter(|el| looks_like_title(&dom::visible_text(*el)))
        .collect();
    debug!(count = generic.len(), "cards from generic elements");
    generic
}

/// Climb from a product link to the nearest `article` or `div`
fn card_for_link(link: ElementRef<'_>) -> ElementRef<'_> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .take(MAX_CARD_CLIMB)
        .find(|el| matches!(dom::tag(*el), "article" | "div"))
        .unwrap_or(link)
}

fn find_title(card: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if let Some(el) = dom::select_within(card, PRODUCT_LINK_SELECTOR).into_iter().next() {
        return Some(el);
    }

    if let Some(el) = TITLES.iter().find_map(|(_, sel)| card.select(sel).next()) {
        return Some(el);
    }

    dom::select_within(card, "*")
        .into_iter()
        .map(|el| (el, dom::visible_text(el)))
        .filter(|(_, text)| looks_like_title(text))
        .min_by_key(|(_, text)| text.chars().count())
        .map(|(el, _)| el)
}

fn find_price(card: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if let Some(el) = PRICES.iter().find_map(|(_, sel)| card.select(sel).next()) {
        return Some(el);
    }

    dom::select_within(card, "*").into_iter().find(|el| {
        !dom::has_class(*el, STRUCK_CLASS) && PRICE.is_match(&dom::visible_text(*el))
    })
}

/// Text that could be a product name: short, and not a price
fn looks_like_title(text: &str) -> bool {
    let len = text.chars().count();
    len > 5 && len < 100 && !text.contains("R$")
}

/// The first price in a text, or the whole trimmed text if none
pub fn extract_price(text: &str) -> String {
    PRICE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}
