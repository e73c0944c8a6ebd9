//! Locators for the storefront's interactive controls
//!
//! Each locator walks a cascade of strategies and returns one candidate per
//! strategy that matched, best first. The collector acts on the first
//! candidate and moves down the list when the browser rejects it.

use scraper::ElementRef;
use std::fmt;

use crate::locate::dom::{self, Page};

/// Postal code button, matched by exact Tailwind classes
pub const POSTAL_BUTTON_SELECTOR: &str = r#"button.w-\[max-content\].cusror-pointer.flex.col-span-2.font-bold.hover\:underline.hover\:underline-offset-2[title="Insira seu CEP"]"#;

/// Postal code input inside the modal
pub const POSTAL_INPUT_SELECTOR: &str =
    r#"input[type="search"][name="zipcode"][placeholder="00000-000"]"#;

/// Confirm button next to the postal code input
pub const SUBMIT_BUTTON_SELECTOR: &str = r#"button[type="submit"].bg-blue-primary.hover\:bg-blue-primaryHover.active\:bg-blue-primaryActive.text-white.text-sm.py-2.px-4.rounded-r-md.w-\[117px\].min-w-\[117px\]"#;

/// Floating orange chat button
pub const CHAT_BUTTON_SELECTOR: &str = r#"button.flex.items-center.justify-center.w-\[110px\].h-\[110px\].bottom-10.right-10.rounded-full.bg-orange.fixed.z-10"#;

const POSTAL_BUTTON_TEXT: &str = "Insira seu CEP";
const PAGE_SIZE_TEXT: &str = "produtos por página";
const SUBMIT_WORDS: &[&str] = &["buscar", "confirmar", "ok"];
const CORNER_OFFSETS: &[&str] = &["10px", "2.5rem"];

/// How a candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact site-specific selector
    SiteSelector,
    /// Visible text or title attribute
    TextMatch,
    /// Partial attribute match (name, placeholder, id, class)
    AttributeMatch,
    /// Child image alt text
    ImageAlt,
    /// Fixed position in the bottom-right corner
    CornerPosition,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SiteSelector => write!(f, "site selector"),
            Strategy::TextMatch => write!(f, "text match"),
            Strategy::AttributeMatch => write!(f, "attribute match"),
            Strategy::ImageAlt => write!(f, "image alt"),
            Strategy::CornerPosition => write!(f, "corner position"),
        }
    }
}

/// An element the browser can act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Selector that targets the element in the live page
    pub selector: String,
    /// Strategy that produced it
    pub strategy: Strategy,
}

impl Located {
    fn at(el: ElementRef<'_>, strategy: Strategy) -> Self {
        Self {
            selector: dom::css_path(el),
            strategy,
        }
    }

    fn site(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            strategy: Strategy::SiteSelector,
        }
    }
}

/// Button that opens the postal code modal
pub fn locate_postal_code_button(page: &Page) -> Vec<Located> {
    let mut found = Vec::new();

    if let Some(el) = page.select("button").into_iter().find(|b| {
        dom::visible_text(*b).contains(POSTAL_BUTTON_TEXT)
            || b.value()
                .attr("title")
                .is_some_and(|t| t.contains(POSTAL_BUTTON_TEXT))
    }) {
        found.push(Located::at(el, Strategy::TextMatch));
    }

    if page.exists(POSTAL_BUTTON_SELECTOR) {
        found.push(Located::site(POSTAL_BUTTON_SELECTOR));
    }

    if let Some(el) = page.select("*").into_iter().find(|el| {
        let clickable =
            matches!(dom::tag(*el), "button" | "a") || el.value().attr("onclick").is_some();
        clickable && dom::visible_text(*el).contains("CEP")
    }) {
        found.push(Located::at(el, Strategy::TextMatch));
    }

    dedup(found)
}

/// Postal code text field
///
/// A `SiteSelector` candidate should be typed into; the others are filled.
pub fn locate_postal_code_input(page: &Page) -> Vec<Located> {
    let mut found = Vec::new();

    if page.exists(POSTAL_INPUT_SELECTOR) {
        found.push(Located::site(POSTAL_INPUT_SELECTOR));
    }

    let partial = page
        .select(r#"input[type="search"], input[placeholder*="000"]"#)
        .into_iter()
        .find(|input| {
            let attr = |name| input.value().attr(name).unwrap_or_default();
            attr("name") == "zipcode"
                || attr("placeholder").contains("000")
                || attr("id").to_lowercase().contains("cep")
                || attr("class").to_lowercase().contains("cep")
        });
    if let Some(el) = partial {
        found.push(Located::at(el, Strategy::AttributeMatch));
    }

    found
}

/// Button that confirms the postal code
pub fn locate_submit_button(page: &Page) -> Vec<Located> {
    let mut found = Vec::new();

    if page.exists(SUBMIT_BUTTON_SELECTOR) {
        found.push(Located::site(SUBMIT_BUTTON_SELECTOR));
    }

    let by_text = page
        .select(r#"button[type="submit"], button.bg-blue-primary, button"#)
        .into_iter()
        .find(|b| {
            let text = dom::visible_text(*b).to_lowercase();
            SUBMIT_WORDS.iter().any(|w| text.contains(w))
        });
    if let Some(el) = by_text {
        found.push(Located::at(el, Strategy::TextMatch));
    }

    found
}

/// Every element that looks like the floating chat widget
///
/// The exact selector yields only its first match. The heuristic strategies
/// return every element they match.
pub fn locate_chat_widget(page: &Page) -> Vec<Located> {
    if let Some(el) = page.select_first(CHAT_BUTTON_SELECTOR) {
        return vec![Located::at(el, Strategy::SiteSelector)];
    }

    let with_image: Vec<Located> = page
        .select("button")
        .into_iter()
        .filter(|b| !dom::select_within(*b, r#"img[alt="Chat"]"#).is_empty())
        .map(|b| Located::at(b, Strategy::ImageAlt))
        .collect();
    if !with_image.is_empty() {
        return with_image;
    }

    page.select(".fixed")
        .into_iter()
        .filter(|el| anchored_bottom_right(*el))
        .map(|el| Located::at(el, Strategy::CornerPosition))
        .collect()
}

/// Button that opens the products-per-page menu
pub fn locate_page_size_control(page: &Page) -> Option<Located> {
    page.select("button")
        .into_iter()
        .find(|b| dom::visible_text(*b).contains(PAGE_SIZE_TEXT))
        .map(|b| Located::at(b, Strategy::TextMatch))
}

/// Menu entry whose label is exactly the wanted page size
pub fn locate_page_size_option(page: &Page, page_size: usize) -> Option<Located> {
    let wanted = page_size.to_string();
    page.select("button")
        .into_iter()
        .find(|b| {
            let text = dom::visible_text(*b);
            dom::is_numeric_label(&text) && text == wanted
        })
        .map(|b| Located::at(b, Strategy::TextMatch))
}

/// Position check without computed style: inline offsets or Tailwind classes
fn anchored_bottom_right(el: ElementRef<'_>) -> bool {
    let mut bottom = false;
    let mut right = false;

    if let Some(style) = el.value().attr("style") {
        for decl in style.split(';') {
            if let Some((prop, value)) = decl.split_once(':') {
                let value = value.trim();
                match prop.trim() {
                    "bottom" => bottom |= CORNER_OFFSETS.contains(&value),
                    "right" => right |= CORNER_OFFSETS.contains(&value),
                    _ => {}
                }
            }
        }
    }

    for class in el.value().classes() {
        match class {
            "bottom-10" | "bottom-[10px]" => bottom = true,
            "right-10" | "right-[10px]" => right = true,
            _ => {}
        }
    }

    bottom && right
}

fn dedup(found: Vec<Located>) -> Vec<Located> {
    let mut unique: Vec<Located> = Vec::with_capacity(found.len());
    for candidate in found {
        if !unique.iter().any(|u| u.selector == candidate.selector) {
            unique.push(candidate);
        }
    }
    unique
}
