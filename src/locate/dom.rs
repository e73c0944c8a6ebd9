//! DOM snapshot helpers
//!
//! A `Page` is a parsed copy of the live document. Locators search it with
//! CSS selectors and text heuristics, then hand the browser a `css_path` that
//! points back at the element they picked.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::core::{GondolaError, Result};

/// Elements whose text never reaches the rendered page
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements rendered on their own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Parsed snapshot of a page
pub struct Page {
    html: Html,
    base: Option<Url>,
}

impl Page {
    /// Parse a document, remembering its URL for link resolution
    pub fn parse(html: &str, base: Option<&str>) -> Self {
        Self {
            html: Html::parse_document(html),
            base: base.and_then(|b| Url::parse(b).ok()),
        }
    }

    /// The root `<html>` element
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// All elements matching a selector, in document order
    ///
    /// An unparsable selector matches nothing.
    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// All elements matching a compiled selector, in document order
    pub fn select_with(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }

    /// First element matching a selector
    pub fn select_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        self.select(selector).into_iter().next()
    }

    /// Whether any element matches a selector
    pub fn exists(&self, selector: &str) -> bool {
        self.select_first(selector).is_some()
    }

    /// Rendered text of the whole body
    pub fn text(&self) -> String {
        visible_text(self.root())
    }

    /// Resolve an href against the page URL
    pub fn resolve_href(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let resolved = match &self.base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        resolved.ok().map(String::from)
    }
}

/// Parse a selector, logging and discarding invalid ones
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector, error = %e, "invalid selector skipped");
            None
        }
    }
}

/// Compile a list of selectors, keeping the source text alongside
///
/// Invalid entries are skipped. Fails only if nothing compiles.
pub fn compile_selectors<'s>(selectors: &[&'s str]) -> Result<Vec<(&'s str, Selector)>> {
    let compiled: Vec<_> = selectors
        .iter()
        .filter_map(|s| parse_selector(s).map(|sel| (*s, sel)))
        .collect();

    if compiled.is_empty() && !selectors.is_empty() {
        return Err(GondolaError::selector(format!(
            "No valid selectors in [{}]",
            selectors.join(", ")
        )));
    }

    Ok(compiled)
}

/// Descendants of `el` matching a selector
pub fn select_within<'a>(el: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(selector) {
        Some(sel) => el.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Approximation of `innerText`: rendered text with whitespace collapsed
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push(' ');
            }
            collect_text(child_el, out);
            if block {
                out.push(' ');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Trim and squeeze runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tag name of an element, lowercase
pub fn tag(el: ElementRef<'_>) -> &str {
    el.value().name()
}

/// Whether the element carries a class
pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Whether the trimmed text is a non-empty run of ASCII digits
pub fn is_numeric_label(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Build a selector that matches exactly this element in the snapshot
///
/// The path is a chain of `tag:nth-child(k)` steps from `<html>` down.
pub fn css_path(el: ElementRef<'_>) -> String {
    let mut steps = Vec::new();
    let mut current = Some(el);

    while let Some(node) = current {
        let parent = node.parent().and_then(ElementRef::wrap);
        let name = node.value().name();
        match parent {
            Some(_) => {
                let index = node
                    .prev_siblings()
                    .filter(|s| s.value().is_element())
                    .count()
                    + 1;
                steps.push(format!("{}:nth-child({})", name, index));
            }
            None => steps.push(name.to_string()),
        }
        current = parent;
    }

    steps.reverse();
    steps.join(" > ")
}

/// Short preview of an element's markup for debug logs
pub fn html_preview(el: ElementRef<'_>, max_chars: usize) -> String {
    let html = el.html();
    if html.chars().count() <= max_chars {
        return html;
    }
    let cut: String = html.chars().take(max_chars).collect();
    format!("{}...", cut)
}
