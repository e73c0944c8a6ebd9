//! Page driver abstraction
//!
//! The handful of browser actions the collector performs, implemented by the
//! agent-browser executor and by in-memory drivers in tests.

use async_trait::async_trait;

use crate::core::Result;

/// Script that returns the serialized DOM of the current page
pub const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

/// Browser actions used by the collector
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the network to settle
    async fn goto(&self, url: &str) -> Result<()>;

    /// Serialized HTML of the current page
    async fn content(&self) -> Result<String>;

    /// Click the element matching a CSS selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Type text into an element key by key
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Replace the value of an input element
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Evaluate JavaScript in the page and return its result as text
    async fn eval(&self, script: &str) -> Result<String>;

    /// Close the browser session
    async fn close(&self) -> Result<()>;
}

/// Build a script that hides every element matching the given selectors
///
/// The script returns the number of elements it hid.
pub fn hide_elements_script(selectors: &[String]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        "(() => {{ let n = 0; for (const s of {list}) {{ \
         document.querySelectorAll(s).forEach(el => {{ \
         el.style.display = 'none'; el.style.visibility = 'hidden'; \
         el.style.pointerEvents = 'none'; n++; }}); }} return n; }})()"
    )
}
