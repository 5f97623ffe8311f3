//! Reduces raw HTML to the compact markup handed to the inference service.
//!
//! Scripts, styles and document metadata are dropped, only the `<body>`
//! contents are kept and whitespace is collapsed. Sanitizing never fails:
//! whenever the document cannot be reduced the raw input is returned as-is.

use scraper::{Html, Selector};
use tracing::debug;

/// Elements that carry nothing a tester would fill in.
pub const DEFAULT_STRIP_SELECTOR: &str = "script, style, noscript, meta, link";

/// Configurable sanitizer. [`sanitize`] uses the default strip list.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    strip_selector: String,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            strip_selector: DEFAULT_STRIP_SELECTOR.to_string(),
        }
    }
}

impl Sanitizer {
    /// Build a sanitizer with a custom CSS selector list of elements to drop.
    pub fn new(strip_selector: impl Into<String>) -> Self {
        Self {
            strip_selector: strip_selector.into(),
        }
    }

    /// Extend the default strip list with additional tag names.
    pub fn with_extra_tags(extra: &[String]) -> Self {
        let mut selector = DEFAULT_STRIP_SELECTOR.to_string();
        for tag in extra.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            selector.push_str(", ");
            selector.push_str(tag);
        }
        Self::new(selector)
    }

    /// Sanitize `raw`, falling back to the untouched input on any fault.
    pub fn sanitize(&self, raw: &str) -> String {
        match self.try_sanitize(raw) {
            Some(cleaned) => cleaned,
            None => {
                debug!("sanitizer fell back to raw input");
                raw.to_string()
            }
        }
    }

    fn try_sanitize(&self, raw: &str) -> Option<String> {
        let strip = Selector::parse(&self.strip_selector).ok()?;
        let body_sel = Selector::parse("body").ok()?;

        let mut document = Html::parse_document(raw);
        let doomed: Vec<_> = document.select(&strip).map(|el| el.id()).collect();
        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        let body = document.select(&body_sel).next()?.inner_html();
        Some(collapse_whitespace(&body))
    }
}

/// Sanitize with the default strip list.
pub fn sanitize(raw: &str) -> String {
    Sanitizer::default().sanitize(raw)
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
