//! HTML to markdown conversion for documentation pages.
//!
//! The main article element is preferred when the page has one; otherwise
//! the whole `<body>` is used. Page chrome (scripts, styles, headers,
//! footers, navigation, sidebars) is stripped before conversion.

use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Extracts the readable content of a documentation page as markdown.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    content_selector: String,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new("div.article-body")
    }
}

impl ContentExtractor {
    /// Creates an extractor that prefers elements matching `content_selector`.
    pub fn new(content_selector: impl Into<String>) -> Self {
        Self {
            content_selector: content_selector.into(),
        }
    }

    /// Converts `html` to trimmed markdown. Returns an empty string when
    /// there is nothing to extract.
    pub fn extract(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let cleaned = remove_page_chrome(html);
        let document = Html::parse_document(&cleaned);

        let fragment = match self.select_article(&document) {
            Some(article) => article,
            None => {
                warn!(
                    "No element matches '{}', converting the entire page body",
                    self.content_selector
                );
                select_body(&document).unwrap_or(cleaned)
            }
        };

        match htmd::convert(&fragment) {
            Ok(markdown) => markdown.trim().to_string(),
            Err(e) => {
                warn!("Failed to convert HTML to markdown: {}", e);
                String::new()
            }
        }
    }

    fn select_article(&self, document: &Html) -> Option<String> {
        let selector = match Selector::parse(&self.content_selector) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Invalid content selector '{}': {}", self.content_selector, e);
                return None;
            }
        };

        let article = document.select(&selector).next()?;
        debug!("Found main content via '{}'", self.content_selector);
        Some(article.html())
    }
}

fn select_body(document: &Html) -> Option<String> {
    let selector = Selector::parse("body").ok()?;
    document.select(&selector).next().map(|body| body.html())
}

/// Drops scripts, styles and layout elements that carry no article text.
fn remove_page_chrome(html: &str) -> String {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("noscript", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("header", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("footer", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("nav", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("aside", |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() {
        html.to_string()
    } else {
        String::from_utf8_lossy(&output).into_owned()
    }
}
