// src/fetch/html.rs
// =============================================================================
// This module pulls the two things the crawler needs out of an HTML page:
// - every hyperlink, resolved to an absolute, fragment-free URL
// - the visible text of the <body>, for the email scanner
//
// We use the `scraper` crate (html5ever underneath) for parsing and CSS
// selectors, and the `url` crate to resolve relative links like a browser.
//
// Rust concepts:
// - Option<T>: resolve_link returns None for links we can't or won't follow
// - Iterators: filter_map / collect to build the link list
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

// Constant selectors, so parsing them can only fail on a programmer error
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

// What one parsed page gives back to the fetcher
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub links: Vec<String>,
    pub text: String,
}

// Parses an HTML document fetched from `base`
//
// Parameters:
//   html: the raw document
//   base: the URL the document was served from (after redirects)
//
// Returns: absolute links in document order, plus the body text
pub fn parse_page(html: &str, base: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let links = document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .collect();

    ParsedPage {
        links,
        text: visible_text(&document),
    }
}

// Joins the text nodes of <body> with single spaces.
//
// Joining with a separator keeps an address in one element from running into
// the next element's text ("me@x.com" + "Next" must not become "me@x.comNext").
// html5ever always synthesizes a <body>, even for fragments.
fn visible_text(document: &Html) -> String {
    document
        .select(&BODY_SELECTOR)
        .flat_map(|body| body.text())
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// Resolves a link (possibly relative) to an absolute URL
//
// Examples:
//   base = "https://example.com/a/"
//   href = "b"          -> Some("https://example.com/a/b")
//   href = "/docs#top"  -> Some("https://example.com/docs")
//   href = "mailto:x@y" -> None
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    // Skip in-page anchors and non-navigable schemes
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // Fragments point inside a page, not at a different page
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.org/a/").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link(&base(), "b"),
            Some("https://example.org/a/b".to_string())
        );
        assert_eq!(
            resolve_link(&base(), "../c"),
            Some("https://example.org/c".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_fragment() {
        assert_eq!(
            resolve_link(&base(), "b#section"),
            Some("https://example.org/a/b".to_string())
        );
    }

    #[test]
    fn test_skip_anchor_and_special_schemes() {
        assert_eq!(resolve_link(&base(), "#top"), None);
        assert_eq!(resolve_link(&base(), "mailto:test@example.com"), None);
        assert_eq!(resolve_link(&base(), "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base(), "ftp://example.org/file"), None);
    }

    #[test]
    fn test_parse_page_links_and_text() {
        let html = r#"
            <html><head><title>Ignored title</title></head>
            <body>
              <a href="b">B</a>
              <a href="https://other.org/c">Other</a>
              <p>mail me at foo@bar.com</p><p>Next</p>
            </body></html>
        "#;
        let page = parse_page(html, &base());
        assert_eq!(
            page.links,
            vec!["https://example.org/a/b", "https://other.org/c"]
        );
        assert!(page.text.contains("foo@bar.com Next"));
        assert!(!page.text.contains("Ignored title"));
    }

    #[test]
    fn test_parse_page_without_links() {
        let page = parse_page("<p>just text</p>", &base());
        assert!(page.links.is_empty());
        assert_eq!(page.text, "just text");
    }
}
