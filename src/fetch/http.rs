// src/fetch/http.rs
// =============================================================================
// This module fetches pages over HTTP(S) with reqwest.
//
// Key functionality:
// - One shared Client (connection pooling) for every worker
// - Non-2xx responses and non-HTML content types become FetchErrors
// - reqwest errors are sorted into timeout / redirect / DNS / TLS / ...
// - Links are resolved against the final URL, after redirects
// - A redirect chain that ends outside the scope prefix is not scanned
//
// Rust concepts:
// - async/await: the download is the only await point; parsing is sync
// - From<T>: lets `?` turn reqwest::Error into our FetchError
// =============================================================================

use super::html::parse_page;
use super::{FetchError, PageFetcher, PageHandler};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const MAX_REDIRECTS: usize = 5;

/// Page fetcher backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    scope_prefix: Option<String>,
}

impl HttpFetcher {
    // Builds the shared client
    //
    // Failing here means the process can't crawl at all, so the caller treats
    // it as fatal before any worker starts.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            scope_prefix: None,
        })
    }

    // Refuse documents whose final URL (after redirects) leaves `prefix`
    pub fn with_scope(mut self, prefix: impl Into<String>) -> Self {
        self.scope_prefix = Some(prefix.into());
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, handler: &mut dyn PageHandler) -> Result<(), FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(prefix) = &self.scope_prefix {
            if !response.url().as_str().starts_with(prefix.as_str()) {
                return Err(FetchError::RedirectedOutOfScope(response.url().to_string()));
            }
        }

        // A missing content type is given the benefit of the doubt
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(FetchError::NotHtml(content_type.to_string()));
            }
        }

        let base = response.url().clone();
        let body = response.text().await?;

        // No await below this point: the parsed document never crosses one
        let page = parse_page(&body, &base);
        debug!(url, links = page.links.len(), "parsed page");

        for link in &page.links {
            handler.on_link(link);
        }
        handler.on_text(&page.text);

        Ok(())
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

// Categorizes the different error types from reqwest
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        let error_string = error.to_string().to_lowercase();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if error.is_connect() {
            // Connection errors often mean DNS issues or host unreachable
            if error_string.contains("dns") {
                FetchError::Dns
            } else {
                FetchError::Connect
            }
        } else if error_string.contains("certificate") || error_string.contains("ssl") {
            FetchError::Tls
        } else {
            FetchError::Other(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[derive(Default)]
    struct Collected {
        links: Vec<String>,
        texts: Vec<String>,
    }

    impl PageHandler for Collected {
        fn on_link(&mut self, url: &str) {
            self.links.push(url.to_string());
        }

        fn on_text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), "email-crawler-test").unwrap()
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("TEXT/HTML"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html("text/plain"));
    }

    #[tokio::test]
    async fn test_fetch_reports_links_then_text() {
        let mut server = Server::new_async().await;
        let page = server
            .mock("GET", "/a/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<body><a href="b">B</a><a href="/z#frag">Z</a> write to foo@bar.com</body>"#)
            .create_async()
            .await;

        let mut collected = Collected::default();
        fetcher()
            .fetch(&format!("{}/a/", server.url()), &mut collected)
            .await
            .unwrap();

        page.assert_async().await;
        assert_eq!(
            collected.links,
            vec![format!("{}/a/b", server.url()), format!("{}/z", server.url())]
        );
        assert_eq!(collected.texts.len(), 1);
        assert!(collected.texts[0].contains("foo@bar.com"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_status_error() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/gone")
            .with_status(404)
            .with_body("nope")
            .create_async()
            .await;

        let mut collected = Collected::default();
        let result = fetcher()
            .fetch(&format!("{}/gone", server.url()), &mut collected)
            .await;

        assert!(matches!(result, Err(FetchError::Status(404))));
        assert!(collected.texts.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_out_of_scope_is_not_scanned() {
        let mut server = Server::new_async().await;
        let _moved = server
            .mock("GET", "/a/moved")
            .with_status(301)
            .with_header("location", &format!("{}/elsewhere", server.url()))
            .create_async()
            .await;
        let _elsewhere = server
            .mock("GET", "/elsewhere")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<body><a href="/a/x">x</a> offscope@example.com</body>"#)
            .create_async()
            .await;

        let mut collected = Collected::default();
        let error = fetcher()
            .with_scope(format!("{}/a/", server.url()))
            .fetch(&format!("{}/a/moved", server.url()), &mut collected)
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::RedirectedOutOfScope(_)));
        assert!(error.is_skip());
        assert!(collected.links.is_empty());
        assert!(collected.texts.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_inside_scope_is_followed() {
        let mut server = Server::new_async().await;
        let _moved = server
            .mock("GET", "/a/old")
            .with_status(302)
            .with_header("location", "/a/new")
            .create_async()
            .await;
        let _new = server
            .mock("GET", "/a/new")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<body>reach me at new@example.com</body>")
            .create_async()
            .await;

        let mut collected = Collected::default();
        fetcher()
            .with_scope(format!("{}/a/", server.url()))
            .fetch(&format!("{}/a/old", server.url()), &mut collected)
            .await
            .unwrap();

        assert_eq!(collected.texts, vec!["reach me at new@example.com"]);
    }

    #[tokio::test]
    async fn test_fetch_non_html_is_skipped() {
        let mut server = Server::new_async().await;
        let _pdf = server
            .mock("GET", "/paper.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let mut collected = Collected::default();
        let error = fetcher()
            .fetch(&format!("{}/paper.pdf", server.url()), &mut collected)
            .await
            .unwrap_err();

        assert!(error.is_skip());
        assert!(collected.links.is_empty());
    }
}
