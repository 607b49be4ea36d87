//! Fetch a job posting and strip it down to readable text

use crate::config::FetchConfig;
use crate::error::{Result, ResumeTailorError};
use log::{debug, info};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;

pub const NO_TITLE: &str = "No title found";

/// Elements whose text never reaches the model
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "img", "input", "button", "noscript", "svg", "select", "textarea", "iframe",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub title: String,
    pub body: String,
}

impl FetchedPage {
    /// Title and body separated by a blank line
    pub fn to_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

#[derive(Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResumeTailorError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        info!("Fetching job posting: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResumeTailorError::Fetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResumeTailorError::Fetch(format!("GET {} returned {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ResumeTailorError::Fetch(format!("Failed to read body of {}: {}", url, e)))?;
        debug!("Fetched {} bytes of HTML from {}", html.len(), url);

        Ok(parse_page(&html))
    }
}

/// Extract the title and the visible body text of an HTML document
pub fn parse_page(html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let mut lines = Vec::new();
    if let Some(body) = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        collect_text(body, &mut lines);
    }

    FetchedPage {
        title,
        body: lines.join("\n"),
    }
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, lines);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_dropped_and_title_kept() {
        let page = parse_page(
            "<title>Jobs</title><body><script>x</script><p>Role: Engineer</p></body>",
        );
        assert_eq!(page.to_text(), "Jobs\n\nRole: Engineer");
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let page = parse_page("<html><body><h1>Senior Rust Engineer</h1></body></html>");
        assert_eq!(page.title, NO_TITLE);
        assert_eq!(page.body, "Senior Rust Engineer");
    }

    #[test]
    fn test_block_text_is_newline_separated_and_trimmed() {
        let html = r#"
            <html><head><title> Acme Careers </title><style>p { color: red }</style></head>
            <body>
              <div>
                <h2>  About the role  </h2>
                <p>Build   services</p>
                <form><input value="x"><button>Apply now</button></form>
                <img alt="logo" src="logo.png">
              </div>
              <ul><li>Rust</li><li>Tokio</li></ul>
            </body></html>"#;

        let page = parse_page(html);
        assert_eq!(page.title, "Acme Careers");
        assert_eq!(page.body, "About the role\nBuild   services\nRust\nTokio");
    }
}
