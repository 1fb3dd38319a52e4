//! RSS/XML feed adapter.
//!
//! Items are pulled out of the feed with the same regex-based markup
//! parsing used elsewhere; an RSS item is flat enough that a full XML
//! parser buys nothing here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::sources::markup::{decode_entities, strip_markup};
use crate::traits::source::SourceAdapter;
use crate::types::job::{RawPosting, SourceKind};

lazy_static! {
    static ref ITEM: Regex = Regex::new(r"(?s)<item[^>]*>(.*?)</item>").unwrap();
    static ref CDATA: Regex = Regex::new(r"(?s)^\s*<!\[CDATA\[(.*?)\]\]>\s*$").unwrap();
}

/// Adapter for an RSS/XML job feed.
///
/// Feeds list postings as `<item>` blocks with title/link/pubDate/
/// description/guid/category children. Many boards publish titles as
/// "Company: Job Title"; when that pattern is present the employer part
/// is split off into metadata.
pub struct RssAdapter {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl RssAdapter {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Parse a feed document into postings.
    fn parse_feed(&self, xml: &str) -> Vec<RawPosting> {
        let mut postings = Vec::new();

        for item in ITEM.captures_iter(xml) {
            let block = &item[1];

            let Some(title) = tag_text(block, "title") else {
                warn!(adapter = %self.name, "skipping item without title");
                continue;
            };
            let Some(link) = tag_text(block, "link") else {
                warn!(adapter = %self.name, title = %title, "skipping item without link");
                continue;
            };

            let guid = tag_text(block, "guid").unwrap_or_else(|| link.clone());
            let mut raw = RawPosting::new(format!("{}:{}", self.name, guid), &title, link);

            if let Some(date) = tag_text(block, "pubDate").and_then(|d| parse_rfc2822(&d)) {
                raw = raw.with_posted_at(date);
            }
            if let Some(description) = tag_text(block, "description") {
                raw = raw.with_body(strip_markup(&description));
            }

            let categories: Vec<String> = tag_texts(block, "category");
            if !categories.is_empty() {
                raw = raw.with_metadata("categories", categories.join(", "));
            }

            // "Company: Job Title" convention
            if let Some((company, job_title)) = title.split_once(": ") {
                raw.title = job_title.trim().to_string();
                raw = raw.with_metadata("company", company.trim());
            }

            postings.push(raw);
        }

        postings
    }
}

/// Text content of the first `<tag>` child, CDATA unwrapped and entities
/// decoded.
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")).ok()?;
    let inner = pattern.captures(block)?.get(1)?.as_str();

    let inner = match CDATA.captures(inner) {
        Some(cdata) => cdata.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => inner,
    };

    let text = decode_entities(inner.trim());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text content of every `<tag>` child.
fn tag_texts(block: &str, tag: &str) -> Vec<String> {
    let Ok(pattern) = Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")) else {
        return Vec::new();
    };
    pattern
        .captures_iter(block)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// RSS dates are RFC 2822 ("Mon, 06 Jul 2026 08:00:00 GMT").
fn parse_rfc2822(date: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(date.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Rss
    }

    async fn fetch(&self) -> FetchResult<Vec<RawPosting>> {
        debug!(adapter = %self.name, url = %self.endpoint, "fetching RSS feed");

        let endpoint = crate::sources::checked_url(&self.endpoint)?;
        let response = self.client.get(endpoint).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: self.endpoint.clone(),
                }
            } else {
                FetchError::Http(Box::new(e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let xml = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        if !xml.contains("<item") {
            return Err(FetchError::Malformed {
                reason: "no <item> elements in feed".into(),
            });
        }

        Ok(self.parse_feed(&xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Remote Jobs</title>
    <item>
      <title><![CDATA[Initech: Senior Rust Engineer]]></title>
      <link>https://jobs.test/postings/101</link>
      <guid>101</guid>
      <pubDate>Mon, 06 Jul 2026 08:00:00 GMT</pubDate>
      <category>Programming</category>
      <category>Backend</category>
      <description><![CDATA[<p>Work on our billing platform. Salary $120k&ndash;$150k.</p>]]></description>
    </item>
    <item>
      <title>Standalone Listing</title>
      <link>https://jobs.test/postings/102</link>
    </item>
    <item>
      <title>No Link Item</title>
    </item>
  </channel>
</rss>"#;

    fn adapter() -> RssAdapter {
        RssAdapter::new("remote-jobs", "https://jobs.test/feed.xml")
    }

    #[test]
    fn test_parse_feed_items() {
        let postings = adapter().parse_feed(FEED);

        // The item with no link is skipped.
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.external_id, "remote-jobs:101");
        assert_eq!(first.title, "Senior Rust Engineer");
        assert_eq!(first.metadata.get("company").map(String::as_str), Some("Initech"));
        assert_eq!(
            first.metadata.get("categories").map(String::as_str),
            Some("Programming, Backend")
        );
        assert!(first.posted_at.is_some());
        assert!(first.body.contains("billing platform"));
        assert!(!first.body.contains("<p>"));
    }

    #[test]
    fn test_guid_falls_back_to_link() {
        let postings = adapter().parse_feed(FEED);
        assert_eq!(
            postings[1].external_id,
            "remote-jobs:https://jobs.test/postings/102"
        );
    }

    #[test]
    fn test_title_without_company_prefix_kept() {
        let postings = adapter().parse_feed(FEED);
        assert_eq!(postings[1].title, "Standalone Listing");
        assert!(postings[1].metadata.get("company").is_none());
    }

    #[test]
    fn test_rfc2822_parsing() {
        let parsed = parse_rfc2822("Mon, 06 Jul 2026 08:00:00 GMT").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-07-06T08:00:00+00:00");
        assert!(parse_rfc2822("yesterday").is_none());
    }
}
