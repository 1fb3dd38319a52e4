//! Forum hiring-thread adapter: free-text comment streams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::sources::markup::strip_markup;
use crate::traits::source::SourceAdapter;
use crate::types::job::{RawPosting, SourceKind};

/// One comment as the forum API publishes it.
#[derive(Debug, Deserialize)]
struct ForumComment {
    id: u64,
    text: Option<String>,
    author: Option<String>,
    /// Unix timestamp, seconds
    created_at: Option<i64>,
    /// Thread the comment belongs to
    parent_id: Option<u64>,
}

/// Adapter for a hiring thread on a forum.
///
/// Postings are top-level comments on a monthly thread. By convention
/// the first line of a posting reads `Company | Job Title | Location`;
/// the rest of the comment is the posting body. Comments that do not
/// follow the convention are skipped with a log line, not an error: a
/// hiring thread is mostly noise.
pub struct ForumAdapter {
    name: String,
    endpoint: String,
    /// Thread id; comments with a different parent are ignored
    thread_id: u64,
    /// Prefix the comment id is appended to for the canonical URL
    item_url_base: String,
    client: reqwest::Client,
}

impl ForumAdapter {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        thread_id: u64,
        item_url_base: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            thread_id,
            item_url_base: item_url_base.into(),
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

    fn normalize(&self, comment: ForumComment) -> Option<RawPosting> {
        if comment.parent_id != Some(self.thread_id) {
            return None;
        }

        let text = strip_markup(comment.text.as_deref()?);
        let mut lines = text.lines();
        let header = lines.next()?.trim();

        // `Company | Job Title | Location`, two segments minimum.
        let segments: Vec<&str> = header.split('|').map(str::trim).collect();
        if segments.len() < 2 || segments[0].is_empty() || segments[1].is_empty() {
            debug!(
                adapter = %self.name,
                comment_id = comment.id,
                "comment does not follow the posting convention, skipping"
            );
            return None;
        }

        let body: String = lines.collect::<Vec<_>>().join("\n").trim().to_string();

        let mut raw = RawPosting::new(
            format!("{}:{}", self.name, comment.id),
            segments[1],
            format!("{}{}", self.item_url_base, comment.id),
        )
        .with_body(body)
        .with_metadata("company", segments[0]);

        if let Some(location) = segments.get(2).filter(|s| !s.is_empty()) {
            raw = raw.with_location(*location);
        }
        if let Some(author) = comment.author {
            raw = raw.with_author(author);
        }
        if let Some(ts) = comment.created_at {
            if let Some(posted) = DateTime::<Utc>::from_timestamp(ts, 0) {
                raw = raw.with_posted_at(posted);
            }
        }

        Some(raw)
    }
}

#[async_trait]
impl SourceAdapter for ForumAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Forum
    }

    async fn fetch(&self) -> FetchResult<Vec<RawPosting>> {
        debug!(
            adapter = %self.name,
            url = %self.endpoint,
            thread_id = self.thread_id,
            "fetching hiring thread"
        );

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

        let comments: Vec<ForumComment> = response.json().await.map_err(|e| {
            warn!(adapter = %self.name, error = %e, "thread response did not match schema");
            FetchError::Malformed {
                reason: e.to_string(),
            }
        })?;

        let total = comments.len();
        let postings: Vec<RawPosting> = comments
            .into_iter()
            .filter_map(|c| self.normalize(c))
            .collect();

        debug!(
            adapter = %self.name,
            comments = total,
            postings = postings.len(),
            "thread normalized"
        );

        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ForumAdapter {
        ForumAdapter::new(
            "hiring-thread",
            "https://forum.test/threads/9000/comments",
            9000,
            "https://forum.test/item?id=",
        )
    }

    fn comment(id: u64, parent: u64, text: &str) -> ForumComment {
        ForumComment {
            id,
            text: Some(text.to_string()),
            author: Some("poster".into()),
            created_at: Some(1_780_000_000),
            parent_id: Some(parent),
        }
    }

    #[test]
    fn test_normalize_conventional_posting() {
        let raw = adapter()
            .normalize(comment(
                42,
                9000,
                "Initech | Senior Rust Engineer | Remote (US only)\nWe build billing systems.\nEmail jobs@initech.test",
            ))
            .unwrap();

        assert_eq!(raw.external_id, "hiring-thread:42");
        assert_eq!(raw.title, "Senior Rust Engineer");
        assert_eq!(raw.url, "https://forum.test/item?id=42");
        assert_eq!(raw.location.as_deref(), Some("Remote (US only)"));
        assert_eq!(raw.metadata.get("company").map(String::as_str), Some("Initech"));
        assert!(raw.body.contains("billing systems"));
        assert!(raw.posted_at.is_some());
    }

    #[test]
    fn test_off_convention_comment_skipped() {
        assert!(adapter()
            .normalize(comment(43, 9000, "Great thread, thanks for posting!"))
            .is_none());
    }

    #[test]
    fn test_reply_outside_thread_skipped() {
        assert!(adapter()
            .normalize(comment(44, 1234, "Initech | Engineer | Remote"))
            .is_none());
    }

    #[test]
    fn test_two_segment_header_accepted() {
        let raw = adapter()
            .normalize(comment(45, 9000, "Globex | Data Engineer\nBody"))
            .unwrap();
        assert_eq!(raw.title, "Data Engineer");
        assert!(raw.location.is_none());
    }
}
