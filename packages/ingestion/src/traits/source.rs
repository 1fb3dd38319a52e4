//! Source adapter trait for pluggable feed ingestion.
//!
//! An adapter owns fetching one raw feed and converting each record into
//! the unified [`RawPosting`] shape. No shared wire format is assumed:
//! the ATS adapter parses typed JSON, the RSS adapter parses XML items,
//! the forum adapter parses a comment stream.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::job::{RawPosting, SourceKind};

/// A pluggable feed source.
///
/// Fetch failures are fatal to this source's run only; the scheduler
/// increments the source's error counter and continues with the rest.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter name for logging ("acme-greenhouse", "weworkremotely-rss").
    fn name(&self) -> &str;

    /// What kind of feed this is.
    fn kind(&self) -> SourceKind;

    /// For single-employer feeds, the employer every posting belongs to.
    fn company_hint(&self) -> Option<&str> {
        None
    }

    /// Fetch the feed and normalize every record.
    async fn fetch(&self) -> FetchResult<Vec<RawPosting>>;
}
