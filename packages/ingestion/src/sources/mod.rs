//! Source adapter implementations.
//!
//! Each adapter owns fetching one raw feed and normalizing its records
//! into [`RawPosting`](crate::types::job::RawPosting)s. No shared wire
//! format is assumed: ATS boards speak typed JSON, job boards publish
//! RSS/XML, hiring threads are free-text comment streams.

use url::Url;

use crate::error::{FetchError, FetchResult};

pub mod ats;
pub mod forum;
pub mod markup;
pub mod rss;

pub use ats::AtsAdapter;
pub use forum::ForumAdapter;
pub use rss::RssAdapter;

/// Validate a feed endpoint before any request goes out, so a
/// misregistered source fails with a clear error instead of a connect
/// failure.
pub(crate) fn checked_url(endpoint: &str) -> FetchResult<Url> {
    Url::parse(endpoint).map_err(|_| FetchError::InvalidUrl {
        url: endpoint.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_url() {
        assert!(checked_url("https://boards.test/acme/jobs").is_ok());
        assert!(matches!(
            checked_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
