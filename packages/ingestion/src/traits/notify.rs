//! Downstream notification trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::job::Job;

/// Fire-and-forget downstream notifications (search-engine indexing ping,
/// social-post queue).
///
/// Callers spawn these and log failures; a notification error never rolls
/// back or blocks job creation, and delivery is at-most-once.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new job was published.
    async fn job_published(&self, job: &Job) -> Result<()>;

    /// An existing job was updated.
    async fn job_updated(&self, job: &Job) -> Result<()>;
}
