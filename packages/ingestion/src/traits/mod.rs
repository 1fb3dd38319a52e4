//! Core trait abstractions.
//!
//! Seams between the pipeline and the outside world: feed adapters, the AI
//! extraction service, wage statistics sources, storage, and downstream
//! notification. Every external dependency sits behind one of these so the
//! whole ingestion path runs against mocks in tests.

pub mod ai;
pub mod notify;
pub mod source;
pub mod stats;
pub mod store;

pub use ai::{ExtractedPosting, ExtractionAi};
pub use notify::Notifier;
pub use source::SourceAdapter;
pub use stats::WageStatsSource;
pub use store::{AuditStore, BenchmarkStore, CompanyStore, IngestStore, JobStore, SourceStore};
