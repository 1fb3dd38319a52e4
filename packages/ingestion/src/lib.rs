//! Job Posting Ingestion Library
//!
//! Turns heterogeneous job feeds (ATS boards, RSS/XML, free-text hiring
//! threads) into canonical, deduplicated, classified job records ready
//! for publishing.
//!
//! # Design
//!
//! - **Partition, never mutate**: filter stages split a batch into
//!   survivors and audited rejects; every reject carries a reason from a
//!   closed set, and `input == passed + rejected` is verified per run.
//! - **Degrade, never block**: a broken filter fails open, a down AI
//!   service falls back to deterministic heuristics, a missing salary
//!   gets an estimate. One source's failure never touches another.
//! - **Everything external behind a trait**: feeds, the AI service, wage
//!   statistics, storage and notification all sit behind seams so the
//!   whole path runs against mocks in tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ingestion::{AtsAdapter, Ingestor, IngestionConfig, MemoryStore, OpenAi};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let ingestor = Ingestor::new(store, IngestionConfig::default())
//!     .with_ai(Arc::new(OpenAi::from_env()?));
//!
//! let board = AtsAdapter::new("acme", "Acme", "https://boards.example/acme/jobs");
//! let report = ingestor.process_source(&board).await?;
//! println!("created {} jobs", report.created);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (adapters, AI, stats, store, notify)
//! - [`types`] - Domain data types and configuration
//! - [`pipeline`] - The staged filter pipeline and its engine
//! - [`sources`] - Feed adapters (ATS JSON, RSS/XML, forum threads)
//! - [`extract`] - Structured extraction with heuristic fallback
//! - [`classify`] - Total category classification
//! - [`resolve`] - Company entity resolution
//! - [`salary`] - The salary estimation fallback chain
//! - [`ingest`] - End-to-end source runs and the scheduler
//! - [`discover`] - ATS board discovery with cooperative cancellation
//! - [`stores`] - Storage backends (MemoryStore, PostgresStore)
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod classify;
pub mod discover;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod resolve;
pub mod salary;
pub mod sources;
pub mod stats;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, IngestError, StageError};
pub use traits::{
    ai::{ExtractedPosting, ExtractionAi},
    notify::Notifier,
    source::SourceAdapter,
    stats::WageStatsSource,
    store::{AuditStore, BenchmarkStore, CompanyStore, IngestStore, JobStore, SourceStore},
};
pub use types::{
    category::Category,
    company::Company,
    config::{FilterConfig, IngestionConfig, SalaryConfig},
    job::{
        EmploymentType, FilterReason, FilterableJob, Job, RawPosting, RejectedPosting, RemoteType,
        SeniorityLevel, SourceKind,
    },
    salary::{SalaryBenchmark, SalaryPeriod, SalaryRange},
    source::IngestSource,
};

// Re-export the pipeline
pub use pipeline::{
    AgeStage, DuplicateStage, FilterContext, FilterPipeline, FilterStage, PipelineReport,
    RelevanceStage, StagePartition, StageStats, WhitelistStage,
};

// Re-export source adapters
pub use sources::{AtsAdapter, ForumAdapter, RssAdapter};

// Re-export per-survivor processing
pub use classify::{classify, classify_by_keywords};
pub use extract::extract_posting;
pub use resolve::resolve_company;
pub use salary::{estimate_range, SalaryEngine};

// Re-export the runner and scheduler
pub use ingest::{Ingestor, Scheduler, SchedulerOutcome, SourceRunReport};

// Re-export discovery
pub use discover::{candidate_tokens, BoardDiscovery, DiscoveryHandle, DiscoveryProgress};

// Re-export service clients
pub use ai::OpenAi;
pub use notify::WebhookNotifier;
pub use stats::HttpWageStats;

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
