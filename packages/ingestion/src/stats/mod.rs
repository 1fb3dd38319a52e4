//! Wage statistics source implementations.

pub mod http;

pub use http::HttpWageStats;
