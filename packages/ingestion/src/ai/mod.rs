//! AI service implementations.

pub mod openai;

pub use openai::OpenAi;
