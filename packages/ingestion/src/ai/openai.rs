//! OpenAI-compatible implementation of the extraction AI trait.
//!
//! Every operation goes through structured output (the `json_schema`
//! response format) so the service cannot answer in free prose. Requests
//! carry a short client-side timeout; a timeout surfaces as an AI error
//! and the caller proceeds with its deterministic fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::traits::ai::{ExtractedPosting, ExtractionAi};
use crate::types::category::Category;

/// Default per-request timeout. Generous enough for extraction, short
/// enough that a hung service degrades to heuristics instead of stalling
/// the whole source run.
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// OpenAI-compatible AI client.
#[derive(Clone)]
pub struct OpenAi {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAi {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| IngestError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Structured output with a JSON schema response format.
    async fn generate_structured(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct StructuredRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            format_type: &'static str,
            json_schema: JsonSchemaFormat,
        }

        #[derive(Serialize)]
        struct JsonSchemaFormat {
            name: String,
            strict: bool,
            schema: serde_json::Value,
        }

        let request = StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    strict: true,
                    schema,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::Ai(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(IngestError::Ai(
                format!("AI service returned {status}: {error_text}").into(),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Ai(Box::new(e)))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| IngestError::Ai("empty AI response".into()))
    }
}

/// Schema for the posting-extraction response, mirroring
/// [`ExtractedPosting`].
fn extraction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": {"type": ["string", "null"]},
            "company": {"type": ["string", "null"]},
            "is_remote": {"type": ["boolean", "null"]},
            "location": {"type": ["string", "null"]},
            "salary_min": {"type": ["integer", "null"]},
            "salary_max": {"type": ["integer", "null"]},
            "salary_currency": {"type": ["string", "null"]},
            "salary_period": {
                "type": ["string", "null"],
                "enum": ["year", "month", "day", "hour", null]
            },
            "skills": {"type": "array", "items": {"type": "string"}},
            "level": {
                "type": ["string", "null"],
                "enum": [
                    "intern", "entry", "junior", "mid", "senior",
                    "lead", "manager", "director", "executive", null
                ]
            },
            "employment_type": {
                "type": ["string", "null"],
                "enum": ["full_time", "part_time", "contract", "internship", null]
            },
            "benefits": {"type": "array", "items": {"type": "string"}},
            "contact_email": {"type": ["string", "null"]}
        },
        "required": [
            "title", "company", "is_remote", "location", "salary_min",
            "salary_max", "salary_currency", "salary_period", "skills",
            "level", "employment_type", "benefits", "contact_email"
        ],
        "additionalProperties": false
    })
}

#[async_trait]
impl ExtractionAi for OpenAi {
    async fn extract_posting(&self, text: &str) -> Result<ExtractedPosting> {
        let content = self
            .generate_structured(
                "Extract structured job posting fields from the text. \
                 Use null for anything the posting does not state; never guess \
                 salary figures.",
                text,
                "job_posting",
                extraction_schema(),
            )
            .await?;

        serde_json::from_str(&content)
            .map_err(|e| IngestError::Ai(format!("unparseable extraction response: {e}").into()))
    }

    async fn classify_category(&self, title: &str, skills: &[String]) -> Result<String> {
        let slugs: Vec<&str> = Category::ALL.iter().map(|c| c.as_slug()).collect();
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "enum": slugs}
            },
            "required": ["category"],
            "additionalProperties": false
        });

        #[derive(Deserialize)]
        struct CategoryResponse {
            category: String,
        }

        let user = if skills.is_empty() {
            format!("Job title: {title}")
        } else {
            format!("Job title: {title}\nSkills: {}", skills.join(", "))
        };

        let content = self
            .generate_structured(
                "Pick the single best category for this job posting.",
                &user,
                "job_category",
                schema,
            )
            .await?;

        let response: CategoryResponse = serde_json::from_str(&content)
            .map_err(|e| IngestError::Ai(format!("unparseable category response: {e}").into()))?;
        Ok(response.category)
    }

    async fn is_relevant(&self, title: &str, excerpt: &str) -> Result<bool> {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"relevant": {"type": "boolean"}},
            "required": ["relevant"],
            "additionalProperties": false
        });

        #[derive(Deserialize)]
        struct RelevanceResponse {
            relevant: bool,
        }

        let content = self
            .generate_structured(
                "Decide whether this posting is a real job ad for a technology \
                 or technology-adjacent role, as opposed to spam, a service \
                 offering, or an unrelated profession.",
                &format!("Title: {title}\n\n{excerpt}"),
                "relevance",
                schema,
            )
            .await?;

        let response: RelevanceResponse = serde_json::from_str(&content)
            .map_err(|e| IngestError::Ai(format!("unparseable relevance response: {e}").into()))?;
        Ok(response.relevant)
    }

    async fn infer_remote(&self, location: &str) -> Result<bool> {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"remote": {"type": "boolean"}},
            "required": ["remote"],
            "additionalProperties": false
        });

        #[derive(Deserialize)]
        struct RemoteResponse {
            remote: bool,
        }

        let content = self
            .generate_structured(
                "Does this job location string describe fully remote work? \
                 Answer false when in doubt.",
                location,
                "remote_verdict",
                schema,
            )
            .await?;

        let response: RemoteResponse = serde_json::from_str(&content)
            .map_err(|e| IngestError::Ai(format!("unparseable remote response: {e}").into()))?;
        Ok(response.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let ai = OpenAi::new("key")
            .with_model("gpt-4o")
            .with_base_url("https://proxy.test/v1");
        assert_eq!(ai.model, "gpt-4o");
        assert_eq!(ai.base_url, "https://proxy.test/v1");
    }

    #[test]
    fn test_extraction_schema_matches_struct() {
        // Every field the schema names must deserialize into the struct.
        let sample = serde_json::json!({
            "title": "Backend Engineer",
            "company": "Acme",
            "is_remote": true,
            "location": null,
            "salary_min": 100000,
            "salary_max": 140000,
            "salary_currency": "USD",
            "salary_period": "year",
            "skills": ["rust"],
            "level": "senior",
            "employment_type": "full_time",
            "benefits": [],
            "contact_email": null
        });
        let extracted: ExtractedPosting = serde_json::from_value(sample).unwrap();
        assert_eq!(extracted.title.as_deref(), Some("Backend Engineer"));
        assert!(extracted.has_salary());
    }

    #[test]
    fn test_category_schema_covers_closed_set() {
        let slugs: Vec<&str> = Category::ALL.iter().map(|c| c.as_slug()).collect();
        assert!(slugs.contains(&"unclassified"));
        assert_eq!(slugs.len(), Category::ALL.len());
    }
}
