use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),
}

/// Where a request comes from; selects the service's prompt family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiContext {
    Notes,
    Flashcards,
}

impl fmt::Display for AiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiContext::Notes => f.write_str("Notes"),
            AiContext::Flashcards => f.write_str("Flashcards"),
        }
    }
}

/// Operation keyword sent to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    Continue,
    Summarize,
    Improve,
    Multigen,
    Predict,
    /// Free text typed by the user
    Custom(String),
}

impl Keyword {
    /// Known keywords map to themselves; anything else is a custom prompt
    pub fn parse(input: &str) -> Self {
        match input {
            "continue" => Keyword::Continue,
            "summarize" => Keyword::Summarize,
            "improve" => Keyword::Improve,
            "multigen" => Keyword::Multigen,
            "predict" => Keyword::Predict,
            other => Keyword::Custom(other.to_string()),
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            Keyword::Continue => "continue",
            Keyword::Summarize => "summarize",
            Keyword::Improve => "improve",
            Keyword::Multigen => "multigen",
            Keyword::Predict => "predict",
            Keyword::Custom(_) => "custom",
        }
    }

    /// Whether the request must carry the note's current markdown
    pub fn needs_content(&self) -> bool {
        matches!(self, Keyword::Continue | Keyword::Improve)
    }
}

/// One call to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub context: AiContext,
    pub keyword: Keyword,
    /// File id for note requests, flashcard id for predictions
    pub context_id: u64,
    /// Extracted markdown for keywords that need it
    pub content: Option<String>,
}

impl GenerationRequest {
    pub fn new(context: AiContext, keyword: Keyword, context_id: u64) -> Self {
        Self {
            context,
            keyword,
            context_id,
            content: None,
        }
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Path below the service root
    pub fn path(&self) -> String {
        format!("askAI/{}/{}", self.context, self.keyword.path_segment())
    }

    pub fn body(&self) -> Value {
        match &self.keyword {
            Keyword::Summarize | Keyword::Multigen => json!({ "fileId": self.context_id }),
            Keyword::Continue | Keyword::Improve => json!({
                "fileId": self.context_id,
                "notes": self.content.clone().unwrap_or_default(),
            }),
            Keyword::Predict => json!({ "flashcardId": self.context_id }),
            Keyword::Custom(prompt) => json!({ "prompt": prompt }),
        }
    }
}

/// Something that turns a request into generated markdown
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    message: String,
}

/// HTTP client for the `/askAI` endpoints
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, request: &GenerationRequest) -> String {
        format!("{}/{}", self.base_url, request.path())
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = self.url_for(request);
        log::debug!("POST {url}");

        let response = self.client.post(&url).json(&request.body()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerationResponse = response.json().await?;
        Ok(parsed.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("continue", Keyword::Continue)]
    #[case("summarize", Keyword::Summarize)]
    #[case("predict", Keyword::Predict)]
    #[case("explain osmosis", Keyword::Custom("explain osmosis".to_string()))]
    fn test_keyword_parse(#[case] input: &str, #[case] expected: Keyword) {
        assert_eq!(Keyword::parse(input), expected);
    }

    #[test]
    fn test_request_bodies_per_keyword() {
        let summarize = GenerationRequest::new(AiContext::Notes, Keyword::Summarize, 4);
        assert_eq!(summarize.body(), json!({"fileId": 4}));
        assert_eq!(summarize.path(), "askAI/Notes/summarize");

        let improve = GenerationRequest::new(AiContext::Notes, Keyword::Improve, 4)
            .with_content("Hello\n".to_string());
        assert_eq!(improve.body(), json!({"fileId": 4, "notes": "Hello\n"}));

        let predict = GenerationRequest::new(AiContext::Flashcards, Keyword::Predict, 9);
        assert_eq!(predict.body(), json!({"flashcardId": 9}));
        assert_eq!(predict.path(), "askAI/Flashcards/predict");

        let custom =
            GenerationRequest::new(AiContext::Notes, Keyword::Custom("a poem".to_string()), 4);
        assert_eq!(custom.body(), json!({"prompt": "a poem"}));
        assert_eq!(custom.path(), "askAI/Notes/custom");
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let client =
            HttpGenerationClient::new("http://localhost:8008/", Duration::from_secs(1)).unwrap();
        let request = GenerationRequest::new(AiContext::Notes, Keyword::Continue, 1);

        assert_eq!(client.url_for(&request), "http://localhost:8008/askAI/Notes/continue");
    }

    #[test]
    fn test_only_continue_and_improve_need_content() {
        assert!(Keyword::Continue.needs_content());
        assert!(Keyword::Improve.needs_content());
        assert!(!Keyword::Summarize.needs_content());
        assert!(!Keyword::Custom("x".to_string()).needs_content());
    }
}
