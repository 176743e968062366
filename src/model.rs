use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(reqwest::Error),
    #[error("model returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("model reply contained no text")]
    EmptyReply,
}

// The request URL is dropped so nothing about the endpoint or its
// credentials reaches an error message.
impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        ModelError::Http(err.without_url())
    }
}

/// A generative text model: prompt in, free-form text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
