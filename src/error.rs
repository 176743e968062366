use axum::http::StatusCode;
use thiserror::Error;

/// Failures that abort a prediction request.
///
/// Everything else in the pipeline degrades to a default value instead of
/// surfacing here.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("Failed to get current price: {0}")]
    PriceUnavailable(String),
    #[error("Failed to get a forecast from the language model: {0}")]
    ModelUnavailable(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PredictError::PriceUnavailable(_) | PredictError::ModelUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors raised while talking to the market-data provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("missing field `{0}` in response")]
    MissingField(&'static str),
    #[error("no quote for `{0}` in response")]
    MissingQuote(String),
}
