use crate::engine::ChartData;
use crate::error::PredictError;
use crate::routes::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Deserialize)]
pub struct Body {
    symbol: Option<String>,
    timeframe: Option<String>,
}

fn default_symbol() -> String {
    "bitcoin".to_string()
}

fn default_timeframe() -> String {
    "24h".to_string()
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response<T> {
    Success { data: T },
    Error { message: String },
}

fn failure<T>(error: PredictError) -> (StatusCode, Json<Response<T>>) {
    (
        error.status(),
        Json(Response::Error {
            message: error.to_string(),
        }),
    )
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Body>, JsonRejection>,
) -> (StatusCode, Json<Response<ChartData>>) {
    let payload = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            return failure(PredictError::InvalidRequest(rejection.body_text()));
        }
    };

    let symbol = payload.symbol.unwrap_or_else(default_symbol);
    let timeframe = payload.timeframe.unwrap_or_else(default_timeframe);
    let symbol = symbol.trim();
    let timeframe = timeframe.trim();

    let result = if symbol.is_empty() {
        Err(PredictError::InvalidRequest("symbol must not be empty".to_string()))
    } else if timeframe.is_empty() {
        Err(PredictError::InvalidRequest("timeframe must not be empty".to_string()))
    } else {
        info!(symbol, timeframe, "prediction requested");
        state.engine.run(symbol, timeframe).await
    };

    match result {
        Ok(data) => {
            info!(symbol, "prediction served");
            (StatusCode::OK, Json(Response::Success { data }))
        }
        Err(error) => {
            warn!(symbol, error = %error, "prediction failed");
            failure(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::coingecko::MarketClient;
    use crate::engine::Engine;
    use crate::model::{LanguageModel, ModelError};
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    struct Canned(&'static str);

    #[async_trait]
    impl LanguageModel for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    fn state(base_url: String) -> AppState {
        let engine = Engine::new(
            MarketClient::new(base_url),
            Arc::new(Canned("```json\n{\"analysis\": \"steady\"}\n```")),
            6,
        );
        AppState {
            engine: Arc::new(engine),
        }
    }

    #[tokio::test]
    async fn missing_and_null_fields_use_defaults() {
        let server = MockServer::start_async().await;
        let price = server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price").query_param("ids", "bitcoin");
                then.status(503);
            })
            .await;

        let body: Body = serde_json::from_value(json!({ "symbol": null })).unwrap();
        let (status, _) = predict(State(state(server.base_url())), Ok(Json(body))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        price.assert_async().await;
    }

    #[test]
    fn envelopes_are_tagged_by_status() {
        let ok = serde_json::to_value(Response::Success { data: 1 }).unwrap();
        let err = serde_json::to_value(Response::<()>::Error {
            message: "boom".to_string(),
        })
        .unwrap();

        assert_eq!(ok, json!({ "status": "success", "data": 1 }));
        assert_eq!(err, json!({ "status": "error", "message": "boom" }));
    }

    #[tokio::test]
    async fn price_failure_returns_error_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price");
                then.status(503);
            })
            .await;

        let body = Body {
            symbol: Some("bitcoin".to_string()),
            timeframe: Some("24h".to_string()),
        };
        let (status, Json(response)) = predict(State(state(server.base_url())), Ok(Json(body))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        match response {
            Response::Error { message } => assert!(message.contains("Failed to get current price")),
            Response::Success { .. } => panic!("expected an error response"),
        }
    }

    #[tokio::test]
    async fn successful_prediction_echoes_symbol_and_price() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price").query_param("ids", "ethereum");
                then.status(200).json_body(json!({ "ethereum": { "usd": 3100.25 } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/ethereum/market_chart");
                then.status(200)
                    .json_body(json!({ "prices": [[1_700_000_000_000i64, 3099.0]] }));
            })
            .await;

        let body = Body {
            symbol: Some("ethereum".to_string()),
            timeframe: Some("12h".to_string()),
        };
        let (status, Json(response)) = predict(State(state(server.base_url())), Ok(Json(body))).await;

        assert_eq!(status, StatusCode::OK);
        match response {
            Response::Success { data } => {
                assert_eq!(data.symbol, "ethereum");
                assert_eq!(data.timeframe, "12h");
                assert_eq!(data.current_price, 3100.25);
                assert_eq!(data.analysis.as_deref(), Some("steady"));
                assert!(data.trend_analysis.is_none());
            }
            Response::Error { message } => panic!("unexpected error: {message}"),
        }
    }

    #[tokio::test]
    async fn blank_symbol_is_rejected() {
        let body = Body {
            symbol: Some("  ".to_string()),
            timeframe: Some("24h".to_string()),
        };
        let (status, _) = predict(State(state("http://127.0.0.1:9".to_string())), Ok(Json(body))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
