pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/recommend",
            post(handlers::handle_recommend).fallback(handlers::handle_method_not_allowed),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::providers::{ProviderConfig, ProviderKind};
    use crate::llm_client::{
        FunctionSchema, ProviderCallError, ProviderCaller, ProviderClient, TransportError,
    };
    use crate::recommendation::orchestrator::Recommender;

    /// Fails for OpenAI, answers a fenced plan for everyone else.
    struct FlakyPrimary;

    #[async_trait]
    impl ProviderCaller for FlakyPrimary {
        async fn call(
            &self,
            provider: &ProviderConfig,
            _system: &str,
            _prompt: &str,
            _schema: Option<&FunctionSchema>,
        ) -> Result<Value, ProviderCallError> {
            match provider.kind {
                ProviderKind::OpenAi => Err(ProviderCallError::Transport(
                    TransportError::ContentType("text/html".to_string()),
                )),
                ProviderKind::OpenRouter => Ok(json!({
                    "choices": [{"message": {"content": format!("```json\n{}\n```", plan())}}]
                })),
            }
        }
    }

    fn plan() -> Value {
        let step = json!({
            "title": "Pandas",
            "description": "DataFrames",
            "resources": [{"name": "Docs", "url": "https://pandas.pydata.org"}]
        });
        json!({"paths": [{"title": "Data Path", "level": "beginner", "steps": [step.clone(), step]}]})
    }

    fn config_with(vars: &[(&str, String)]) -> Config {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    fn app(config: &Config, caller: Arc<dyn ProviderCaller>) -> Router {
        build_router(AppState {
            recommender: Arc::new(Recommender::new(config, caller)),
        })
    }

    fn mock_only_app() -> Router {
        app(&config_with(&[]), Arc::new(FlakyPrimary))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/recommend")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_body_is_400_naming_fields() {
        let (status, body) = send(mock_only_app(), post_json("{}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("skills"));
        assert!(message.contains("goal"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (status, body) = send(mock_only_app(), post_json("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_get_is_405() {
        let request = Request::builder()
            .method("GET")
            .uri("/api/recommend")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(mock_only_app(), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["message"], "Only POST");
    }

    #[tokio::test]
    async fn test_no_credentials_returns_mock_with_200() {
        let body = json!({"skills": ["Python"], "goal": "Data Analyst"}).to_string();
        let (status, body) = send(mock_only_app(), post_json(&body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_source"], "mock");
        assert_eq!(body["paths"][0]["title"], "Data Analyst Path");
        assert_eq!(body["paths"][0]["level"], "intermediate");
        assert!(body["paths"][0]["steps"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn test_fallback_result_is_tagged_with_second_provider() {
        let config = config_with(&[
            ("OPENAI_API_KEY", "sk-test".to_string()),
            ("OPENROUTER_API_KEY", "or-test".to_string()),
        ]);
        let body = json!({"skills": "Python, SQL", "goal": "Data Analyst", "experience_level": "beginner"})
            .to_string();
        let (status, body) = send(app(&config, Arc::new(FlakyPrimary)), post_json(&body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_source"], "openrouter");
        assert_eq!(body["paths"][0]["title"], "Data Path");
    }

    #[tokio::test]
    async fn test_health_lists_configured_providers() {
        let config = config_with(&[("OPENROUTER_API_KEY", "or-test".to_string())]);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(&config, Arc::new(FlakyPrimary)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["providers"], json!(["openrouter"]));
    }

    #[tokio::test]
    async fn test_end_to_end_against_mock_provider_endpoints() {
        let server = MockServer::start_async().await;
        let openai = server
            .mock_async(|when, then| {
                when.method(POST).path("/openai");
                then.status(502).body("bad gateway");
            })
            .await;
        let openrouter = server
            .mock_async(|when, then| {
                when.method(POST).path("/openrouter");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "choices": [{"message": {"content": format!("Here you go! {}", plan())}}]
                    }));
            })
            .await;

        let config = config_with(&[
            ("OPENAI_API_KEY", "sk-test".to_string()),
            ("OPENAI_API_URL", server.url("/openai")),
            ("OPENROUTER_API_KEY", "or-test".to_string()),
            ("OPENROUTER_API_URL", server.url("/openrouter")),
        ]);
        let caller = Arc::new(ProviderClient::new(Duration::from_secs(5)));
        let body = json!({"skills": ["Python"], "goal": "Data Analyst"}).to_string();
        let (status, body) = send(app(&config, caller), post_json(&body)).await;

        openai.assert_async().await;
        openrouter.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_source"], "openrouter");
        assert_eq!(body["paths"][0]["steps"][0]["title"], "Pandas");
        assert!(!body.to_string().contains("bad gateway"));
    }
}
