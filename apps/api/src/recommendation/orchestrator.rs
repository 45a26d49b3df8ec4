//! Fallback Orchestrator: tries each configured provider in priority order
//! and degrades to the mock plan when none of them produces a valid plan.
//!
//! Flow per request:
//!   no providers → mock
//!   for provider in priority order:
//!       prompt → call → normalize → success? return tagged plan
//!       any failure → log, next provider
//!   exhausted (or deadline spent) → mock
//!
//! Attempts are strictly sequential. Each one is bounded by
//! `min(provider_timeout, time left before the request deadline)`; running
//! out of time counts as a transport failure for that provider.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm_client::providers::ProviderConfig;
use crate::llm_client::{FunctionSchema, ProviderCallError, ProviderCaller, TransportError};
use crate::recommendation::mock::mock_plan;
use crate::recommendation::models::{
    CanonicalResponse, PlanSource, Recommendation, RecommendationRequest,
};
use crate::recommendation::normalizer::{normalize, FormatError};
use crate::recommendation::prompts::{build_prompt, learning_paths_function, RECOMMEND_SYSTEM};

/// Why a single provider attempt did not produce a plan.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Call(#[from] ProviderCallError),

    #[error("unusable response: {0}")]
    Format(#[from] FormatError),
}

pub struct Recommender {
    providers: Vec<ProviderConfig>,
    caller: Arc<dyn ProviderCaller>,
    schema: FunctionSchema,
    provider_timeout: Duration,
    request_timeout: Duration,
}

impl Recommender {
    pub fn new(config: &Config, caller: Arc<dyn ProviderCaller>) -> Self {
        Self {
            providers: config.providers.clone(),
            caller,
            schema: learning_paths_function(),
            provider_timeout: config.provider_timeout,
            request_timeout: config.request_timeout,
        }
    }

    /// Ids of the configured providers, in attempt order.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.kind.id()).collect()
    }

    /// Never fails: the worst case is the mock plan.
    pub async fn recommend(&self, request: &RecommendationRequest) -> Recommendation {
        if self.providers.is_empty() {
            info!("No provider credentials configured, serving mock plan");
            return self.mock(request);
        }

        let prompt = build_prompt(&request.skills, &request.goal, request.experience_level);
        let deadline = Instant::now() + self.request_timeout;

        for provider in &self.providers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Request deadline reached before trying {}", provider.kind);
                break;
            }

            match self
                .attempt(provider, &prompt, remaining.min(self.provider_timeout))
                .await
            {
                Ok(plan) => {
                    info!(
                        "Plan from {} ({} path(s))",
                        provider.kind,
                        plan.paths.len()
                    );
                    return Recommendation {
                        plan,
                        source: PlanSource::Provider(provider.kind),
                    };
                }
                Err(e) => warn!("Provider {} failed: {e}", provider.kind),
            }
        }

        info!("All providers failed, serving mock plan");
        self.mock(request)
    }

    async fn attempt(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
        limit: Duration,
    ) -> Result<CanonicalResponse, AttemptError> {
        let schema = provider
            .kind
            .supports_structured_schema()
            .then_some(&self.schema);

        let raw = tokio::time::timeout(
            limit,
            self.caller.call(provider, RECOMMEND_SYSTEM, prompt, schema),
        )
        .await
        .map_err(|_| ProviderCallError::Transport(TransportError::Timeout(limit)))??;

        debug!("Raw {} response: {raw}", provider.kind);

        Ok(normalize(&raw)?)
    }

    fn mock(&self, request: &RecommendationRequest) -> Recommendation {
        Recommendation {
            plan: mock_plan(request),
            source: PlanSource::Mock,
        }
    }
}
