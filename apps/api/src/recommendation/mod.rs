// Learning-path recommendation: prompt building, response normalization,
// provider fallback and the HTTP handler in front of them.
// All provider calls go through llm_client; no direct HTTP calls here.

pub mod extract;
pub mod handlers;
pub mod mock;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
