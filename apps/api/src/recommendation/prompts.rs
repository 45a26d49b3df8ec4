// All LLM prompt material for the Recommendation module.

use serde_json::{json, Value};

use crate::llm_client::FunctionSchema;
use crate::recommendation::models::ExperienceLevel;

/// System prompt for every provider. Enforces JSON-only output.
pub const RECOMMEND_SYSTEM: &str = "You are a helpful career coach that outputs strict JSON.";

/// Name of the function the structured provider is forced to call.
pub const LEARNING_PATHS_FUNCTION: &str = "emit_learning_paths";

/// Builds the user prompt for a learning plan. Pure and deterministic.
pub fn build_prompt(skills: &[String], goal: &str, experience_level: ExperienceLevel) -> String {
    format!(
        r#"You are an expert career coach and must respond ONLY with valid JSON.
Do not include explanations, introductions, or markdown formatting.
Do NOT wrap the JSON in code fences.

Input:
SKILLS: {skills}
GOAL: {goal}
EXPERIENCE_LEVEL: {experience_level}

Recommend between 1 and 2 learning paths. Each path must have between 3 and 5 steps.
Every resource url must be a complete, valid URL.

Output JSON structure:
{{
  "paths": [
    {{
      "title": "string",
      "level": "string",
      "duration_weeks": number,
      "steps": [
        {{
          "title": "string",
          "description": "string",
          "estimated_time_hours": number,
          "resources": [{{"name": "string", "url": "string"}}],
          "why": "string"
        }}
      ]
    }}
  ]
}}
Return only valid JSON."#,
        skills = skills.join(", "),
    )
}

/// JSON schema for the canonical `{paths: [...]}` shape.
pub fn learning_paths_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "paths": {
                "type": "array",
                "minItems": 1,
                "maxItems": 2,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "level": {"type": "string"},
                        "duration_weeks": {"type": "number"},
                        "steps": {
                            "type": "array",
                            "minItems": 3,
                            "maxItems": 5,
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": {"type": "string"},
                                    "description": {"type": "string"},
                                    "estimated_time_hours": {"type": "number"},
                                    "resources": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "name": {"type": "string"},
                                                "url": {"type": "string", "format": "uri"}
                                            },
                                            "required": ["name", "url"]
                                        }
                                    },
                                    "why": {"type": "string"}
                                },
                                "required": ["title", "description", "resources"]
                            }
                        }
                    },
                    "required": ["title", "level", "steps"]
                }
            }
        },
        "required": ["paths"]
    })
}

pub fn learning_paths_function() -> FunctionSchema {
    FunctionSchema {
        name: LEARNING_PATHS_FUNCTION,
        description: "Return the recommended learning paths in the canonical shape.",
        parameters: learning_paths_schema(),
    }
}
