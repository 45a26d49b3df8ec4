//! Request and plan data models for the Recommendation API.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::errors::AppError;
use crate::llm_client::providers::ProviderKind;

// ────────────────────────────────────────────────────────────────────────────
// Request side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "advanced" => Ok(ExperienceLevel::Advanced),
            other => Err(format!(
                "experience_level must be one of beginner, intermediate, advanced (got '{other}')"
            )),
        }
    }
}

/// Skills arrive either as a JSON array or as the raw comma-separated form input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    fn into_skills(self) -> Vec<String> {
        let raw = match self {
            SkillsInput::List(list) => list,
            SkillsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Body of `POST /api/recommend`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendBody {
    pub skills: Option<SkillsInput>,
    pub goal: Option<String>,
    pub experience_level: Option<String>,
}

/// A validated recommendation request: at least one skill and a non-blank goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub skills: Vec<String>,
    pub goal: String,
    pub experience_level: ExperienceLevel,
}

impl TryFrom<RecommendBody> for RecommendationRequest {
    type Error = AppError;

    fn try_from(body: RecommendBody) -> Result<Self, Self::Error> {
        let skills = body.skills.map(SkillsInput::into_skills).unwrap_or_default();
        let goal = body.goal.map(|g| g.trim().to_string()).unwrap_or_default();

        let mut missing = Vec::new();
        if skills.is_empty() {
            missing.push("skills");
        }
        if goal.is_empty() {
            missing.push("goal");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let experience_level = match body.experience_level.as_deref().map(str::trim) {
            None | Some("") => ExperienceLevel::default(),
            Some(level) => level.parse::<ExperienceLevel>().map_err(AppError::Validation)?,
        };

        Ok(RecommendationRequest {
            skills,
            goal,
            experience_level,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plan side
// ────────────────────────────────────────────────────────────────────────────
//
// Models rarely follow the requested shape exactly. Once the first path has
// passed the validity predicate, nothing else may reject a plan: wrong-typed
// or null fields fall back to their defaults, numeric strings are parsed, and
// bare strings in a list become entries named after them. Numbers are kept as
// `serde_json::Number` so integers are echoed back as integers.

/// List entries a model sometimes emits as a bare string instead of an object.
trait FromBareText {
    fn from_bare_text(text: String) -> Self;
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(text_of(Value::deserialize(deserializer)?))
}

/// Numbers pass through; numeric strings are parsed; anything else (`"4-6"`,
/// `null`, objects) is treated as absent.
fn lenient_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Number>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(n),
        Value::String(s) => serde_json::from_str::<Number>(s.trim()).ok(),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromBareText,
{
    Ok(lenient_items(Value::deserialize(deserializer)?))
}

/// Keeps the entries of a JSON array that can stand for a `T`. Never fails:
/// a non-array yields an empty list.
fn lenient_items<T: DeserializeOwned + FromBareText>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(T::from_bare_text(text)),
            object @ Value::Object(_) => serde_json::from_value(object).ok(),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl FromBareText for Resource {
    fn from_bare_text(text: String) -> Self {
        Resource {
            name: text.clone(),
            url: text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_time_hours: Option<Number>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub resources: Vec<Resource>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub why: Option<String>,
}

impl FromBareText for Step {
    fn from_bare_text(title: String) -> Self {
        Step {
            title,
            description: String::new(),
            estimated_time_hours: None,
            resources: Vec::new(),
            why: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_weeks: Option<Number>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub steps: Vec<Step>,
}

impl FromBareText for LearningPath {
    fn from_bare_text(title: String) -> Self {
        LearningPath {
            title,
            level: String::new(),
            duration_weeks: None,
            steps: Vec::new(),
        }
    }
}

/// The one shape the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub paths: Vec<LearningPath>,
}

impl CanonicalResponse {
    /// Builds a plan from arbitrary JSON, keeping whatever fits the canonical
    /// shape. Infallible; validity is the caller's concern.
    pub fn from_json_lenient(mut value: Value) -> Self {
        let paths = value
            .get_mut("paths")
            .map(Value::take)
            .unwrap_or_default();
        CanonicalResponse {
            paths: lenient_items(paths),
        }
    }
}

/// Who produced a plan. Serialized as the provider id or `"mock"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Provider(ProviderKind),
    Mock,
}

impl PlanSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanSource::Provider(kind) => kind.id(),
            PlanSource::Mock => "mock",
        }
    }
}

impl Serialize for PlanSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A finished recommendation: the plan plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub plan: CanonicalResponse,
    #[serde(rename = "_source")]
    pub source: PlanSource,
}
