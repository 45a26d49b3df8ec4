//! Deterministic fallback plan, served when no provider is configured or every
//! provider attempt failed. Always passes the normalizer's validity predicate.

use serde_json::Number;

use crate::recommendation::models::{
    CanonicalResponse, ExperienceLevel, LearningPath, RecommendationRequest, Resource, Step,
};

fn duration_weeks(level: ExperienceLevel) -> u64 {
    match level {
        ExperienceLevel::Beginner => 12,
        ExperienceLevel::Intermediate => 8,
        ExperienceLevel::Advanced => 6,
    }
}

fn resource(name: &str, url: &str) -> Resource {
    Resource {
        name: name.to_string(),
        url: url.to_string(),
    }
}

/// Builds the mock plan for a request. Same request, same plan.
pub fn mock_plan(request: &RecommendationRequest) -> CanonicalResponse {
    let goal = &request.goal;
    let level = request.experience_level;
    let skills = request.skills.join(", ");
    let lead_skill = request
        .skills
        .first()
        .map(String::as_str)
        .unwrap_or("your current skills");

    let steps = vec![
        Step {
            title: format!("Consolidate {lead_skill}"),
            description: format!(
                "Review and deepen what you already know ({skills}) with {goal} in mind."
            ),
            estimated_time_hours: Some(Number::from(10u64)),
            resources: vec![resource("roadmap.sh", "https://roadmap.sh")],
            why: Some(format!("Existing strengths are the fastest route to {goal}")),
        },
        Step {
            title: format!("Core concepts for {goal}"),
            description: format!(
                "Work through the fundamentals a {level} {goal} is expected to know."
            ),
            estimated_time_hours: Some(Number::from(20u64)),
            resources: vec![resource("freeCodeCamp", "https://www.freecodecamp.org/learn")],
            why: Some(format!("Fills the gaps between {skills} and {goal}")),
        },
        Step {
            title: format!("Build a {goal} portfolio project"),
            description: format!(
                "Ship a small end-to-end project that combines {skills} and publish it."
            ),
            estimated_time_hours: Some(Number::from(30u64)),
            resources: vec![resource("GitHub", "https://github.com/explore")],
            why: Some("Demonstrable work is what reviewers look at first".to_string()),
        },
    ];

    CanonicalResponse {
        paths: vec![LearningPath {
            title: format!("{goal} Path"),
            level: level.to_string(),
            duration_weeks: Some(duration_weeks(level).into()),
            steps,
        }],
    }
}
