//! Structured-response parsing for deliberation phases.
//!
//! Backend output is free-form text that usually, but not always, contains
//! the JSON the prompt asked for. These helpers recover the structure and
//! leave degradation decisions to the caller — every parse failure has a
//! defined fallback (default plan, raw-text synthesis, original analysis).
//!
//! | Function | Phase | Fallback on failure |
//! |----------|-------|---------------------|
//! | [`parse_strategy`] | Strategy | [`StrategyPlan::fallback`] |
//! | [`parse_synthesis`] | Synthesis | raw text as `recommended_direction` |
//! | [`parse_observations`] | Enforcement rewrite | original analysis stands, flagged |

use super::analysis::Observation;
use super::strategy::StrategyPlan;
use super::synthesis::Synthesis;
use serde::Deserialize;

/// Extract the outermost JSON object embedded in free-form text.
///
/// Finds the first `{` and the last `}`; good enough for backends that
/// wrap JSON in prose or markdown fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extract the outermost JSON array embedded in free-form text
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a strategy-phase response into a [`StrategyPlan`].
///
/// The raw response is preserved in `reasoning` for audit.
pub fn parse_strategy(response: &str) -> Option<StrategyPlan> {
    let json = extract_json_object(response)?;
    let mut plan: StrategyPlan = serde_json::from_str(json).ok()?;
    plan.reasoning = response.to_string();
    Some(plan)
}

/// Parse a synthesis-phase response into a [`Synthesis`].
///
/// Returns `None` when no parseable object is present; the caller
/// preserves the raw text instead of dropping the round's output.
pub fn parse_synthesis(response: &str) -> Option<Synthesis> {
    let json = extract_json_object(response)?;
    serde_json::from_str(json).ok()
}

#[derive(Deserialize)]
struct ObservationsEnvelope {
    #[serde(default)]
    observations: Vec<Observation>,
}

/// Parse a corrected observation list out of an enforcement rewrite.
///
/// Accepts either a bare JSON array of observations or an object with an
/// `observations` field. A corrected analysis only replaces the original
/// when this succeeds — same structural shape or nothing.
pub fn parse_observations(response: &str) -> Option<Vec<Observation>> {
    if let Some(json) = extract_json_array(response)
        && let Ok(observations) = serde_json::from_str::<Vec<Observation>>(json)
    {
        return Some(observations);
    }
    if let Some(json) = extract_json_object(response)
        && let Ok(envelope) = serde_json::from_str::<ObservationsEnvelope>(json)
        && !envelope.observations.is_empty()
    {
        return Some(envelope.observations);
    }
    None
}
