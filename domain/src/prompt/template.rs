//! Prompt templates for the deliberation flow

use crate::enforcement::violation::Violation;
use crate::prompt::parts::PromptParts;

/// Templates for generating prompts at each phase
pub struct DeliberationPrompts;

impl DeliberationPrompts {
    /// Strategy-phase prompt: the coordinator plans before dispatching.
    ///
    /// `agents` is a list of `(name, domain)` pairs for the roster.
    pub fn strategy(task_content: &str, agents: &[(String, String)]) -> PromptParts {
        let agent_info = agents
            .iter()
            .map(|(name, domain)| format!("{name} ({domain})"))
            .collect::<Vec<_>>()
            .join(", ");

        PromptParts::new(
            "You are coordinating a team of specialist agents. Plan before dispatching.",
            format!(
                r#"You are coordinating {count} specialist agents: {agent_info}.

Task: {task_content}

Before dispatching the team, plan your strategy:
1. How does this task decompose into sub-problems?
2. What should each agent specifically focus on?
3. What disagreements do you anticipate between agents?
4. What are the success criteria?

Return JSON: {{"task_decomposition": [...], "agent_focus_areas": {{...}}, "anticipated_tensions": [...], "success_criteria": [...]}}"#,
                count = agents.len(),
            ),
        )
    }

    /// Synthesis-phase prompt. Evidence fields must survive verbatim.
    pub fn synthesis(analyses_json: &str) -> PromptParts {
        PromptParts::new(
            "You are synthesizing specialist analyses into a single recommendation.",
            format!(
                r#"Synthesize these specialist analyses into a recommendation.

CRITICAL: Preserve ALL evidence fields from each observation. Do NOT summarize away supporting quotes, data, or citations.

Analyses:
{analyses_json}

Return JSON: {{"recommended_direction": "...", "key_findings": [{{"agent_name": ..., "finding": ..., "evidence": ..., "confidence": ...}}], "trade_offs": [...], "minority_views": [...]}}"#,
            ),
        )
    }

    /// Correction prompt sent when a response is rejected by enforcement.
    ///
    /// Only critical violations are listed; warnings ride along as flags.
    pub fn correction(original: &str, violations: &[Violation]) -> PromptParts {
        const MAX_ORIGINAL: usize = 3000;

        let violation_list = violations
            .iter()
            .filter(|v| v.is_critical())
            .map(|v| {
                format!(
                    "- [CRITICAL] {} (found: '{}'). Fix: {}",
                    v.message, v.location, v.suggestion
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let truncated = truncate_at_boundary(original, MAX_ORIGINAL);

        PromptParts::new(
            "You are a response corrector. Rewrite the agent response to fix all \
             listed violations. Preserve the original findings and evidence but \
             remove speculation, opinions, hedging, and fake confidence scores. \
             Use evidence level tags: [VERIFIED: source:ref], \
             [CORROBORATED: src1 + src2], [INDICATED: source], or [POSSIBLE]. \
             Return ONLY the corrected JSON observations, same structure as the \
             original.",
            format!("Fix these violations:\n{violation_list}"),
        )
        .with_context(format!("Original response:\n{truncated}"))
    }

    /// Cross-check prompt comparing specialist consultations in chat
    pub fn cross_check(consultation_summary: &str) -> PromptParts {
        PromptParts::new(
            r#"You are a cross-checker. Compare specialist responses and identify:
1. Points where specialists AGREE (consensus)
2. Points where specialists DISAGREE (conflicts)
3. An agreement_level from 0.0 (total conflict) to 1.0 (full agreement)

Return JSON: {"agreement_level": float, "consensus_points": [...], "conflicts": [{"point": str, "views": [...]}]}"#,
            format!("Specialist responses:\n{consultation_summary}"),
        )
    }

    /// Stable system prompt for the chat orchestrator.
    ///
    /// `specialists` is a list of `(name, domain)` pairs for healthy agents.
    pub fn chat_system(specialists: &[(String, String)]) -> String {
        let mut prompt = String::from(
            r#"You are a chat orchestrator that helps users by consulting specialist agents when needed.

Rules:
- For simple questions you can answer directly
- For domain-specific questions, consult relevant specialists
- ALWAYS cite evidence for factual claims
- If specialists disagree, present BOTH views with evidence
- Never hide uncertainty, tell the user when confidence is low
- If a question is too complex for chat, suggest a full deliberation round
"#,
        );
        if !specialists.is_empty() {
            prompt.push_str("\nAvailable specialists:\n");
            for (name, domain) in specialists {
                prompt.push_str(&format!("  - {name}: {domain}\n"));
            }
        }
        prompt
    }
}

/// Truncate on a char boundary at or below `max_bytes`
fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<(String, String)> {
        vec![
            ("analyst".to_string(), "data analysis".to_string()),
            ("reviewer".to_string(), "code review".to_string()),
        ]
    }

    #[test]
    fn test_strategy_names_every_agent() {
        let parts = DeliberationPrompts::strategy("audit the gateway", &roster());
        assert!(parts.user_message.contains("analyst (data analysis)"));
        assert!(parts.user_message.contains("reviewer (code review)"));
        assert!(parts.user_message.contains("task_decomposition"));
    }

    #[test]
    fn test_synthesis_demands_evidence_preservation() {
        let parts = DeliberationPrompts::synthesis("[]");
        assert!(parts.user_message.contains("Preserve ALL evidence fields"));
    }

    #[test]
    fn test_correction_lists_only_criticals() {
        let violations = vec![
            Violation::critical("r1", "no speculation").at("probably"),
            Violation::warning("r2", "hedging").at("might be"),
        ];
        let parts = DeliberationPrompts::correction("probably broken", &violations);
        assert!(parts.user_message.contains("no speculation"));
        assert!(!parts.user_message.contains("hedging"));
        assert!(parts.context.contains("probably broken"));
    }

    #[test]
    fn test_correction_truncates_long_originals() {
        let original = "x".repeat(10_000);
        let parts = DeliberationPrompts::correction(&original, &[]);
        assert!(parts.context.len() < 4000);
    }

    #[test]
    fn test_chat_system_lists_specialists() {
        let prompt = DeliberationPrompts::chat_system(&roster());
        assert!(prompt.contains("analyst: data analysis"));
    }
}
