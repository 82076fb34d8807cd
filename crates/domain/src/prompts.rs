//! Prompt construction for analysis and follow-up chat

use crate::model::ChatContext;

/// System prompt for idea analysis; asks for the canonical report schema
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a blunt, experienced startup advisor and market analyst. Evaluate the startup idea you are given (and any attached material) for real-world viability.

Respond with ONLY a JSON object matching this exact schema:
{
  "summaryVerdict": "Promising" | "Risky" | "NeedsRefinement",
  "oneLineTakeaway": "a single sentence verdict",
  "marketReality": "2-4 sentences on market size, demand and timing",
  "pros": ["strength", "..."],
  "cons": ["weakness", "..."],
  "competitors": [{"name": "competitor", "differentiation": "how the idea differs"}],
  "monetizationStrategies": ["strategy", "..."],
  "whyPeoplePay": "why customers would pay for this",
  "viabilityScore": 0 to 100,
  "nextSteps": ["concrete action", "..."]
}

Rules:
- Do not ask clarifying questions; work with what you have
- Be specific and honest, not encouraging by default
- Do not wrap the JSON in markdown or add commentary
"#;

/// User prompt for an analysis request
pub fn analysis_user_prompt(idea: Option<&str>, has_attachment: bool) -> String {
    let idea = idea.map(str::trim).filter(|idea| !idea.is_empty());

    match (idea, has_attachment) {
        (Some(idea), true) => format!(
            "Analyze this startup idea, using the attached material as supporting context:\n\n{}",
            idea
        ),
        (Some(idea), false) => format!("Analyze this startup idea:\n\n{}", idea),
        (None, _) => {
            "Analyze the startup idea described in the attached material.".to_string()
        }
    }
}

/// System prompt for answering follow-up questions about a finished report
pub fn chat_system_prompt(context: &ChatContext) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a startup advisor answering follow-up questions about an idea you already analyzed.\n\n");

    prompt.push_str("## Original Idea\n");
    prompt.push_str(&context.original_idea);
    prompt.push_str("\n\n");

    prompt.push_str("## Your Previous Analysis\n");
    prompt.push_str(&serde_json::to_string_pretty(&context.report.fields).unwrap_or_default());
    prompt.push_str("\n\n");

    prompt.push_str(
        "Answer conversationally in plain text (no JSON). Keep answers concise and specific to this idea.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble_report;
    use crate::normalize::normalize_fields;
    use serde_json::json;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn test_user_prompt_variants() {
        assert!(analysis_user_prompt(Some("Chef marketplace"), false).ends_with("Chef marketplace"));
        assert!(analysis_user_prompt(Some("Chef marketplace"), true).contains("attached material"));
        assert!(analysis_user_prompt(Some("  "), true).contains("described in the attached"));
    }

    #[test]
    fn test_chat_prompt_embeds_report() {
        let fields = normalize_fields(&json!({"oneLineTakeaway": "Niche but real", "viabilityScore": 61}));
        let report = assemble_report(
            fields,
            Some("Chef marketplace"),
            Uuid::nil(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let context = ChatContext {
            original_idea: "Chef marketplace".to_string(),
            report,
        };

        let prompt = chat_system_prompt(&context);
        assert!(prompt.contains("Chef marketplace"));
        assert!(prompt.contains("Niche but real"));
        assert!(prompt.contains("\"viabilityScore\": 61"));
    }
}
