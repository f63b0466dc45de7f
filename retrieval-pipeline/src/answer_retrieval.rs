use common::storage::types::system_prompts::{
    ANSWER_CUE, ANSWER_FORMAT_INSTRUCTIONS, DEFAULT_IMAGE_ANALYSIS_PROMPT,
    DIRECTIVE_PROMPT_INSTRUCTIONS, HIGH_CONFIDENCE_CONTEXT_HEADER, HIGH_CONFIDENCE_INSTRUCTIONS,
    IMAGE_QUESTION_INSTRUCTIONS, LOW_CONFIDENCE_INSTRUCTIONS, MEDICAL_ASSISTANT_PERSONA,
    MEDIUM_CONFIDENCE_CONTEXT_HEADER, MEDIUM_CONFIDENCE_INSTRUCTIONS, PATIENT_QUESTION_LABEL,
};

use crate::{tier::ConfidenceTier, RetrievedDocument};

/// Builds the generation prompt for the given tier.
///
/// Only `High` and `Medium` embed retrieved answers; `Low` relies on general knowledge.
pub fn compose(tier: ConfidenceTier, query: &str, matches: &[RetrievedDocument]) -> String {
    let (context, instructions) = match tier {
        ConfidenceTier::High => (
            Some(format!(
                "{HIGH_CONFIDENCE_CONTEXT_HEADER}\n{}",
                matches_to_context(matches, true)
            )),
            HIGH_CONFIDENCE_INSTRUCTIONS,
        ),
        ConfidenceTier::Medium => (
            Some(format!(
                "{MEDIUM_CONFIDENCE_CONTEXT_HEADER}\n{}",
                matches_to_context(matches, false)
            )),
            MEDIUM_CONFIDENCE_INSTRUCTIONS,
        ),
        ConfidenceTier::Low => (None, LOW_CONFIDENCE_INSTRUCTIONS),
    };

    let mut prompt = String::from(MEDICAL_ASSISTANT_PERSONA);
    prompt.push_str("\n\n");
    if let Some(context) = context {
        prompt.push_str(&context);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!(
        "{PATIENT_QUESTION_LABEL} {query}\n\n{instructions}\n\n{ANSWER_FORMAT_INSTRUCTIONS}\n\n{ANSWER_CUE}"
    ));
    prompt
}

/// Escalation prompt used when the tiered answer was too short or refused.
pub fn compose_directive(query: &str) -> String {
    format!(
        "{MEDICAL_ASSISTANT_PERSONA}\n\n{PATIENT_QUESTION_LABEL} {query}\n\n{DIRECTIVE_PROMPT_INSTRUCTIONS}\n\n{ANSWER_CUE}"
    )
}

/// Instructions sent alongside an uploaded image.
pub fn compose_image_prompt(user_prompt: Option<&str>) -> String {
    match user_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(question) => format!(
            "{MEDICAL_ASSISTANT_PERSONA}\n\n{IMAGE_QUESTION_INSTRUCTIONS}\n\n{PATIENT_QUESTION_LABEL} {question}\n\n{ANSWER_FORMAT_INSTRUCTIONS}"
        ),
        None => DEFAULT_IMAGE_ANALYSIS_PROMPT.to_string(),
    }
}

fn matches_to_context(matches: &[RetrievedDocument], with_similarity: bool) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(position, m)| {
            let mut entry = format!(
                "{}. [{}] {}\n   {}",
                position + 1,
                m.document.category,
                m.document.question,
                m.document.answer
            );
            if with_similarity {
                entry.push_str(&format!("\n   (similarity: {:.2})", m.similarity));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
