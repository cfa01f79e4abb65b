//! Task prompts sent to the inference backend.
//!
//! Every prompt ends with the same output contract: a single JSON object
//! wrapped in [`SENTINEL`] markers, which is what [`crate::parser`] expects.

use crate::analysis::{AnalysisKind, SENTINEL, UNSAFE_SHORTCUT};

/// Upper bound on the post body forwarded to the model, in characters.
pub const MAX_BODY_CHARS: usize = 8_000;

const SUMMARY_TASK: &str = "You are an analyst monitoring competitor content on social platforms. \
Read the post below (text, link and any attached images) and describe what it is about \
in exactly one sentence.";

const CLASSIFICATION_TASK: &str = "You are an analyst monitoring competitor content on social platforms. \
Read the post below (text, link and any attached images) and classify it.\n\
- content_type: a short lowercase label such as review, tutorial, unboxing, advertisement, vlog or news.\n\
- related_entities: every brand, product or account the post refers to (may be empty).\n\
- summary: what the post is about, in exactly one sentence.";

const SENSITIVITY_TASK: &str = "You are a content safety reviewer. Decide whether the post below \
(text and any attached images) is safe to show on an internal marketing dashboard. \
Content is unsafe if it contains nudity, graphic violence, hate speech or illegal activity.";

fn output_contract(fields: &str) -> String {
    format!(
        "Respond with a single JSON object with the fields {fields}. \
         Put the JSON between two {SENTINEL} markers, for example:\n\
         {SENTINEL}\n{{ ... }}\n{SENTINEL}\n\
         Do not write anything else between the markers."
    )
}

/// Truncate `body` to [`MAX_BODY_CHARS`] characters on a char boundary.
fn clip(body: &str) -> &str {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn render_post(link: &str, body: Option<&str>) -> String {
    let body = body.map(str::trim).filter(|b| !b.is_empty());
    match body {
        Some(body) => format!("Link: {link}\nText:\n{}", clip(body)),
        None => format!("Link: {link}\nText: (none)"),
    }
}

/// Build the analysis prompt for one content item.
pub fn build_analysis_prompt(kind: AnalysisKind, link: &str, body: Option<&str>) -> String {
    let (task, fields) = match kind {
        AnalysisKind::Summary => (SUMMARY_TASK, "\"summary\""),
        AnalysisKind::Classification => (
            CLASSIFICATION_TASK,
            "\"content_type\" (string), \"related_entities\" (array of strings) and \"summary\" (string)",
        ),
    };
    format!(
        "{task}\n\n{}\n\n{}",
        render_post(link, body),
        output_contract(fields)
    )
}

/// Build the sensitivity-check prompt for free text.
pub fn build_sensitivity_prompt(text: &str) -> String {
    format!(
        "{SENSITIVITY_TASK}\n\nText:\n{}\n\n{}\n\
         If you refuse to review the content, reply with only the word {UNSAFE_SHORTCUT}.",
        clip(text.trim()),
        output_contract(
            "\"safe\" (boolean) and \"description\" (string, the reason when unsafe, otherwise empty)"
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_contains_post_and_contract() {
        let prompt = build_analysis_prompt(
            AnalysisKind::Summary,
            "https://example.com/p/1",
            Some("New spring collection"),
        );
        assert!(prompt.contains("Link: https://example.com/p/1"));
        assert!(prompt.contains("New spring collection"));
        assert!(prompt.contains(SENTINEL));
        assert!(prompt.contains("\"summary\""));
        assert!(!prompt.contains("related_entities"));
    }

    #[test]
    fn classification_prompt_lists_all_fields() {
        let prompt = build_analysis_prompt(AnalysisKind::Classification, "https://x", None);
        assert!(prompt.contains("content_type"));
        assert!(prompt.contains("related_entities"));
        assert!(prompt.contains("Text: (none)"));
    }

    #[test]
    fn long_bodies_are_clipped_on_char_boundary() {
        let body = "é".repeat(MAX_BODY_CHARS + 10);
        let prompt = build_analysis_prompt(AnalysisKind::Summary, "https://x", Some(&body));
        assert_eq!(prompt.matches('é').count(), MAX_BODY_CHARS);
    }

    #[test]
    fn sensitivity_prompt_mentions_refusal_shortcut() {
        let prompt = build_sensitivity_prompt("hello");
        assert!(prompt.contains(UNSAFE_SHORTCUT));
        assert!(prompt.contains("\"safe\""));
    }
}
