//! Answer generation from assembled context.
//!
//! Builds the fixed prompt, invokes the completion provider once (no retry),
//! and converts any failure into a fallback message. Queries always produce
//! some textual answer.

use tracing::warn;

use crate::completion::CompletionProvider;
use crate::config::CompletionConfig;

/// Returned in place of an answer when the completion service fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer due to an API error.";

/// Build the completion prompt from a question and its assembled context.
///
/// The template asks for a direct answer first, then evidence-backed
/// reasoning in page-ordered bullet points citing `[Page x]`, kept under a
/// length cap.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a historian-style research assistant.\n\
         Read the following passages extracted from a document.\n\
         Your task:\n\
         1. First, directly answer the question asked.\n\
         2. Then, explain **why** that answer is true using clear reasoning and evidence.\n\
         3. Maintain logical or chronological order based on page numbers or timeline mentioned in context.\n\
         4. Give the answer in **points** and mention the [Page x] numbers where possible.\n\
         Please keep your answer concise (under 500 tokens) while preserving reasoning quality.\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Context:\n\
         {context}\n"
    )
}

/// Generate an answer for `question` given the assembled `context`.
///
/// One attempt only; a failed completion is logged and replaced by
/// [`FALLBACK_ANSWER`], never propagated to the caller.
pub async fn generate(
    provider: &dyn CompletionProvider,
    config: &CompletionConfig,
    question: &str,
    context: &str,
) -> String {
    let prompt = build_prompt(question, context);

    match provider
        .complete(&prompt, config.max_tokens, config.temperature)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            warn!(model = provider.model_name(), error = %e, "completion failed, using fallback answer");
            FALLBACK_ANSWER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::DisabledProvider;

    #[test]
    fn prompt_contains_question_and_context() {
        let prompt = build_prompt("When was the treaty signed?", "[Page 1] It was 1919.");
        assert!(prompt.contains("When was the treaty signed?"));
        assert!(prompt.contains("[Page 1] It was 1919."));
        assert!(prompt.contains("[Page x]"));
        // Question precedes context, as the instructions reference both in that order.
        assert!(prompt.find("Question:").unwrap() < prompt.find("Context:").unwrap());
    }

    #[tokio::test]
    async fn failure_yields_fallback_answer() {
        let config = CompletionConfig::default();
        let answer = generate(&DisabledProvider, &config, "q", "ctx").await;
        assert_eq!(answer, FALLBACK_ANSWER);
    }
}
