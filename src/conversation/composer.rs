//! Response composer: builds the reply prompt and cleans the model output.

use std::sync::Arc;

use tracing::debug;

use crate::config::AgentConfig;
use crate::customers::CustomerProfile;
use crate::documents::Chunk;
use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, LlmProvider};

use super::prompts::{ComposerVars, PromptTemplates};
use super::stage::Stage;
use super::transcript::{END_OF_TURN, Transcript};

const COMPOSER_MAX_TOKENS: u32 = 512;

/// Produces the next agent utterance. Does not touch the transcript; the
/// controller records the utterance once this returns successfully.
pub struct ResponseComposer {
    llm: Arc<dyn LlmProvider>,
    templates: Arc<PromptTemplates>,
    config: Arc<AgentConfig>,
}

impl ResponseComposer {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        templates: Arc<PromptTemplates>,
        config: Arc<AgentConfig>,
    ) -> Self {
        Self {
            llm,
            templates,
            config,
        }
    }

    pub async fn compose(
        &self,
        profile: &CustomerProfile,
        transcript: &Transcript,
        stage: Stage,
        retrieved: &[Chunk],
    ) -> Result<String, LlmError> {
        let prompt = self.build_prompt(profile, transcript, stage, retrieved);
        let request = CompletionRequest::prompt(prompt)
            .with_temperature(self.config.temperature)
            .with_max_tokens(COMPOSER_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let utterance = clean_utterance(&response.content, &self.config.agent_name);
        if utterance.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty reply".to_string(),
            });
        }

        debug!(stage = %stage, chars = utterance.len(), "Composed reply");
        Ok(utterance)
    }

    /// Retrieved text is only included for Answer Query turns.
    pub fn build_prompt(
        &self,
        profile: &CustomerProfile,
        transcript: &Transcript,
        stage: Stage,
        retrieved: &[Chunk],
    ) -> String {
        let retrieved_context = if stage == Stage::AnswerQuery && !retrieved.is_empty() {
            let text = retrieved
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            format!(
                "\nRelevant policy information (answer from this text only):\n===\n{text}\n===\n"
            )
        } else {
            String::new()
        };

        self.templates.composer_prompt(&ComposerVars {
            professional_name: &profile.full_name(),
            first_name: profile.first_name.trim(),
            customer_profile: &profile.to_prompt_section(),
            conversation_stage: &stage.prompt_line(),
            conversation_history: &transcript.render(&self.config.agent_name),
            retrieved_context: &retrieved_context,
        })
    }
}

/// Trim whitespace, drop an echoed `"<agent>:"` label, and remove the
/// exact trailing end-of-turn marker.
pub fn clean_utterance(raw: &str, agent_name: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text
        .strip_prefix(agent_name)
        .and_then(|r| r.strip_prefix(':'))
    {
        text = rest.trim_start();
    }

    while let Some(rest) = text.strip_suffix(END_OF_TURN) {
        text = rest.trim_end();
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::transcript::Speaker;
    use crate::llm::testing::ScriptedLlm;

    fn composer(llm: Arc<ScriptedLlm>) -> ResponseComposer {
        let config = Arc::new(AgentConfig::default());
        let templates = Arc::new(PromptTemplates::new(&config));
        ResponseComposer::new(llm, templates, config)
    }

    fn jane() -> CustomerProfile {
        CustomerProfile {
            policy_number: "P-100".into(),
            ..CustomerProfile::new("Jane", "Doe")
        }
    }

    #[test]
    fn strips_only_the_exact_marker() {
        assert_eq!(clean_utterance("Hello there! <END_OF_TURN>", "Sophia"), "Hello there!");
        assert_eq!(clean_utterance("Hello<END_OF_TURN>\n", "Sophia"), "Hello");
        // Trailing characters that merely overlap the marker's letters survive.
        assert_eq!(clean_utterance("Let's talk. NO_TURN", "Sophia"), "Let's talk. NO_TURN");
        assert_eq!(clean_utterance("See you <END", "Sophia"), "See you <END");
        assert_eq!(clean_utterance("Noted, RUN", "Sophia"), "Noted, RUN");
    }

    #[test]
    fn strips_echoed_agent_label() {
        assert_eq!(clean_utterance("Sophia: Hi Jane! <END_OF_TURN>", "Sophia"), "Hi Jane!");
        assert_eq!(clean_utterance("Sophia is here", "Sophia"), "Sophia is here");
    }

    #[test]
    fn retrieved_text_only_for_answer_query() {
        let composer = composer(Arc::new(ScriptedLlm::new(Vec::<String>::new())));
        let chunks = [Chunk::new("Claims must be filed within 30 days.")];

        let with = composer.build_prompt(&jane(), &Transcript::new(), Stage::AnswerQuery, &chunks);
        assert!(with.contains("Relevant policy information"));
        assert!(with.contains("Claims must be filed within 30 days."));

        let without = composer.build_prompt(&jane(), &Transcript::new(), Stage::Close, &chunks);
        assert!(!without.contains("Claims must be filed"));
    }

    #[test]
    fn prompt_carries_profile_and_stage() {
        let composer = composer(Arc::new(ScriptedLlm::new(Vec::<String>::new())));
        let mut transcript = Transcript::new();
        transcript.push(Speaker::Customer, "Hi");

        let prompt = composer.build_prompt(&jane(), &transcript, Stage::NeedsAnalysis, &[]);
        assert!(prompt.contains("insurance customer Jane Doe"));
        assert!(prompt.contains("- Policy Number: P-100"));
        assert!(prompt.contains("Needs Analysis: Ask open-ended questions"));
        assert!(prompt.contains("Customer: Hi <END_OF_TURN>"));
        assert!(prompt.contains("Good day, Jane!"));
    }

    #[tokio::test]
    async fn compose_returns_cleaned_reply() {
        let llm = Arc::new(ScriptedLlm::new(["Hi Jane, this is Sophia! <END_OF_TURN>"]));
        let reply = composer(Arc::clone(&llm))
            .compose(&jane(), &Transcript::new(), Stage::Introduction, &[])
            .await
            .unwrap();
        assert_eq!(reply, "Hi Jane, this is Sophia!");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn blank_reply_is_invalid() {
        let llm = Arc::new(ScriptedLlm::new(["  <END_OF_TURN> "]));
        let err = composer(llm)
            .compose(&jane(), &Transcript::new(), Stage::Introduction, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}
