//! Stage classifier: one model call that picks the next conversation stage.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, LlmProvider};

use super::prompts::PromptTemplates;
use super::stage::Stage;
use super::transcript::Transcript;

/// Stage answers are a single digit; anything longer is noise.
const CLASSIFIER_MAX_TOKENS: u32 = 8;

pub struct StageClassifier {
    llm: Arc<dyn LlmProvider>,
    templates: Arc<PromptTemplates>,
    agent_name: String,
}

impl StageClassifier {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        templates: Arc<PromptTemplates>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            templates,
            agent_name: agent_name.into(),
        }
    }

    /// Pick the next stage, degrading to `Introduction` when the model call
    /// fails or its answer is not a stage id.
    pub async fn classify(&self, transcript: &Transcript) -> Stage {
        match self.try_classify(transcript).await {
            Ok(stage) => stage,
            Err(e) => {
                warn!(error = %e, "Stage classification failed, defaulting to Introduction");
                Stage::Introduction
            }
        }
    }

    /// Like [`classify`](Self::classify) but reports failures.
    ///
    /// An empty transcript is `Introduction` without a model call.
    pub async fn try_classify(&self, transcript: &Transcript) -> Result<Stage, LlmError> {
        if transcript.is_empty() {
            return Ok(Stage::Introduction);
        }

        let prompt = self
            .templates
            .classifier_prompt(&transcript.render(&self.agent_name));
        let request = CompletionRequest::prompt(prompt)
            .with_temperature(0.0)
            .with_max_tokens(CLASSIFIER_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let stage = parse_stage(&response.content).ok_or_else(|| LlmError::InvalidResponse {
            provider: self.llm.model_name().to_string(),
            reason: format!("not a stage id: {:?}", response.content),
        })?;

        debug!(stage = %stage, raw = %response.content.trim(), "Classified stage");
        Ok(stage)
    }
}

/// First run of ASCII digits in `output`, mapped to a stage.
pub fn parse_stage(output: &str) -> Option<Stage> {
    let start = output.find(|c: char| c.is_ascii_digit())?;
    let digits: String = output[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u8>().ok().and_then(Stage::from_id)
}
