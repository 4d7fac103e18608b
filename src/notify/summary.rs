//! Conversation summary for the supervisor.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::conversation::{PromptTemplates, Transcript};
use crate::customers::CustomerProfile;
use crate::error::{LlmError, NotifyError};
use crate::llm::provider::{CompletionRequest, LlmProvider};

use super::email::{EmailConfig, send_email};

const SUMMARY_MAX_TOKENS: u32 = 400;

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub customer: String,
    pub summary: String,
    /// Whether the summary was e-mailed to the supervisor.
    pub sent: bool,
}

pub struct SupervisorNotifier {
    llm: Arc<dyn LlmProvider>,
    templates: Arc<PromptTemplates>,
    config: Arc<AgentConfig>,
    email: Option<EmailConfig>,
}

impl SupervisorNotifier {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        templates: Arc<PromptTemplates>,
        config: Arc<AgentConfig>,
        email: Option<EmailConfig>,
    ) -> Self {
        Self {
            llm,
            templates,
            config,
            email,
        }
    }

    pub async fn summarize(
        &self,
        customer: &CustomerProfile,
        transcript: &Transcript,
    ) -> Result<String, LlmError> {
        let prompt = self.templates.summary_prompt(
            &customer.full_name(),
            &transcript.render(&self.config.agent_name),
        );
        let request = CompletionRequest::prompt(prompt)
            .with_temperature(0.0)
            .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let summary = response.content.trim().to_string();
        if summary.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty summary".to_string(),
            });
        }
        Ok(summary)
    }

    /// Summarise and, when e-mail is configured, send to the supervisor.
    ///
    /// A failed send is logged and reported through `sent`; the summary is
    /// still returned.
    pub async fn notify(
        &self,
        customer: &CustomerProfile,
        transcript: &Transcript,
    ) -> Result<ConversationSummary, LlmError> {
        let summary = self.summarize(customer, transcript).await?;
        let name = customer.full_name();

        let sent = match self.deliver(&name, &summary).await {
            Ok(()) => true,
            Err(NotifyError::NotConfigured) => false,
            Err(e) => {
                warn!(customer = %name, error = %e, "Failed to e-mail conversation summary");
                false
            }
        };

        Ok(ConversationSummary {
            customer: name,
            summary,
            sent,
        })
    }

    async fn deliver(&self, customer: &str, summary: &str) -> Result<(), NotifyError> {
        let config = self.email.clone().ok_or(NotifyError::NotConfigured)?;
        let subject = email_subject(customer);
        let body = email_body(customer, summary);

        tokio::task::spawn_blocking(move || {
            send_email(&config, &config.supervisor_address, &subject, &body)
        })
        .await
        .map_err(|e| NotifyError::SendFailed(format!("send task failed: {e}")))??;

        info!(customer = customer, "Conversation summary sent to supervisor");
        Ok(())
    }
}

pub fn email_subject(customer: &str) -> String {
    format!("Summary of Conversation with {customer}")
}

pub fn email_body(customer: &str, summary: &str) -> String {
    format!(
        "Dear Supervisor,\n\n\
         Here is a summary of the conversation with {customer}:\n\n\
         {summary}\n\n\
         Best regards,\nCustomer Retention Bot"
    )
}
