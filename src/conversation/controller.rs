//! Conversation controller: owns one [`AgentSession`] and the queue of
//! customers still to be contacted.
//!
//! All mutation goes through `&mut self`, so a session is strictly
//! sequential. The shared pieces in [`AgentDeps`] are read-only and can be
//! handed to any number of controllers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::customers::{CustomerProfile, CustomerQueue};
use crate::documents::{Chunk, TfIdfIndex};
use crate::error::{InputError, Result, StateError};
use crate::llm::LlmProvider;

use super::classifier::StageClassifier;
use super::composer::ResponseComposer;
use super::prompts::PromptTemplates;
use super::session::{AgentSession, SessionStatus};
use super::stage::Stage;
use super::transcript::{Speaker, Transcript};

/// Shared, immutable dependencies of every controller.
#[derive(Clone)]
pub struct AgentDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub config: Arc<AgentConfig>,
    pub templates: Arc<PromptTemplates>,
    /// Policy document index; `None` disables retrieval.
    pub retriever: Option<Arc<TfIdfIndex>>,
}

impl AgentDeps {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let templates = Arc::new(PromptTemplates::new(&config));
        Self {
            llm,
            config: Arc::new(config),
            templates,
            retriever: None,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<TfIdfIndex>) -> Self {
        self.retriever = Some(retriever);
        self
    }
}

/// Outcome of one customer message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub utterance: String,
    pub stage: Stage,
    pub ended: bool,
}

pub struct ConversationController {
    session: Option<AgentSession>,
    queue: CustomerQueue,
    classifier: StageClassifier,
    composer: ResponseComposer,
    retriever: Option<Arc<TfIdfIndex>>,
    config: Arc<AgentConfig>,
}

impl ConversationController {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            session: None,
            queue: CustomerQueue::default(),
            classifier: StageClassifier::new(
                Arc::clone(&deps.llm),
                Arc::clone(&deps.templates),
                deps.config.agent_name.clone(),
            ),
            composer: ResponseComposer::new(
                deps.llm,
                deps.templates,
                Arc::clone(&deps.config),
            ),
            retriever: deps.retriever,
            config: deps.config,
        }
    }

    pub fn session(&self) -> Option<&AgentSession> {
        self.session.as_ref()
    }

    pub fn customer(&self) -> Option<&CustomerProfile> {
        self.session.as_ref().map(|s| &s.customer)
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.session.as_ref().map(|s| &s.transcript)
    }

    pub fn agent_name(&self) -> &str {
        &self.config.agent_name
    }

    /// Customers still queued, including the current one.
    pub fn remaining_customers(&self) -> usize {
        self.queue.len()
    }

    /// Start a fresh conversation with `customer`, whatever state the
    /// session was in.
    pub fn seed(&mut self, customer: CustomerProfile) {
        info!(customer = %customer.full_name(), "Seeding conversation");
        self.session = Some(AgentSession::seeded(customer));
    }

    /// Replace the customer queue and seed its first entry.
    pub fn load_customers(&mut self, customers: Vec<CustomerProfile>) -> Result<&CustomerProfile> {
        let queue = CustomerQueue::new(customers);
        let first = queue.current().cloned().ok_or(InputError::NoCustomers)?;
        info!(customers = queue.len(), "Loaded customer queue");
        self.queue = queue;
        self.seed(first);
        Ok(&self.session_ref()?.customer)
    }

    /// Reseed the current customer and produce a fresh opening message.
    pub async fn restart(&mut self) -> Result<String> {
        let customer = self.session_ref()?.customer.clone();
        self.seed(customer);
        self.produce_agent_turn(Some(Stage::Introduction)).await
    }

    /// Record a customer message.
    ///
    /// A sign-off phrase ends the conversation and returns the closing line,
    /// which is recorded without calling the model.
    pub fn receive_user_message(&mut self, text: &str) -> Result<Option<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::EmptyMessage.into());
        }
        let signed_off = self.config.is_sign_off(text);
        let closing = self.config.closing_message(&self.session_ref()?.customer);

        let session = self.open_session_mut()?;
        session.transcript.push(Speaker::Customer, text);

        if !signed_off {
            return Ok(None);
        }

        session.transcript.push(Speaker::Agent, closing.clone());
        session.stage = Stage::EndConversation;
        session.status = SessionStatus::Ended;
        info!(customer = %session.customer.full_name(), "Customer signed off");
        Ok(Some(closing))
    }

    /// Classify (unless `stage_override` is given), compose, and record the
    /// next agent utterance. Nothing is recorded if composition fails.
    pub async fn produce_agent_turn(&mut self, stage_override: Option<Stage>) -> Result<String> {
        let session = self.open_session()?;

        let stage = match stage_override {
            Some(stage) => stage,
            None => self.classifier.classify(&session.transcript).await,
        };
        let retrieved = self.retrieve(stage, &session.transcript);
        let utterance = self
            .composer
            .compose(&session.customer, &session.transcript, stage, &retrieved)
            .await?;

        let session = self.open_session_mut()?;
        session.transcript.push(Speaker::Agent, utterance.clone());
        session.stage = stage;
        session.status = if stage.is_terminal() {
            SessionStatus::Ended
        } else {
            SessionStatus::Active
        };

        info!(
            customer = %session.customer.full_name(),
            stage = %stage,
            turns = session.transcript.len(),
            "Agent turn"
        );
        Ok(utterance)
    }

    pub async fn next_agent_turn(&mut self) -> Result<String> {
        self.produce_agent_turn(None).await
    }

    /// Customer message plus agent reply as one turn. When the reply
    /// fails, the customer message is rolled back as well.
    pub async fn submit_user_message(&mut self, text: &str) -> Result<Reply> {
        let checkpoint = self.open_session()?.transcript.len();

        if let Some(closing) = self.receive_user_message(text)? {
            return Ok(Reply {
                utterance: closing,
                stage: Stage::EndConversation,
                ended: true,
            });
        }

        match self.produce_agent_turn(None).await {
            Ok(utterance) => {
                let session = self.session_ref()?;
                Ok(Reply {
                    utterance,
                    stage: session.stage,
                    ended: session.status == SessionStatus::Ended,
                })
            }
            Err(e) => {
                if let Some(session) = self.session.as_mut() {
                    session.transcript.truncate(checkpoint);
                }
                warn!(error = %e, "Agent turn failed, customer message not recorded");
                Err(e)
            }
        }
    }

    /// Drop the current customer and seed the next one.
    ///
    /// Returns `None` when the queue runs out; the finished conversation is
    /// left as it was.
    pub fn advance_customer(&mut self) -> Result<Option<CustomerProfile>> {
        if self.queue.is_empty() {
            return Err(StateError::NoCustomers.into());
        }

        match self.queue.advance().cloned() {
            Some(next) => {
                self.seed(next.clone());
                Ok(Some(next))
            }
            None => {
                info!("No more customers");
                Ok(None)
            }
        }
    }

    fn retrieve(&self, stage: Stage, transcript: &Transcript) -> Vec<Chunk> {
        if stage != Stage::AnswerQuery {
            return Vec::new();
        }
        let Some(index) = self.retriever.as_ref() else {
            return Vec::new();
        };

        let query = match transcript.last_customer_text() {
            Some(text) => text.to_string(),
            None => transcript.render(&self.config.agent_name),
        };
        index.query(&query, self.config.retrieval_top_n)
    }

    fn session_ref(&self) -> Result<&AgentSession> {
        self.session
            .as_ref()
            .ok_or_else(|| StateError::NoCustomer.into())
    }

    fn open_session(&self) -> Result<&AgentSession> {
        let session = self.session_ref()?;
        if !session.status.accepts_turns() {
            return Err(StateError::ConversationEnded {
                customer: session.customer.full_name(),
            }
            .into());
        }
        Ok(session)
    }

    fn open_session_mut(&mut self) -> Result<&mut AgentSession> {
        let session = self.session.as_mut().ok_or(StateError::NoCustomer)?;
        if !session.status.accepts_turns() {
            return Err(StateError::ConversationEnded {
                customer: session.customer.full_name(),
            }
            .into());
        }
        Ok(session)
    }
}
