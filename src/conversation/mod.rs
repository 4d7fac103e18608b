//! The retention conversation: stages, transcript, prompts, and the
//! controller that drives one customer at a time.

pub mod classifier;
pub mod composer;
pub mod controller;
pub mod prompts;
pub mod session;
pub mod stage;
pub mod transcript;

pub use classifier::StageClassifier;
pub use composer::ResponseComposer;
pub use controller::{AgentDeps, ConversationController, Reply};
pub use prompts::PromptTemplates;
pub use session::{AgentSession, SessionStatus};
pub use stage::Stage;
pub use transcript::{END_OF_TURN, Speaker, Transcript, Turn};
