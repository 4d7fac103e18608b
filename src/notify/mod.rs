//! Supervisor notification: summarise a finished conversation with the
//! model and e-mail the summary.

pub mod email;
pub mod summary;

pub use email::{EmailConfig, send_email};
pub use summary::{ConversationSummary, SupervisorNotifier};
