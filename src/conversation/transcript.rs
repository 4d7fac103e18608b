//! Append-only conversation transcript.

use serde::{Deserialize, Serialize};

/// Marker closing every turn, as the prompts expect.
pub const END_OF_TURN: &str = "<END_OF_TURN>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Agent,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop turns past `len`. Used to roll back an uncommitted turn.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    pub fn last_customer_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Customer)
            .map(|t| t.text.as_str())
    }

    /// One line per turn, `"<label>: <text> <END_OF_TURN>"`. Agent turns are
    /// labelled with the agent's name.
    pub fn render(&self, agent_name: &str) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let label = match turn.speaker {
                    Speaker::Agent => agent_name,
                    Speaker::Customer => "Customer",
                };
                format!("{label}: {} {END_OF_TURN}", turn.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
