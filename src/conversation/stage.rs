//! Conversation stages and their exhaustive id/description mapping.

use serde::{Deserialize, Serialize};

/// Where the agent is in the retention conversation.
///
/// Ids 1–8 are what the stage classifier answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Introduction,
    ValueProposition,
    NeedsAnalysis,
    SolutionPresentation,
    ObjectionHandling,
    AnswerQuery,
    Close,
    EndConversation,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Self::Introduction,
        Self::ValueProposition,
        Self::NeedsAnalysis,
        Self::SolutionPresentation,
        Self::ObjectionHandling,
        Self::AnswerQuery,
        Self::Close,
        Self::EndConversation,
    ];

    pub fn id(&self) -> u8 {
        match self {
            Self::Introduction => 1,
            Self::ValueProposition => 2,
            Self::NeedsAnalysis => 3,
            Self::SolutionPresentation => 4,
            Self::ObjectionHandling => 5,
            Self::AnswerQuery => 6,
            Self::Close => 7,
            Self::EndConversation => 8,
        }
    }

    /// Map a classifier id to a stage. Out-of-range ids yield `None`.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Introduction => "Introduction",
            Self::ValueProposition => "Value Proposition",
            Self::NeedsAnalysis => "Needs Analysis",
            Self::SolutionPresentation => "Solution Presentation",
            Self::ObjectionHandling => "Objection Handling",
            Self::AnswerQuery => "Answer Query",
            Self::Close => "Close",
            Self::EndConversation => "End Conversation",
        }
    }

    /// Instruction given to the model for this stage.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Introduction => {
                "Start the conversation by introducing yourself. Be polite and respectful while \
                 keeping the tone of the conversation professional."
            }
            Self::ValueProposition => {
                "Explain the benefits of staying with the current insurance policy. Highlight any \
                 unique features or advantages that the customer may not be fully aware of."
            }
            Self::NeedsAnalysis => {
                "Ask open-ended questions to uncover the customer's needs, pain points, and \
                 reasons for considering churn. Listen carefully to their responses and take notes."
            }
            Self::SolutionPresentation => {
                "Based on the customer's needs, present solutions or additional benefits that \
                 address their pain points. Tailor the discussion to show how the current policy \
                 can meet their needs better than competitors."
            }
            Self::ObjectionHandling => {
                "Address any objections or concerns the customer may have. Be prepared to provide \
                 evidence, testimonials, or additional incentives to keep them satisfied."
            }
            Self::AnswerQuery => {
                "Retrieve relevant information from the provided document to answer the \
                 customer's query. Make sure to be accurate and concise."
            }
            Self::Close => {
                "Ask the customer if they are interested in any additional services or if they \
                 would like to speak with a representative for further assistance. Confirm their \
                 commitment to continue with the policy."
            }
            Self::EndConversation => {
                "Thank the customer for their time and provide them with information on how to \
                 contact customer support for any future needs. Reiterate the benefits of staying \
                 with their current policy."
            }
        }
    }

    /// "Name: description", the form used inside prompts.
    pub fn prompt_line(&self) -> String {
        format!("{}: {}", self.name(), self.description())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndConversation)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
