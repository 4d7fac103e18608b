//! Configuration types.
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! in `main`). Unset variables fall back to the defaults below.

use std::path::PathBuf;

use crate::customers::CustomerProfile;
use crate::documents::ChunkPolicy;
use crate::error::ConfigError;

/// Phrases that end the conversation when a customer message contains one.
pub const DEFAULT_SIGN_OFF_PHRASES: &[&str] = &[
    "bye",
    "goodbye",
    "talk later",
    "that would be all",
    "that will be all",
    "no i don't need further assistance",
    "okay thank you",
    "okay thankyou",
];

/// Persona and conversation settings shared by every session.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name the agent introduces itself with.
    pub agent_name: String,
    pub agent_role: String,
    pub team_name: String,
    /// Channel the customer is reached through ("chat", "email", ...).
    pub conversation_type: String,
    pub conversation_purpose: String,
    /// Lowercase sign-off phrases.
    pub sign_off_phrases: Vec<String>,
    /// Chunks retrieved for an Answer Query turn.
    pub retrieval_top_n: usize,
    /// Temperature for composed replies. Classification always uses 0.
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "Sophia".to_string(),
            agent_role:
                "To promote new products, features, and gather feedback from insurance customers"
                    .to_string(),
            team_name: "Customer Retention".to_string(),
            conversation_type: "chat".to_string(),
            conversation_purpose: "understand how satisfied they are with their current policy, \
                                   address any concerns, and encourage them to stay with us"
                .to_string(),
            sign_off_phrases: DEFAULT_SIGN_OFF_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            retrieval_top_n: 1,
            temperature: 0.2,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let sign_off_phrases = match std::env::var("RETENTION_SIGN_OFF_PHRASES") {
            Ok(raw) => parse_phrases(&raw),
            Err(_) => defaults.sign_off_phrases,
        };

        Ok(Self {
            agent_name: env_or("RETENTION_AGENT_NAME", defaults.agent_name),
            agent_role: env_or("RETENTION_AGENT_ROLE", defaults.agent_role),
            team_name: env_or("RETENTION_TEAM_NAME", defaults.team_name),
            conversation_type: env_or("RETENTION_CONVERSATION_TYPE", defaults.conversation_type),
            conversation_purpose: env_or(
                "RETENTION_CONVERSATION_PURPOSE",
                defaults.conversation_purpose,
            ),
            sign_off_phrases,
            retrieval_top_n: env_parse("RETENTION_RETRIEVAL_TOP_N")?
                .unwrap_or(defaults.retrieval_top_n),
            temperature: env_parse("RETENTION_TEMPERATURE")?.unwrap_or(defaults.temperature),
        })
    }

    /// Case-insensitive substring match against the sign-off phrases.
    pub fn is_sign_off(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.sign_off_phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && lower.contains(phrase.as_str()))
    }

    /// Closing line sent when the customer signs off.
    pub fn closing_message(&self, customer: &CustomerProfile) -> String {
        let name = customer.first_name.trim();
        let greeting = if name.is_empty() {
            "Thank you for your time".to_string()
        } else {
            format!("Thank you for your time, {name}")
        };
        format!(
            "{greeting}. If you need anything in the future, the {team} team is always here to \
             help. Have a great day!",
            team = self.team_name
        )
    }
}

/// Front end to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Cli,
    Http,
}

impl std::str::FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::InvalidValue {
                key: "RETENTION_MODE".to_string(),
                message: format!("unknown mode '{other}' (expected cli or http)"),
            }),
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub mode: RunMode,
    pub http_port: u16,
    /// Plain-text policy document used for Answer Query turns.
    pub policy_document: Option<PathBuf>,
    /// Where the extracted chunk list is persisted.
    pub chunks_path: PathBuf,
    pub chunk_policy: ChunkPolicy,
    /// Customer CSV loaded at startup in CLI mode.
    pub customers_csv: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match std::env::var("RETENTION_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => RunMode::Http,
        };

        let chunk_policy = match env_parse::<usize>("RETENTION_CHUNK_WORDS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "RETENTION_CHUNK_WORDS".to_string(),
                    message: "window size must be at least 1".to_string(),
                });
            }
            Some(size) => ChunkPolicy::WordWindow { size },
            None => ChunkPolicy::Paragraphs,
        };

        Ok(Self {
            agent: AgentConfig::from_env()?,
            mode,
            http_port: env_parse("RETENTION_HTTP_PORT")?.unwrap_or(5000),
            policy_document: std::env::var("RETENTION_POLICY_DOCUMENT")
                .ok()
                .map(PathBuf::from),
            chunks_path: std::env::var("RETENTION_CHUNKS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/extracted_chunks.json")),
            chunk_policy,
            customers_csv: std::env::var("RETENTION_CUSTOMERS_CSV")
                .ok()
                .map(PathBuf::from),
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_phrases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_off_is_case_insensitive_substring() {
        let config = AgentConfig::default();
        assert!(config.is_sign_off("bye"));
        assert!(config.is_sign_off("OK, BYE then"));
        assert!(config.is_sign_off("Goodbye!"));
        assert!(config.is_sign_off("I'll talk later"));
        assert!(!config.is_sign_off("What does my policy cover?"));
    }

    #[test]
    fn custom_phrases_are_lowercased() {
        let phrases = parse_phrases(" See Ya , ,Cheers");
        assert_eq!(phrases, vec!["see ya", "cheers"]);
        let config = AgentConfig {
            sign_off_phrases: phrases,
            ..AgentConfig::default()
        };
        assert!(config.is_sign_off("see ya tomorrow"));
        assert!(!config.is_sign_off("bye"));
    }

    #[test]
    fn closing_message_addresses_customer() {
        let config = AgentConfig::default();
        let message = config.closing_message(&CustomerProfile::new("Jane", "Doe"));
        assert!(message.starts_with("Thank you for your time, Jane."));
        assert!(message.contains("Customer Retention"));

        let anonymous = config.closing_message(&CustomerProfile::default());
        assert!(anonymous.starts_with("Thank you for your time."));
    }

    #[test]
    fn run_mode_parses() {
        assert_eq!("CLI".parse::<RunMode>().unwrap(), RunMode::Cli);
        assert_eq!("http".parse::<RunMode>().unwrap(), RunMode::Http);
        assert!("grpc".parse::<RunMode>().is_err());
    }
}
