//! Outbound SMTP via lettre.

use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::NotifyError;

/// SMTP settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    /// STARTTLS on `smtp_port` instead of implicit TLS.
    pub starttls: bool,
    pub supervisor_address: String,
}

impl EmailConfig {
    /// Returns `None` unless both `SMTP_HOST` and `SUPERVISOR_EMAIL` are set.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let supervisor_address = std::env::var("SUPERVISOR_EMAIL").ok()?;

        let smtp_port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from_address = std::env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        let starttls = std::env::var("SMTP_STARTTLS")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: SecretString::from(password),
            from_address,
            starttls,
            supervisor_address,
        })
    }
}

/// Build the message. Split out so address validation is testable without
/// a server.
pub fn build_message(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<Message, NotifyError> {
    let from = config
        .from_address
        .parse()
        .map_err(|e| NotifyError::InvalidAddress {
            address: config.from_address.clone(),
            reason: format!("{e}"),
        })?;
    let to_mailbox = to.parse().map_err(|e| NotifyError::InvalidAddress {
        address: to.to_string(),
        reason: format!("{e}"),
    })?;

    Message::builder()
        .from(from)
        .to(to_mailbox)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| NotifyError::SendFailed(format!("Failed to build email: {e}")))
}

/// Send a plain-text e-mail. Blocking; call from `spawn_blocking`.
pub fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), NotifyError> {
    let email = build_message(config, to, subject, body)?;

    let creds = Credentials::new(
        config.username.clone(),
        config.password.expose_secret().to_string(),
    );

    let relay = if config.starttls {
        SmtpTransport::starttls_relay(&config.smtp_host)
    } else {
        SmtpTransport::relay(&config.smtp_host)
    };
    let builder =
        relay.map_err(|e| NotifyError::SendFailed(format!("SMTP relay error: {e}")))?;

    let transport = builder
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport
        .send(&email)
        .map_err(|e| NotifyError::SendFailed(format!("SMTP send failed: {e}")))?;

    tracing::info!(to = to, subject = subject, "Email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            username: "bot".into(),
            password: SecretString::from("secret"),
            from_address: from.into(),
            starttls: true,
            supervisor_address: "boss@example.com".into(),
        }
    }

    #[test]
    fn builds_message_for_valid_addresses() {
        let message = build_message(
            &config("bot@example.com"),
            "boss@example.com",
            "Summary",
            "All good.",
        )
        .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: boss@example.com"));
        assert!(raw.contains("Subject: Summary"));
    }

    #[test]
    fn invalid_from_address_is_reported() {
        let err = build_message(&config("not an address"), "boss@example.com", "s", "b")
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress { .. }));
    }

    #[test]
    fn invalid_to_address_is_reported() {
        let err = build_message(&config("bot@example.com"), "nobody", "s", "b").unwrap_err();
        match err {
            NotifyError::InvalidAddress { address, .. } => assert_eq!(address, "nobody"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
