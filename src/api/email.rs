//! Outbound email abstraction.
//!
//! Delivery is fire-and-forget with respect to the request that triggers it:
//! the password-reset flow spawns a detached task and answers the caller
//! immediately, so a slow or failing provider can never change the generic
//! response or its latency.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error; callers never block on this.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Dispatch a message on a background task. Failures are logged, never
/// surfaced to the caller.
pub fn dispatch(sender: Arc<dyn EmailSender>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message) {
            error!(to_email = %message.to_email, "email dispatch failed: {err}");
        }
    });
}

/// Build the password-reset email around the frontend link.
#[must_use]
pub fn reset_message(to_email: &str, reset_link: &str, ttl_minutes: u64) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Password reset".to_string(),
        body: format!(
            "We received a request to reset your password.\n\
             Use the link below to set a new password (valid for {ttl_minutes} minutes):\n\n\
             {reset_link}\n\n\
             If you didn't request this, you can safely ignore this email."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailSender, LogEmailSender, reset_message};

    #[test]
    fn log_sender_accepts_messages() {
        let message = reset_message("user@example.com", "https://app/reset?token=t", 15);
        assert!(LogEmailSender.send(&message).is_ok());
    }

    #[test]
    fn reset_message_embeds_link_and_ttl() {
        let message = reset_message("user@example.com", "https://app/reset?token=abc", 15);
        assert_eq!(message.to_email, "user@example.com");
        assert!(message.body.contains("https://app/reset?token=abc"));
        assert!(message.body.contains("15 minutes"));
    }
}
