//! # Notifications
//!
//! Best effort only. [`Notifier::notify`] has no error to return: a failed send is
//! logged and the registration or order it belongs to still succeeds.
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use tracing::{info, warn};

use crate::{config::Mail, models::User};

pub const WELCOME_SUBJECT: &str = "Welcome to Omni food";
pub const ORDER_SUBJECT: &str = "Order Confirmation";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &User, subject: &str, message: &str);
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(mail: &Mail) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&mail.smtp_host)?
            .credentials(Credentials::new(mail.user.clone(), mail.pass.clone()))
            .timeout(Some(SEND_TIMEOUT))
            .build();

        Ok(Self::with_transport(transport, mail.user.parse()?))
    }

    pub fn with_transport(transport: AsyncSmtpTransport<Tokio1Executor>, from: Mailbox) -> Self {
        Self { transport, from }
    }

    async fn send(
        &self,
        user: &User,
        subject: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(user.email.parse()?)
            .subject(subject)
            .body(message.to_string())?;

        self.transport.send(email).await?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, user: &User, subject: &str, message: &str) {
        match self.send(user, subject, message).await {
            Ok(()) => info!("Sent '{subject}' to {}", user.email),
            Err(e) => warn!("Notification error for {}: {e}", user.email),
        }
    }
}

/// Stands in when no mail account is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user: &User, subject: &str, message: &str) {
        info!("Mail disabled, '{subject}' for {}: {message}", user.email);
    }
}

pub fn welcome_message(name: &str) -> String {
    format!("welcome {name},thank you for eating with omni food")
}

pub fn order_message(order_id: &str, total: f64) -> String {
    format!("Your order #{order_id} has been placed successfully! Total: ₦{total}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn welcome_message_greets_by_name() {
        assert_eq!(
            welcome_message("Ada"),
            "welcome Ada,thank you for eating with omni food"
        );
    }

    #[test]
    fn order_message_shows_id_and_total() {
        assert_eq!(
            order_message("abc", 10000.0),
            "Your order #abc has been placed successfully! Total: ₦10000"
        );
    }

    // nothing listens on port 1
    fn unreachable() -> SmtpNotifier {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("localhost")
            .port(1)
            .timeout(Some(Duration::from_secs(2)))
            .build();

        SmtpNotifier::with_transport(transport, "sender@example.com".parse().unwrap())
    }

    #[tokio::test]
    async fn unreachable_relay_is_swallowed() {
        unreachable().notify(&user(), WELCOME_SUBJECT, "hi").await;
    }

    #[tokio::test]
    async fn bad_recipient_is_swallowed() {
        let mut user = user();
        user.email = "not an address".to_string();

        unreachable().notify(&user, ORDER_SUBJECT, "hi").await;
    }
}
