use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::MailConfig;

/// Outbound email with plain-text and HTML alternatives.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Picks a backend from config: a real SMTP relay when a host is set,
/// otherwise the console backend for local development.
pub fn from_config(config: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    if config.smtp_host.is_empty() {
        warn!("SMTP_HOST not set; using console mail backend");
        Ok(Arc::new(ConsoleMailer))
    } else {
        Ok(Arc::new(SmtpMailer::new(config)?))
    }
}

const CONFIRMATION_SUBJECT: &str = "Registration confirmation email";

/// Renders the registration confirmation email around the frontend link.
pub fn confirmation_email(to: &str, confirmation_url: &str) -> OutgoingEmail {
    let html_body = format!(
        "<html><body>\
         <p>You're almost there!</p>\
         <p><a href=\"{confirmation_url}\">Confirm your email address</a> \
         to finish creating your Planlog account.</p>\
         <p>If you did not request this, you can safely ignore this email.</p>\
         </body></html>"
    );
    let text_body = format!(
        "You're almost there!\n\n\
         Open the link below to confirm your email address and finish creating \
         your Planlog account:\n\n\
         {confirmation_url}\n\n\
         If you did not request this, you can safely ignore this email.\n"
    );
    OutgoingEmail {
        to: to.to_string(),
        subject: CONFIRMATION_SUBJECT.to_string(),
        text_body,
        html_body,
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();
        let from = config.from_address.parse()?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.text_body,
                email.html_body,
            ))?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Development backend: logs the message instead of sending it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text_body,
            "outgoing email (console backend)"
        );
        Ok(())
    }
}

/// Test backend that records sent mail in memory; can be built failing to
/// exercise transport-error paths.
pub struct MemoryMailer {
    fail_sends: bool,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self {
            fail_sends: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("mailbox lock poisoned").clone()
    }
}

impl Default for MemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("smtp transport unavailable");
        }
        self.sent.lock().expect("mailbox lock poisoned").push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_email_embeds_the_link_in_both_bodies() {
        let url = "http://localhost:3000/register/confirm?confirmation_token=abc.def.ghi";
        let email = confirmation_email("someone@example.com", url);
        assert_eq!(email.to, "someone@example.com");
        assert_eq!(email.subject, "Registration confirmation email");
        assert!(email.text_body.contains(url));
        assert!(email.html_body.contains(url));
    }

    #[tokio::test]
    async fn memory_mailer_records_sent_mail() {
        let mailer = MemoryMailer::new();
        let email = confirmation_email("a@b.test", "http://x/confirm?confirmation_token=t");
        mailer.send(email).await.expect("send should succeed");
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.test");
    }

    #[tokio::test]
    async fn failing_mailer_reports_transport_errors() {
        let mailer = MemoryMailer::failing();
        let email = confirmation_email("a@b.test", "http://x");
        let err = mailer.send(email).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert!(mailer.sent().is_empty());
    }
}
