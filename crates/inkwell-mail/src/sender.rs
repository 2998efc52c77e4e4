//! SMTP delivery.

use async_trait::async_trait;
use inkwell_core::models::EmailMessage;
use inkwell_core::SmtpConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::MailError;

/// Delivers one message. Implemented over SMTP in production and by fakes in
/// tests.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// HTML email sender over an async SMTP transport.
#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| MailError::Build("SMTP_HOST not configured".to_string()))?;
        let from: Mailbox = config
            .from
            .as_deref()
            .ok_or_else(|| MailError::Build("SMTP_FROM not configured".to_string()))?
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("SMTP_FROM: {}", e)))?;

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(config.port);
        let builder = match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %host,
            port = config.port,
            tls = config.tls,
            "SMTP sender initialized"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .email
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", message.email, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html_message.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config(from: &str) -> SmtpConfig {
        SmtpConfig {
            host: Some("localhost".to_string()),
            port: 2525,
            user: None,
            password: None,
            from: Some(from.to_string()),
            tls: false,
        }
    }

    #[test]
    fn rejects_bad_sender_address() {
        let result = SmtpEmailSender::from_config(&smtp_config("not an address"));
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn requires_host() {
        let mut config = smtp_config("blog@example.com");
        config.host = None;
        assert!(matches!(
            SmtpEmailSender::from_config(&config),
            Err(MailError::Build(_))
        ));
    }

    #[tokio::test]
    async fn bad_recipient_fails_before_connecting() {
        let sender = SmtpEmailSender::from_config(&smtp_config("Inkwell <blog@example.com>")).unwrap();
        let message = EmailMessage::new("nobody", "Hi", "<p>Hi</p>");
        assert!(matches!(
            sender.send(&message).await,
            Err(MailError::InvalidAddress(_))
        ));
    }
}
