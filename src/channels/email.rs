//! Email delivery over async SMTP with STARTTLS.

use crate::channels::Channel;
use crate::config::AppConfig;
use crate::render::{self, SectionTable};
use crate::types::{DigestError, DigestItem, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

pub struct EmailChannel {
    smtp_host: String,
    smtp_port: u16,
    smtp_user: String,
    smtp_password: String,
    to: String,
    sections: SectionTable,
}

impl EmailChannel {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            smtp_user: config.smtp_user.clone(),
            smtp_password: config.smtp_password.clone(),
            to: config.email_to.clone(),
            sections: config.sections.clone(),
        }
    }

    fn mailbox(addr: &str) -> Result<Mailbox> {
        addr.parse()
            .map_err(|e| DigestError::Channel(format!("invalid email address '{addr}': {e}")))
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, digest: &[DigestItem]) -> Result<()> {
        if self.smtp_user.is_empty() || self.smtp_password.is_empty() || self.to.is_empty() {
            return Err(DigestError::Channel(
                "SMTP_USER, SMTP_PASSWORD or EMAIL_TO is not configured".to_string(),
            ));
        }

        let message = Message::builder()
            .from(Self::mailbox(&self.smtp_user)?)
            .to(Self::mailbox(&self.to)?)
            .subject(render::digest_title())
            .header(ContentType::TEXT_HTML)
            .body(render::to_html(digest, &self.sections))
            .map_err(|e| DigestError::Channel(format!("failed to build message: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .map_err(|e| DigestError::Channel(format!("smtp relay setup failed: {e}")))?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.smtp_user.clone(),
                self.smtp_password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| DigestError::Channel(format!("smtp send failed: {e}")))?;
        Ok(())
    }
}
