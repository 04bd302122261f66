use anyhow::{Context, Result};
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

pub struct EmailService {
    smtp: SmtpConfig,
}

impl EmailService {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }

    pub fn sending_disabled() -> bool {
        std::env::var("EMAIL_SEND_DISABLED")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub async fn send_test_reminder(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        subject_name: &str,
        subtopic: Option<&str>,
    ) -> Result<()> {
        let topic_line = match subtopic {
            Some(subtopic) => format!("{} ({})", subject_name, subtopic),
            None => subject_name.to_string(),
        };

        let subject = format!("Upcoming test reminder: {}", topic_line);
        let body = format!(
            "Hi {}!\n\nThis is a friendly reminder that a test on {} is scheduled for today.\n\nA few minutes of review goes a long way. Good luck!\n\nThe SproutLearn team\n",
            recipient_name, topic_line
        );

        self.send(recipient_email, recipient_name, &subject, &body)
            .await
    }

    async fn send(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let from_address: Mailbox = format!("{} <{}>", self.smtp.from_name, self.smtp.from_email)
            .parse()
            .context("Invalid from email address")?;
        let to_address: Mailbox = format!("{} <{}>", recipient_name, recipient_email)
            .parse()
            .context("Invalid recipient email address")?;

        let email = Message::builder()
            .from(from_address)
            .to(to_address)
            .subject(subject)
            .body(body.to_string())
            .context("Failed to build notification email")?;

        let mailer = self.build_mailer()?;
        mailer
            .send(email)
            .await
            .context("Failed to send notification email")?;

        Ok(())
    }

    fn build_mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let creds = Credentials::new(self.smtp.login.clone(), self.smtp.password.clone());

        let builder = if self.smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.server)
                .context("Invalid SMTP server for TLS")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.smtp.server)
        }
        .port(self.smtp.port)
        .credentials(creds);

        Ok(builder.build())
    }
}
