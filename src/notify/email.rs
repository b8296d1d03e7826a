//! SMTP email delivery.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{
    at_risk_reminder_text, markdown, overdue_alert_text, Notifier, NotifyFuture, ReportMessage,
};
use crate::config::SmtpConfig;
use crate::models::classification::{AtRiskTask, OverdueTask};
use crate::{AppError, Result};

/// [`Notifier`] that sends multipart emails over STARTTLS SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl EmailNotifier {
    /// Build a notifier from SMTP settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the sender address or relay host is invalid.
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|err| AppError::Config(format!("invalid smtp from address: {err}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| AppError::Config(format!("invalid smtp relay: {err}")))?
            .port(config.port)
            .timeout(Some(timeout));
        if let Some(password) = &config.password {
            let user = config.username.clone().unwrap_or_else(|| config.from.clone());
            builder = builder.credentials(Credentials::new(user, password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            timeout,
        })
    }

    async fn deliver(&self, recipient: &str, subject: &str, body: MultiPart) -> Result<()> {
        let to: Mailbox = recipient.parse().map_err(|err| {
            AppError::InvalidRequest(format!("invalid recipient {recipient}: {err}"))
        })?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(body)
            .map_err(|err| AppError::Notification(format!("failed to build email: {err}")))?;

        tokio::time::timeout(self.timeout, self.transport.send(email))
            .await
            .map_err(|_| AppError::Notification("smtp send timed out".into()))?
            .map_err(|err| AppError::Notification(format!("smtp send failed: {err}")))?;

        info!(recipient, subject, "email sent");
        Ok(())
    }

    async fn report(&self, message: &ReportMessage, recipient: &str) -> Result<()> {
        let html = markdown::to_html_document(&message.subject, &message.markdown);
        let alternative = MultiPart::alternative_plain_html(message.markdown.clone(), html);

        let body = match &message.attachment {
            Some(pdf) => {
                let content_type = ContentType::parse("application/pdf")
                    .map_err(|err| AppError::Notification(format!("bad content type: {err}")))?;
                let attachment: SinglePart =
                    Attachment::new(pdf.filename.clone()).body(pdf.bytes.clone(), content_type);
                MultiPart::mixed()
                    .multipart(alternative)
                    .singlepart(attachment)
            }
            None => alternative,
        };

        self.deliver(recipient, &message.subject, body).await
    }

    async fn plain_alert(&self, recipient: &str, subject: String, text: String) -> Result<()> {
        let html = format!(
            "<html><body style=\"font-family: Arial, sans-serif;\">{}</body></html>",
            markdown::to_html(&text)
        );
        let body = MultiPart::alternative_plain_html(text, html);
        self.deliver(recipient, &subject, body).await
    }
}

impl Notifier for EmailNotifier {
    fn send_report<'a>(
        &'a self,
        message: &'a ReportMessage,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        Box::pin(self.report(message, recipient))
    }

    fn send_overdue_alert<'a>(
        &'a self,
        entry: &'a OverdueTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let (subject, text) = overdue_alert_text(entry);
        Box::pin(self.plain_alert(recipient, subject, text))
    }

    fn send_at_risk_reminder<'a>(
        &'a self,
        entry: &'a AtRiskTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let (subject, text) = at_risk_reminder_text(entry);
        Box::pin(self.plain_alert(recipient, subject, text))
    }
}
