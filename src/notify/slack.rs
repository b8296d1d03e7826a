//! Slack delivery through the Web API.
//!
//! Reports are posted as a chat message; a PDF attachment is uploaded
//! into the same channel with the external upload flow.

use std::sync::Arc;
use std::time::Duration;

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiFilesComplete,
    SlackApiFilesCompleteUploadExternalRequest, SlackApiFilesGetUploadUrlExternalRequest,
    SlackApiToken, SlackApiTokenType, SlackApiTokenValue, SlackChannelId, SlackClient,
    SlackClientHyperHttpsConnector, SlackMessageContent,
};
use tracing::info;

use super::{
    at_risk_reminder_text, overdue_alert_text, Notifier, NotifyFuture, PdfAttachment,
    ReportMessage,
};
use crate::config::SlackConfig;
use crate::models::classification::{AtRiskTask, OverdueTask};
use crate::{AppError, Result};

/// Slack caps message text well below this; longer reports are cut.
const MAX_TEXT_CHARS: usize = 39_000;

fn post_request(channel: &str, text: String) -> SlackApiChatPostMessageRequest {
    let content = SlackMessageContent {
        text: Some(text),
        blocks: None,
        attachments: None,
        upload: None,
        files: None,
        reactions: None,
        metadata: None,
        markdown_text: None,
    };

    SlackApiChatPostMessageRequest {
        channel: SlackChannelId(channel.to_owned()),
        content,
        as_user: None,
        icon_emoji: None,
        icon_url: None,
        link_names: Some(true),
        parse: None,
        thread_ts: None,
        username: None,
        reply_broadcast: None,
        unfurl_links: None,
        unfurl_media: None,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n...", &text[..idx]),
        None => text.to_owned(),
    }
}

/// [`Notifier`] that posts to Slack channels or direct messages.
pub struct SlackNotifier {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    http: reqwest::Client,
    timeout: Duration,
}

impl SlackNotifier {
    /// Build a notifier with the bot token from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the token is missing or the HTTPS
    /// connector cannot be created.
    pub fn new(config: &SlackConfig, timeout: Duration) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::Config("slack bot token is not configured".into()));
        }
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Config(format!("failed to init slack connector: {err}")))?;
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build upload client: {err}")))?;

        Ok(Self {
            client: Arc::new(SlackClient::new(connector)),
            bot_token: SlackApiToken {
                token_value: SlackApiTokenValue(config.bot_token.clone()),
                cookie: None,
                team_id: None,
                scope: None,
                token_type: Some(SlackApiTokenType::Bot),
            },
            http,
            timeout,
        })
    }

    async fn post(&self, channel: &str, text: String) -> Result<()> {
        let request = post_request(channel, truncate_chars(&text, MAX_TEXT_CHARS));
        let session = self.client.open_session(&self.bot_token);
        tokio::time::timeout(self.timeout, session.chat_post_message(&request))
            .await
            .map_err(|_| AppError::Notification("slack post timed out".into()))?
            .map_err(|err| AppError::Notification(format!("slack post failed: {err}")))?;
        info!(channel, "sent slack message");
        Ok(())
    }

    async fn upload(&self, channel: &str, pdf: &PdfAttachment) -> Result<()> {
        let session = self.client.open_session(&self.bot_token);

        let url_request =
            SlackApiFilesGetUploadUrlExternalRequest::new(pdf.filename.clone(), pdf.bytes.len());
        let url_response = session
            .get_upload_url_external(&url_request)
            .await
            .map_err(|err| AppError::Notification(format!("failed to get upload url: {err}")))?;

        self.http
            .post(url_response.upload_url.0.to_string())
            .timeout(self.timeout)
            .body(pdf.bytes.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| AppError::Notification(format!("failed to upload file: {err}")))?;

        let mut complete = SlackApiFilesCompleteUploadExternalRequest::new(vec![
            SlackApiFilesComplete {
                id: url_response.file_id,
                title: Some(pdf.filename.clone()),
            },
        ]);
        complete.channel_id = Some(SlackChannelId(channel.to_owned()));
        session
            .files_complete_upload_external(&complete)
            .await
            .map_err(|err| AppError::Notification(format!("failed to complete upload: {err}")))?;

        info!(channel, filename = %pdf.filename, "uploaded report pdf");
        Ok(())
    }

    async fn report(&self, message: &ReportMessage, recipient: &str) -> Result<()> {
        self.post(recipient, format!("*{}*\n\n{}", message.subject, message.markdown))
            .await?;
        if let Some(pdf) = &message.attachment {
            self.upload(recipient, pdf).await?;
        }
        Ok(())
    }
}

impl Notifier for SlackNotifier {
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
        Box::pin(self.post(recipient, format!("*{subject}*\n{text}")))
    }

    fn send_at_risk_reminder<'a>(
        &'a self,
        entry: &'a AtRiskTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let (subject, text) = at_risk_reminder_text(entry);
        Box::pin(self.post(recipient, format!("*{subject}*\n{text}")))
    }
}
