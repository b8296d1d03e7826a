//! OpenAI-compatible chat-completions summarizer (Groq, OpenAI, local gateways).

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{task_digest, FragmentStream, StreamFuture, Summarizer, SummaryFuture};
use crate::config::SummarizerConfig;
use crate::models::task::Task;
use crate::{AppError, Result};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Classification of one line of a server-sent-events body.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    /// Non-empty text delta.
    Fragment(String),
    /// `data: [DONE]` terminator.
    Done,
    /// Comment, blank line, keep-alive, or an empty delta.
    Skip,
    /// Malformed payload or an error object from the service.
    Invalid(String),
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let payload = payload.trim_start();
    if payload == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<ChunkResponse>(payload) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return SseLine::Invalid(format!("service reported error: {err}"));
            }
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|text| !text.is_empty())
                .map_or(SseLine::Skip, SseLine::Fragment)
        }
        Err(err) => SseLine::Invalid(format!("malformed stream chunk: {err}")),
    }
}

/// Incremental state for decoding an SSE body into fragments.
struct SseDecoder {
    body: ByteStream,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl SseDecoder {
    fn new(body: ByteStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Split complete lines out of the buffer and queue their fragments.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            match parse_sse_line(&String::from_utf8_lossy(&line)) {
                SseLine::Fragment(text) => self.pending.push_back(Ok(text)),
                SseLine::Skip => {}
                SseLine::Done => {
                    self.finished = true;
                    return;
                }
                SseLine::Invalid(msg) => {
                    self.pending.push_back(Err(AppError::Summarizer(msg)));
                    self.finished = true;
                    return;
                }
            }
        }
    }

    fn into_stream(self) -> FragmentStream {
        Box::pin(futures_util::stream::unfold(self, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        state.buffer.extend_from_slice(&chunk);
                        state.drain_lines();
                    }
                    Some(Err(err)) => {
                        state.finished = true;
                        return Some((
                            Err(AppError::Summarizer(format!("stream read failed: {err}"))),
                            state,
                        ));
                    }
                    None => {
                        // Flush a trailing line without a newline terminator.
                        if !state.buffer.is_empty() {
                            state.buffer.push(b'\n');
                            state.drain_lines();
                        }
                        state.finished = true;
                    }
                }
            }
        }))
    }
}

/// [`Summarizer`] that calls an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatSummarizer {
    config: SummarizerConfig,
    http: reqwest::Client,
    timeout: Duration,
}

impl ChatSummarizer {
    /// Build a summarizer client.
    ///
    /// `timeout` bounds batch calls and the time to open a stream.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: SummarizerConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build summarizer client: {err}")))?;
        Ok(Self {
            config,
            http,
            timeout,
        })
    }

    fn request_body(&self, prompt: String, stream: bool) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(AppError::Summarizer("summarizer api key is not configured".into()));
        };
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| AppError::Summarizer(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Summarizer(format!(
                "service returned {status}: {detail}"
            )));
        }
        Ok(response)
    }

    async fn complete(&self, tasks: &[Task]) -> Result<String> {
        let body = self.request_body(report_prompt(tasks), false);
        let response = tokio::time::timeout(self.timeout, async {
            let response = self.post(&body).await?;
            response
                .json::<ChatResponse>()
                .await
                .map_err(|err| AppError::Summarizer(format!("invalid response: {err}")))
        })
        .await
        .map_err(|_| AppError::Summarizer("summarizer call timed out".into()))??;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::Summarizer("service returned no content".into()))?;

        info!(model = %self.config.model, chars = text.len(), "summary generated");
        Ok(text)
    }

    async fn open_stream(&self, tasks: &[Task]) -> Result<FragmentStream> {
        let body = self.request_body(stream_prompt(tasks), true);
        let response = tokio::time::timeout(self.timeout, self.post(&body))
            .await
            .map_err(|_| AppError::Summarizer("opening summary stream timed out".into()))??;

        debug!(model = %self.config.model, "summary stream opened");
        Ok(SseDecoder::new(Box::pin(response.bytes_stream())).into_stream())
    }
}

impl Summarizer for ChatSummarizer {
    fn summarize<'a>(&'a self, tasks: &'a [Task]) -> SummaryFuture<'a> {
        Box::pin(self.complete(tasks))
    }

    fn summarize_stream<'a>(&'a self, tasks: &'a [Task]) -> StreamFuture<'a> {
        Box::pin(self.open_stream(tasks))
    }
}

fn report_prompt(tasks: &[Task]) -> String {
    format!(
        "You are a project management assistant. Summarize the following tasks \
         into a professional, structured status report.\n\n{}\n\
         Highlight task progress, blockers, upcoming goals, and next steps.",
        task_digest(tasks)
    )
}

fn stream_prompt(tasks: &[Task]) -> String {
    format!(
        "You are a project management assistant. Generate a daily summary for \
         these tasks:\n\n{}\n\
         Respond in short, coherent sentences suitable for live display.",
        task_digest(tasks)
    )
}
