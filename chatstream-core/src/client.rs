//! Conversation endpoints of the chat backend.

use std::time::Instant;

use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::{Span, field, info_span};
use tracing_futures::Instrument;

use crate::config::{Config, Credentials};
use crate::error::CoreResult;
use crate::http_client::HttpClient;
use crate::model::{SendMessageRequest, SendMessageResponse};
use crate::normalizer::normalize_content;
use crate::session::{EndReason, SessionSummary, StreamSession};
use crate::stream::EventHandler;
use crate::telemetry::{self, StreamLog};

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: HttpClient,
    base: String,
    credentials: Credentials,
}

impl ChatClient {
    pub fn new(http: HttpClient, base: String, credentials: Credentials) -> Self {
        Self {
            http,
            base,
            credentials,
        }
    }

    /// Build from config, resolving credentials from the environment.
    pub fn from_config(cfg: &Config) -> CoreResult<Self> {
        let http = HttpClient::from_config(&cfg.http)?;
        Ok(Self::new(http, cfg.base_url.clone(), cfg.auth.resolve()))
    }

    #[cfg(test)]
    pub fn new_for_tests(server_base: &str) -> Self {
        ChatClient::new(
            HttpClient::new_default().unwrap(),
            server_base.to_string(),
            Credentials::default(),
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut h = Vec::new();
        if let Some(cookie) = &self.credentials.session_cookie {
            h.push(("Cookie".into(), cookie.expose_secret().to_string()));
        }
        if let Some(token) = &self.credentials.csrf_token {
            h.push(("X-CSRFToken".into(), token.expose_secret().to_string()));
        }
        h
    }

    /// Send a message and wait for the full reply in one response.
    pub async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> CoreResult<SendMessageResponse> {
        let payload = SendMessageRequest {
            content: normalize_content(content)?,
        };
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/conversations/{}/messages/", self.base, conversation_id);
        self.http.post_json(&url, &payload, &hdrs).await
    }

    /// Send a message and stream the reply into `handler` as it arrives.
    ///
    /// Returns once the server closes the body or `cancel` fires. Fails without
    /// invoking `handler` when the server answers 401 or another error status,
    /// and fails mid-stream if the connection drops.
    pub async fn send_message_stream<H>(
        &self,
        conversation_id: i64,
        content: &str,
        handler: &mut H,
        cancel: CancellationToken,
    ) -> CoreResult<SessionSummary>
    where
        H: EventHandler + ?Sized,
    {
        let span = info_span!(
            "chat.stream",
            conversation.id = conversation_id,
            stream.outcome = field::Empty,
            events.dispatched = field::Empty,
            frames.dropped = field::Empty,
            latency.ms = field::Empty,
        );
        let started = Instant::now();
        let result = self
            .stream_reply(conversation_id, content, handler, cancel)
            .instrument(span.clone())
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;
        record(&span, conversation_id, latency_ms, &result);
        result
    }

    async fn stream_reply<H>(
        &self,
        conversation_id: i64,
        content: &str,
        handler: &mut H,
        cancel: CancellationToken,
    ) -> CoreResult<SessionSummary>
    where
        H: EventHandler + ?Sized,
    {
        let payload = SendMessageRequest {
            content: normalize_content(content)?,
        };
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!(
            "{}/api/conversations/{}/messages/stream/",
            self.base, conversation_id
        );

        let source = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(StreamSession::new().summary(EndReason::Cancelled));
            }
            source = self.http.post_event_stream(&url, &payload, &hdrs) => source?,
        };
        StreamSession::with_cancellation(cancel)
            .run(source, handler)
            .await
    }
}

fn record(span: &Span, conversation_id: i64, latency_ms: u64, result: &CoreResult<SessionSummary>) {
    let log = StreamLog::new()
        .conversation_id(conversation_id)
        .latency_ms(latency_ms);
    let log = match result {
        Ok(summary) => {
            span.record("stream.outcome", summary.end.as_str());
            span.record("events.dispatched", summary.events_dispatched);
            span.record("frames.dropped", summary.frames_dropped);
            log.outcome(summary.end.as_str())
                .counts(
                    summary.events_dispatched,
                    summary.frames_dropped,
                    summary.bytes_received,
                )
                .reply_chars(summary.reply_chars)
        }
        Err(err) => {
            span.record("stream.outcome", err.kind());
            log.outcome(err.kind()).error(err.kind(), &err.to_string())
        }
    };
    span.record("latency.ms", latency_ms);
    telemetry::emit(log);
}
