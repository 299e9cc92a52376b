use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::HttpCfg;
use crate::error::{ChatStreamError, CoreResult};
use crate::stream::ByteStream;

/// Generic fallback when the error body is not JSON at all.
const GENERIC_FAILURE: &str = "Request failed";

/// Thin wrapper around reqwest::Client with defaults and helpers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new_default() -> CoreResult<Self> {
        Self::from_config(&HttpCfg::default())
    }

    pub fn from_config(cfg: &HttpCfg) -> CoreResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms));
        if let Some(n) = cfg.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(n);
        }
        let inner = builder
            .build()
            .map_err(|e| ChatStreamError::Other(anyhow::anyhow!("http client build failed: {e}")))?;
        Ok(Self {
            inner,
            user_agent: concat!("chatstream/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }

    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> CoreResult<R> {
        let resp = self.send(url, body, headers, "application/json").await?;
        let status = resp.status();
        resp.json::<R>().await.map_err(|e| ChatStreamError::Request {
            status: status.as_u16(),
            message: format!("json decode error: {e}"),
        })
    }

    /// POST JSON and hand back the response body as raw chunks.
    ///
    /// Status is checked before any body byte is read: 401 short-circuits to
    /// `Unauthorized`, other failures carry the server's `error` message.
    pub async fn post_event_stream<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> CoreResult<ByteStream> {
        let resp = self.send(url, body, headers, "text/event-stream").await?;
        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatStreamError::Transport(e.to_string())));
        Ok(stream.boxed())
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
        accept: &str,
    ) -> CoreResult<Response> {
        let mut req = self
            .inner
            .post(url)
            .json(body)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ChatStreamError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ChatStreamError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }
        Ok(resp)
    }
}

fn map_http_error(status: StatusCode, body: &str) -> ChatStreamError {
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => v
            .get("error")
            .and_then(|e| e.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
        Err(_) => GENERIC_FAILURE.to_string(),
    };
    ChatStreamError::Request {
        status: status.as_u16(),
        message: truncate(&message, 300),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => {
            let mut t = s[..idx].to_string();
            t.push_str("...");
            t
        }
        None => s.to_string(),
    }
}
