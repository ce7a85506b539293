use super::PublishSink;
use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    api_base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Self {
        Self {
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Point at a different Bot API host (self-hosted server, local stub).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn send_once(&self, payload: &SendMessage<'_>) -> std::result::Result<(), SendFailure> {
        // Errors are stripped of their URL: it embeds the bot token.
        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| SendFailure::Transient {
                error: anyhow!("Telegram request failed: {}", e.without_url()),
                retry_after: None,
            })?;

        let status = rsp.status();
        let retryable = is_retryable(status);
        let body: TelegramResponse = match rsp.json().await {
            Ok(b) => b,
            Err(e) => {
                let error = anyhow!("Telegram response unreadable ({status}): {}", e.without_url());
                return Err(if retryable {
                    SendFailure::Transient { error, retry_after: None }
                } else {
                    SendFailure::Permanent(error)
                });
            }
        };

        if status.is_success() && body.ok {
            return Ok(());
        }
        let error = anyhow!(
            "Telegram API error ({status}): {}",
            body.description.unwrap_or_else(|| "no description".into())
        );
        if retryable {
            Err(SendFailure::Transient {
                error,
                retry_after: body
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map(Duration::from_secs),
            })
        } else {
            Err(SendFailure::Permanent(error))
        }
    }
}

/// 429 and 5xx are worth another attempt; any other rejection is final.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Wait before attempt `attempt + 1`: the server's `retry_after` when given,
/// otherwise exponential backoff. Capped either way.
fn retry_delay(attempt: u8, retry_after: Option<Duration>) -> Duration {
    retry_after
        .unwrap_or_else(|| Duration::from_millis(500u64 << (attempt - 1)))
        .min(MAX_RETRY_DELAY)
}

enum SendFailure {
    /// Transport error, 429 or 5xx.
    Transient {
        error: anyhow::Error,
        retry_after: Option<Duration>,
    },
    Permanent(anyhow::Error),
}

#[async_trait::async_trait]
impl PublishSink for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let payload = SendMessage::plain(destination, text);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.send_once(&payload).await {
                Ok(()) => return Ok(()),
                Err(SendFailure::Transient { error, retry_after }) if attempt < self.max_retries => {
                    let wait = retry_delay(attempt, retry_after);
                    tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, error = %error, "telegram send failed, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(SendFailure::Transient { error, .. }) => return Err(error),
                Err(SendFailure::Permanent(error)) => return Err(error),
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

impl<'a> SendMessage<'a> {
    fn plain(chat_id: &'a str, text: &'a str) -> Self {
        Self {
            chat_id,
            text,
            disable_web_page_preview: false,
        }
    }
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn endpoint_embeds_token_and_base() {
        let n = TelegramNotifier::new("123:abc".into()).with_api_base("http://127.0.0.1:9/");
        assert_eq!(n.endpoint(), "http://127.0.0.1:9/bot123:abc/sendMessage");
    }

    #[test]
    fn payload_is_plain_text() {
        let v = serde_json::to_value(SendMessage::plain("-1001", "hi")).unwrap();
        assert_eq!(v["chat_id"], "-1001");
        assert_eq!(v["text"], "hi");
        assert!(v.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn unreachable_api_is_an_error_without_token() {
        let n = TelegramNotifier::new("secret-token".into())
            .with_api_base("http://127.0.0.1:9")
            .with_timeout(1)
            .with_retries(1);
        let err = n.send("-1001", "hi").await.unwrap_err();
        assert!(!format!("{err:#}").contains("secret-token"));
    }

    #[test]
    fn only_throttling_and_server_errors_retry() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }

    #[test]
    fn retry_delay_prefers_server_hint_and_is_capped() {
        assert_eq!(retry_delay(1, None), Duration::from_millis(500));
        assert_eq!(retry_delay(3, None), Duration::from_millis(2000));
        assert_eq!(retry_delay(1, Some(Duration::from_secs(4))), Duration::from_secs(4));
        assert_eq!(retry_delay(1, Some(Duration::from_secs(600))), MAX_RETRY_DELAY);
    }

    /// Serves one canned response per connection, in order, and counts requests.
    async fn stub_api(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut sock).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let rsp = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(rsp.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        (base, hits)
    }

    async fn read_request(sock: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn permanent_rejection_is_not_retried() {
        let (base, hits) = stub_api(vec![
            (400, r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#),
            (200, r#"{"ok":true}"#),
        ])
        .await;
        let n = TelegramNotifier::new("t".into()).with_api_base(&base).with_retries(3);

        let err = n.send("-1001", "hi").await.unwrap_err();

        assert!(format!("{err:#}").contains("chat not found"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn throttled_send_is_retried_after_hint() {
        let (base, hits) = stub_api(vec![
            (429, r#"{"ok":false,"description":"Too Many Requests","parameters":{"retry_after":0}}"#),
            (200, r#"{"ok":true}"#),
        ])
        .await;
        let n = TelegramNotifier::new("t".into()).with_api_base(&base).with_retries(3);

        n.send("-1001", "hi").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
