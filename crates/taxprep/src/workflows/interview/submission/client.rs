use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SubmissionSettings;

const MAX_ATTEMPTS: u32 = 3;
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Delivery settings for the collection endpoint, constructed once at
/// startup and passed to the client rather than read from global state.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

impl SubmissionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            max_attempts: MAX_ATTEMPTS,
            attempt_timeout: ATTEMPT_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn from_settings(settings: &SubmissionSettings) -> Self {
        let mut config = Self::new(settings.endpoint.clone());
        config.api_key = settings.api_key.clone();
        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Raw outcome of one delivery attempt.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("attempt timed out")]
    TimedOut,
    #[error("network failure: {0}")]
    Network(String),
}

/// Seam between the retry loop and the wire so tests can script failures.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn post(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<TransportReply, TransportError>;
}

/// Production transport posting JSON over HTTP.
#[derive(Debug, Default, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionTransport for HttpTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<TransportReply, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .timeout(timeout)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                // Reading the body is best-effort; the write already landed.
                let body = response.text().await.unwrap_or_default();
                Ok(TransportReply { status, body })
            }
            Err(err) if err.is_timeout() => Err(TransportError::TimedOut),
            Err(err) => Err(TransportError::Network(err.to_string())),
        }
    }
}

/// Why one attempt failed. All kinds are retried uniformly; the enum
/// exists so exhaustion reports can say what went wrong last.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttemptFailure {
    #[error("endpoint returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Terminal delivery error, raised only after every attempt is spent so
/// callers can show a single "try again later" message instead of one
/// error per attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptFailure },
}

/// Successful delivery: the parsed response body when the remote sent
/// one, or an empty receipt when the body was not parseable.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: Option<Value>,
}

/// Delivers finalized payloads with bounded retries and a fixed delay.
#[derive(Debug)]
pub struct SubmissionClient<T> {
    config: SubmissionConfig,
    transport: T,
}

impl SubmissionClient<HttpTransport> {
    pub fn new(config: SubmissionConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T> SubmissionClient<T>
where
    T: SubmissionTransport,
{
    pub fn with_transport(config: SubmissionConfig, transport: T) -> Self {
        let mut config = config;
        config.max_attempts = config.max_attempts.max(1);
        Self { config, transport }
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Issue up to `max_attempts` delivery attempts, each independently
    /// timed out, sleeping a fixed delay between attempts. Non-2xx
    /// statuses, network failures, and timeouts are all retried alike;
    /// a body that fails to parse on a 2xx is still a success.
    pub async fn submit(&self, payload: Value) -> Result<SubmissionReceipt, SubmissionError> {
        let mut payload = payload;
        if let (Some(api_key), Some(object)) =
            (self.config.api_key.as_ref(), payload.as_object_mut())
        {
            object.insert("apiKey".to_string(), Value::String(api_key.clone()));
        }

        let mut last: Option<AttemptFailure> = None;
        for attempt in 1..=self.config.max_attempts {
            match self
                .transport
                .post(&self.config.endpoint, &payload, self.config.attempt_timeout)
                .await
            {
                Ok(reply) if (200..300).contains(&reply.status) => {
                    debug!(attempt, status = reply.status, "submission accepted");
                    let body = serde_json::from_str(&reply.body).ok();
                    return Ok(SubmissionReceipt {
                        status: reply.status,
                        body,
                    });
                }
                Ok(reply) => {
                    last = Some(AttemptFailure::Status(reply.status));
                }
                Err(err) => {
                    last = Some(AttemptFailure::Transport(err));
                }
            }

            if let Some(failure) = &last {
                warn!(attempt, %failure, "submission attempt failed");
            }
            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(SubmissionError::Exhausted {
            attempts: self.config.max_attempts,
            last: last.unwrap_or(AttemptFailure::Transport(TransportError::Network(
                "no attempt executed".to_string(),
            ))),
        })
    }
}
