//! Signed outbound webhooks.
//!
//! Request handlers call [`trigger_webhook`], which resolves the subscribed
//! endpoints and hands one [`WebhookJob`] per endpoint to a
//! [`WebhookDispatcher`]. The production dispatcher forwards jobs over a
//! channel to a background task that performs the HTTP delivery, retries and
//! logs every attempt.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::domain::types::{TenantId, WebhookId};
use crate::domain::webhook::{NewWebhookDelivery, WebhookEvent};
use crate::repository::{WebhookReader, WebhookWriter};

type HmacSha256 = Hmac<Sha256>;

/// Oldest signature timestamp accepted by [`verify_signature`].
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;
pub const MAX_DELIVERY_ATTEMPTS: i32 = 3;
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

const LOGGED_PAYLOAD_CHARS: usize = 10_000;
const LOGGED_RESPONSE_CHARS: usize = 1_000;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("delivery queue is closed")]
    QueueClosed,
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"` keyed by the endpoint secret.
pub fn generate_signature(
    payload: &str,
    secret: &str,
    timestamp: i64,
) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a received signature in constant time, rejecting timestamps more
/// than [`SIGNATURE_TOLERANCE_SECS`] away from `now`.
pub fn verify_signature(
    payload: &str,
    signature: &str,
    secret: &str,
    timestamp: i64,
    now: DateTime<Utc>,
) -> bool {
    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// New endpoint secret, `whsec_` followed by 64 hex characters.
pub fn generate_webhook_secret() -> String {
    format!(
        "whsec_{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Event envelope posted to every endpoint.
pub fn build_envelope(event: WebhookEvent, data: Value, created_at: DateTime<Utc>) -> Value {
    json!({
        "type": event.as_str(),
        "data": data,
        "createdAt": created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// One event to deliver to one endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookJob {
    pub webhook_id: WebhookId,
    pub url: String,
    pub secret: String,
    pub event: WebhookEvent,
    /// Serialized envelope, signed as-is.
    pub payload: String,
}

/// Accepts delivery jobs without blocking the caller.
pub trait WebhookDispatcher: Send + Sync {
    fn dispatch(&self, job: WebhookJob) -> Result<(), WebhookError>;
}

/// Sends every subscribed endpoint of the tenant a signed copy of the event.
///
/// Returns the number of endpoints a delivery was queued for. Failures are
/// logged and reported as zero so callers never fail because of webhooks.
pub fn trigger_webhook<R>(
    repo: &R,
    dispatcher: &dyn WebhookDispatcher,
    tenant_id: TenantId,
    event: WebhookEvent,
    data: Value,
) -> usize
where
    R: WebhookReader + ?Sized,
{
    let webhooks = match repo.list_subscribed_webhooks(tenant_id, event) {
        Ok(webhooks) => webhooks,
        Err(e) => {
            log::error!("Failed to load webhooks for {event} (tenant {tenant_id}): {e}");
            return 0;
        }
    };
    if webhooks.is_empty() {
        return 0;
    }

    let payload = build_envelope(event, data, Utc::now()).to_string();
    let mut queued = 0;
    for webhook in webhooks {
        let job = WebhookJob {
            webhook_id: webhook.id,
            url: webhook.url.into_inner(),
            secret: webhook.secret,
            event,
            payload: payload.clone(),
        };
        match dispatcher.dispatch(job) {
            Ok(()) => queued += 1,
            Err(e) => log::error!("Failed to queue webhook {}: {e}", webhook.id),
        }
    }
    queued
}

/// Result of one HTTP attempt.
struct AttemptOutcome {
    status_code: Option<i32>,
    response: String,
    success: bool,
}

async fn attempt_delivery(
    client: &reqwest::Client,
    job: &WebhookJob,
    signature: &str,
    timestamp: i64,
) -> AttemptOutcome {
    let result = client
        .post(&job.url)
        .header("Content-Type", "application/json")
        .header("X-Webhook-Event", job.event.as_str())
        .header("X-Webhook-Signature", signature)
        .header("X-Webhook-Timestamp", timestamp.to_string())
        .header("X-Webhook-ID", job.webhook_id.to_string())
        .body(job.payload.clone())
        .send()
        .await;

    match result {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            AttemptOutcome {
                status_code: Some(i32::from(status.as_u16())),
                response: body,
                success: status.is_success(),
            }
        }
        Err(e) => AttemptOutcome {
            status_code: None,
            response: e.to_string(),
            success: false,
        },
    }
}

async fn record_attempt<R>(repo: &R, delivery: NewWebhookDelivery)
where
    R: WebhookWriter + Clone + Send + 'static,
{
    let repo = repo.clone();
    let logged = tokio::task::spawn_blocking(move || repo.create_webhook_delivery(&delivery)).await;
    match logged {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => log::error!("Failed to log webhook delivery: {e}"),
        Err(e) => log::error!("Webhook delivery logger panicked: {e}"),
    }
}

/// Posts the job up to [`MAX_DELIVERY_ATTEMPTS`] times, waiting `attempt`
/// seconds between tries. Returns whether an attempt succeeded.
pub async fn deliver<R>(client: &reqwest::Client, repo: &R, job: &WebhookJob) -> bool
where
    R: WebhookWriter + Clone + Send + 'static,
{
    let timestamp = Utc::now().timestamp();
    let signature = match generate_signature(&job.payload, &job.secret, timestamp) {
        Ok(signature) => signature,
        Err(e) => {
            log::error!("Cannot sign webhook {}: {e}", job.webhook_id);
            return false;
        }
    };

    for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
        let outcome = attempt_delivery(client, job, &signature, timestamp).await;
        record_attempt(
            repo,
            NewWebhookDelivery {
                webhook_id: job.webhook_id,
                event: job.event.as_str().to_string(),
                payload: truncate_chars(&job.payload, LOGGED_PAYLOAD_CHARS),
                response: Some(truncate_chars(&outcome.response, LOGGED_RESPONSE_CHARS)),
                status_code: outcome.status_code,
                success: outcome.success,
                attempts: attempt,
            },
        )
        .await;

        if outcome.success {
            log::info!(
                "Delivered {} to webhook {} on attempt {attempt}",
                job.event,
                job.webhook_id
            );
            return true;
        }
        if attempt < MAX_DELIVERY_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
        }
    }

    log::info!(
        "Giving up on {} for webhook {} after {MAX_DELIVERY_ATTEMPTS} attempts",
        job.event,
        job.webhook_id
    );
    false
}

/// Dispatcher backed by an unbounded channel drained by a tokio task.
///
/// Must be started from within a tokio runtime.
pub struct ChannelDispatcher {
    sender: UnboundedSender<WebhookJob>,
}

impl ChannelDispatcher {
    pub fn start<R>(repo: R) -> Result<Self, WebhookError>
    where
        R: WebhookWriter + Clone + Send + Sync + 'static,
    {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        let (sender, mut receiver) = unbounded_channel::<WebhookJob>();

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let client = client.clone();
                let repo = repo.clone();
                tokio::spawn(async move {
                    deliver(&client, &repo, &job).await;
                });
            }
            log::info!("Webhook delivery worker stopped");
        });

        Ok(Self { sender })
    }
}

impl WebhookDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: WebhookJob) -> Result<(), WebhookError> {
        self.sender
            .send(job)
            .map_err(|_| WebhookError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "whsec_test";

    #[test]
    fn signature_is_hex_hmac_of_timestamp_and_payload() {
        let signature = generate_signature(r#"{"a":1}"#, SECRET, 1_700_000_000).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(
            signature,
            generate_signature(r#"{"a":1}"#, SECRET, 1_700_000_001).unwrap()
        );
    }

    #[test]
    fn verify_accepts_fresh_and_rejects_stale_or_tampered() {
        let ts = 1_700_000_000;
        let now = Utc.timestamp_opt(ts + 10, 0).unwrap();
        let payload = r#"{"type":"booking.created"}"#;
        let signature = generate_signature(payload, SECRET, ts).unwrap();

        assert!(verify_signature(payload, &signature, SECRET, ts, now));
        assert!(!verify_signature("{}", &signature, SECRET, ts, now));
        assert!(!verify_signature(payload, &signature, "other", ts, now));
        assert!(!verify_signature(payload, "zz", SECRET, ts, now));

        let late = Utc.timestamp_opt(ts + SIGNATURE_TOLERANCE_SECS + 1, 0).unwrap();
        assert!(!verify_signature(payload, &signature, SECRET, ts, late));
    }

    #[test]
    fn envelope_carries_type_data_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        let envelope = build_envelope(WebhookEvent::BookingCreated, json!({"id": 3}), at);
        assert_eq!(envelope["type"], "booking.created");
        assert_eq!(envelope["data"]["id"], 3);
        assert_eq!(envelope["createdAt"], "2026-01-05T09:30:00.000Z");
    }

    #[test]
    fn secrets_are_unique_and_prefixed() {
        let a = generate_webhook_secret();
        let b = generate_webhook_secret();
        assert!(a.starts_with("whsec_"));
        assert_eq!(a.len(), 6 + 64);
        assert_ne!(a, b);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
