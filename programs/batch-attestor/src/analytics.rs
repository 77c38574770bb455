//! Fire-and-forget reporting of submitted batches.

use std::fmt;

use alloy_primitives::B256;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

pub const BATCH_SUBMITTED: &str = "batch_attestation_submitted";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    Direct,
    Multisig,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Multisig => "multisig",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub properties: Value,
}

impl AnalyticsEvent {
    #[must_use]
    pub fn batch_submitted(chain_id: u64, mode: SubmissionMode, schema: B256, count: usize) -> Self {
        Self {
            event: BATCH_SUBMITTED.to_string(),
            properties: json!({
                "chain_id": chain_id,
                "mode": mode,
                "schema": schema,
                "count": count,
            }),
        }
    }
}

/// Receives analytics events. Emitting must never block or fail the caller.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

/// Writes events to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn emit(&self, event: AnalyticsEvent) {
        tracing::info!(event = %event.event, properties = %event.properties, "analytics");
    }
}

/// POSTs events as JSON to an HTTP collector.
#[derive(Clone, Debug)]
pub struct HttpSink {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpSink {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl AnalyticsSink for HttpSink {
    fn emit(&self, event: AnalyticsEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(event = %event.event, "no runtime, dropping analytics event");
            return;
        };

        let request = self.http.post(self.endpoint.clone()).json(&event);
        runtime.spawn(async move {
            match request.send().await.and_then(reqwest::Response::error_for_status) {
                Ok(_) => tracing::trace!(event = %event.event, "analytics event delivered"),
                Err(e) => tracing::debug!(event = %event.event, "analytics event dropped: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_submitted_properties() {
        let event =
            AnalyticsEvent::batch_submitted(10, SubmissionMode::Multisig, B256::repeat_byte(1), 3);
        assert_eq!(event.event, BATCH_SUBMITTED);
        assert_eq!(event.properties["chain_id"], 10);
        assert_eq!(event.properties["mode"], "multisig");
        assert_eq!(event.properties["count"], 3);
        assert_eq!(
            event.properties["schema"],
            B256::repeat_byte(1).to_string()
        );
    }

    #[test]
    fn http_sink_without_runtime_does_not_panic() {
        let sink = HttpSink::new("http://127.0.0.1:9/events".parse().unwrap());
        sink.emit(AnalyticsEvent::batch_submitted(
            1,
            SubmissionMode::Direct,
            B256::ZERO,
            1,
        ));
    }
}
