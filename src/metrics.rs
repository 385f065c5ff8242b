//! Remote call metrics
//!
//! Counters live in the default prometheus registry and are exposed by the
//! plugin server on `/metrics`.

use prometheus::{Encoder, IntCounterVec, TextEncoder};
use std::sync::OnceLock;
use tracing::warn;

static API_REQUESTS: OnceLock<Option<IntCounterVec>> = OnceLock::new();

fn api_requests() -> Option<&'static IntCounterVec> {
    API_REQUESTS
        .get_or_init(|| {
            match prometheus::register_int_counter_vec!(
                "zentral_provider_api_requests_total",
                "Requests sent to the Zentral API",
                &["endpoint", "operation", "outcome"]
            ) {
                Ok(counter) => Some(counter),
                Err(e) => {
                    warn!("Could not register API request counter: {}", e);
                    None
                }
            }
        })
        .as_ref()
}

/// Outcome label of a remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Error,
    Cancelled,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// Count one remote call
pub fn record_api_request(endpoint: &str, operation: &str, outcome: Outcome) {
    if let Some(counter) = api_requests() {
        counter
            .with_label_values(&[endpoint, operation, outcome.as_str()])
            .inc();
    }
}

/// Current value of the remote call counter
pub fn api_request_count(endpoint: &str, operation: &str, outcome: Outcome) -> u64 {
    api_requests()
        .map(|counter| {
            counter
                .with_label_values(&[endpoint, operation, outcome.as_str()])
                .get()
        })
        .unwrap_or(0)
}

/// Text exposition of every registered metric
pub fn gather_text() -> String {
    // Make sure the counter family shows up even before the first call.
    let _ = api_requests();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!("Could not encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_api_request() {
        let before = api_request_count("/test/metrics/", "create", Outcome::Success);
        record_api_request("/test/metrics/", "create", Outcome::Success);
        record_api_request("/test/metrics/", "create", Outcome::Success);
        assert_eq!(api_request_count("/test/metrics/", "create", Outcome::Success), before + 2);

        let text = gather_text();
        assert!(text.contains("zentral_provider_api_requests_total"));
    }
}
