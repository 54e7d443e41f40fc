
use prometheus::{Encoder, TextEncoder, Registry, IntCounterVec};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;
use tracing::warn;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static COMPLETION_CALLS: OnceLock<IntCounterVec> = OnceLock::new();
static REPLY_FINALIZATION: OnceLock<IntCounterVec> = OnceLock::new();

fn register_counter(
    slot: &OnceLock<IntCounterVec>,
    name: &str,
    help: &str,
    labels: &[&str],
) {
    if slot.get().is_some() {
        return;
    }
    match IntCounterVec::new(prometheus::opts!(name, help), labels) {
        Ok(counter) => {
            if slot.set(counter.clone()).is_ok() {
                REGISTRY.register(Box::new(counter)).ok();
            }
        }
        Err(e) => warn!("Failed to create metric {}: {}", name, e),
    }
}

pub fn init_metrics() {
    register_counter(&REQ_COUNTER, "requests_total", "Total requests per route", &["route", "status"]);
    register_counter(
        &COMPLETION_CALLS,
        "completion_calls_total",
        "Completion service calls by purpose and outcome",
        &["purpose", "outcome"],
    );
    register_counter(
        &REPLY_FINALIZATION,
        "reply_finalization_total",
        "Chat replies by finalization path",
        &["outcome"],
    );
}

pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}

/// `outcome` is `ok` or `error`.
pub fn inc_completion(purpose: &str, outcome: &str) {
    if let Some(counter) = COMPLETION_CALLS.get() {
        counter.with_label_values(&[purpose, outcome]).inc();
    }
}

pub fn inc_reply_finalization(outcome: &str) {
    if let Some(counter) = REPLY_FINALIZATION.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; version=0.0.4")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_and_counters_render() {
        init_metrics();
        init_metrics();
        inc_request("chat", "ok");
        inc_completion("reply", "ok");
        inc_reply_finalization("complete");

        let families = REGISTRY.gather();
        let names: Vec<_> = families.iter().map(|f| f.get_name().to_string()).collect();
        assert!(names.contains(&"requests_total".to_string()));
        assert!(names.contains(&"completion_calls_total".to_string()));
        assert!(names.contains(&"reply_finalization_total".to_string()));
    }
}
