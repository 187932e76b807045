//! Error boundary around the request pipeline.

use crate::error::{GatewayError, GatewayResult};
use crate::pipeline::{PhaseTracker, RequestPhase};
use edge_kernel::gateway::ResponseEnvelope;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Drive `pipeline` to exactly one envelope.
///
/// Errors and panics become a logged `{"error": ...}` envelope (404 for a
/// routing miss, 500 otherwise). Nothing is retried and nothing escapes.
pub async fn guard<F>(
    pipeline: F,
    request_id: &str,
    route: &str,
    tracker: &PhaseTracker,
    expose_stack: bool,
) -> ResponseEnvelope
where
    F: Future<Output = GatewayResult<ResponseEnvelope>>,
{
    let result = match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(GatewayError::Panic(panic_message(&*panic))),
    };

    let envelope = match result {
        Ok(envelope) => envelope,
        Err(err) => {
            let phase = tracker.current();
            tracker.advance(RequestPhase::Failed);
            error!(
                request_id,
                route,
                %phase,
                error = %err,
                trace = err.trace().unwrap_or_default(),
                "Request failed"
            );
            err.into_envelope(expose_stack)
        }
    };
    tracker.advance(RequestPhase::Responded);
    envelope
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_kernel::gateway::EnvelopeBody;
    use serde_json::json;

    #[tokio::test]
    async fn success_passes_through() {
        let tracker = PhaseTracker::new();
        let envelope = guard(
            async { Ok(ResponseEnvelope::json(201, json!({"ok": true}))) },
            "r1",
            "/api/x",
            &tracker,
            false,
        )
        .await;
        assert_eq!(envelope.status, 201);
        assert_eq!(tracker.current(), RequestPhase::Responded);
    }

    #[tokio::test]
    async fn error_becomes_500_envelope() {
        let tracker = PhaseTracker::new();
        tracker.advance(RequestPhase::Invoking);
        let envelope = guard(
            async {
                Err(GatewayError::Invocation {
                    message: "boom".into(),
                    trace: None,
                })
            },
            "r1",
            "/api/x",
            &tracker,
            false,
        )
        .await;
        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.body, EnvelopeBody::Json(json!({"error": "boom"})));
        assert_eq!(tracker.current(), RequestPhase::Responded);
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let tracker = PhaseTracker::new();
        let envelope = guard(
            async {
                if true {
                    panic!("pipeline exploded");
                }
                Ok(ResponseEnvelope::new(200))
            },
            "r1",
            "/api/x",
            &tracker,
            false,
        )
        .await;
        assert_eq!(envelope.status, 500);
        assert_eq!(
            envelope.body,
            EnvelopeBody::Json(json!({"error": "request pipeline panicked: pipeline exploded"}))
        );
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
