//! Per-request pipeline: load → build context → invoke → translate.

use crate::boundary::panic_message;
use crate::context::build_request;
use crate::error::{GatewayError, GatewayResult};
use crate::server::AppState;
use crate::translate::translate;
use axum::body::to_bytes;
use axum::extract::Request;
use edge_kernel::gateway::{AdaptedRequest, HandlerOutput, ResponseEnvelope, RouteMatch};
use edge_script::{HandlerEngine, HandlerModule, ScriptResult, StateHandle};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{Span, debug, info_span};

/// Phase of a request inside the pipeline.
///
/// Phases only move forward; `Failed` is reachable from any phase and is
/// followed by `Responded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Matched,
    Loading,
    ContextBuilt,
    Invoking,
    Translating,
    Responded,
    Failed,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestPhase::Matched => "matched",
            RequestPhase::Loading => "loading",
            RequestPhase::ContextBuilt => "context_built",
            RequestPhase::Invoking => "invoking",
            RequestPhase::Translating => "translating",
            RequestPhase::Responded => "responded",
            RequestPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared view of a request's current phase, readable by the boundary
/// after the pipeline future has failed or panicked.
#[derive(Debug, Clone)]
pub struct PhaseTracker(Arc<Mutex<RequestPhase>>);

impl Default for PhaseTracker {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(RequestPhase::Matched)))
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RequestPhase {
        *self.0.lock()
    }

    pub fn advance(&self, phase: RequestPhase) {
        *self.0.lock() = phase;
    }
}

/// Run a matched request through the handler pipeline.
pub async fn run(
    state: &AppState,
    route: RouteMatch,
    request: Request,
    request_id: &str,
    tracker: &PhaseTracker,
) -> GatewayResult<ResponseEnvelope> {
    tracker.advance(RequestPhase::Loading);
    let module = state.loader.load(&route.module).await?;
    debug!(request_id, route = %route.route, version = module.version, "Handler module ready");

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| GatewayError::Body(e.to_string()))?;
    let adapted = Arc::new(build_request(request_id, &parts, &route, &bytes));
    tracker.advance(RequestPhase::ContextBuilt);

    tracker.advance(RequestPhase::Invoking);
    let engine = state.engine.clone();
    let handle = state.states.handle(&module.path);
    let span = handler_span(request_id, &route.route, &module);
    let invoked = {
        let module = module.clone();
        tokio::task::spawn_blocking(move || invoke_in_span(span, &engine, &module, adapted, handle))
            .await
    };
    let output = match invoked {
        Ok(result) => result.map_err(|e| GatewayError::from_script(&module.path, e))?,
        Err(join) if join.is_panic() => {
            return Err(GatewayError::Invocation {
                message: format!("handler panicked: {}", panic_message(&*join.into_panic())),
                trace: None,
            });
        }
        Err(join) => {
            return Err(GatewayError::Invocation {
                message: join.to_string(),
                trace: None,
            });
        }
    };

    tracker.advance(RequestPhase::Translating);
    translate(output)
}

fn handler_span(request_id: &str, route: &str, module: &HandlerModule) -> Span {
    info_span!("handler", request_id, route, version = module.version)
}

/// Invoke on the current thread with `span` entered, so script log lines
/// carry the request id even on the blocking pool.
fn invoke_in_span(
    span: Span,
    engine: &HandlerEngine,
    module: &HandlerModule,
    request: Arc<AdaptedRequest>,
    state: StateHandle,
) -> ScriptResult<HandlerOutput> {
    let _entered = span.entered();
    engine.invoke(module, request, state)
}
