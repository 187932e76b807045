//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires the route table, handler registry, script engine
//! and state store into one axum service. Every path goes through a single
//! fallback handler:
//!
//! | Request | Response |
//! |---------|----------|
//! | unregistered path, any method | `404 {"error": ...}` + CORS, loader untouched |
//! | `OPTIONS` on a registered path | `200`, empty body, CORS headers |
//! | anything else on a registered path | handler pipeline inside the error boundary |

use crate::boundary::guard;
use crate::config::GatewaySettings;
use crate::error::{GatewayError, GatewayResult};
use crate::loader::{HandlerRegistry, ModuleLoader, ModuleWatcher};
use crate::pipeline::{self, PhaseTracker};
use crate::router::RouteTable;
use crate::state::StateStore;
use crate::translate::into_http;
use axum::{
    Router,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};
use edge_kernel::gateway::{GatewayRouter, cors_preflight};
use edge_script::HandlerEngine;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into the dispatch handler via [`State`].
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub loader: Arc<dyn ModuleLoader>,
    pub engine: Arc<HandlerEngine>,
    pub states: Arc<StateStore>,
    pub expose_stack: bool,
    pub max_body_bytes: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level gateway server built from [`GatewaySettings`].
pub struct GatewayServer {
    settings: GatewaySettings,
    engine: Arc<HandlerEngine>,
}

impl GatewayServer {
    pub fn new(settings: GatewaySettings) -> Self {
        let engine = Arc::new(HandlerEngine::new(settings.script.clone()));
        Self { settings, engine }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// The script engine handler modules are compiled and run with.
    pub fn engine(&self) -> Arc<HandlerEngine> {
        self.engine.clone()
    }

    /// Resolve routes and assemble state around the given loader.
    pub fn build_state_with_loader(&self, loader: Arc<dyn ModuleLoader>) -> GatewayResult<AppState> {
        let config = self.settings.route_config()?;
        let routes = RouteTable::from_config(&config)?;
        for route in routes.routes() {
            info!(route = %route.path, module = %route.module.display(), "Registered route");
        }
        Ok(AppState {
            routes: Arc::new(routes),
            loader,
            engine: self.engine.clone(),
            states: Arc::new(StateStore::new()),
            expose_stack: self.settings.errors.expose_stack,
            max_body_bytes: self.settings.server.max_body_bytes,
        })
    }

    /// Resolve routes and assemble state with a fresh [`HandlerRegistry`].
    pub fn build_state(&self) -> GatewayResult<AppState> {
        self.build_state_with_loader(Arc::new(HandlerRegistry::new(self.engine.clone())))
    }

    /// The axum [`Router`] for `state`.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub fn build_app(&self) -> GatewayResult<Router> {
        Ok(Self::router(self.build_state()?))
    }

    pub fn build_app_with_loader(&self, loader: Arc<dyn ModuleLoader>) -> GatewayResult<Router> {
        Ok(Self::router(self.build_state_with_loader(loader)?))
    }

    /// Serve on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> GatewayResult<()> {
        let state = self.build_state()?;
        let _watcher = if self.settings.functions.watch {
            match ModuleWatcher::spawn(&self.settings.functions.root, state.loader.clone()) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    warn!(error = %err, "File watching disabled; edits are still picked up per request");
                    None
                }
            }
        } else {
            None
        };

        let addr = listener.local_addr()?;
        info!(addr = %addr, routes = state.routes.len(), "Edge gateway listening");
        axum::serve(listener, Self::router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Edge gateway stopped");
        Ok(())
    }

    /// Bind the configured address and serve. A bind failure (for example
    /// the port is already in use) is returned as [`GatewayError::Bind`].
    pub async fn start(self) -> GatewayResult<()> {
        let addr = self.settings.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        self.serve(listener).await
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let Some(route) = state.routes.resolve(&path) else {
        debug!(path = %path, method = %request.method(), "No route matched");
        return GatewayError::RouteNotFound(path).into_response();
    };
    info!(route = %route.route, method = %request.method(), path = %path, "Matched route");

    if request.method() == Method::OPTIONS {
        return into_http(cors_preflight());
    }

    let request_id = Uuid::new_v4().to_string();
    let tracker = PhaseTracker::new();
    let started = Instant::now();
    let route_path = route.route.clone();

    let envelope = guard(
        pipeline::run(&state, route, request, &request_id, &tracker),
        &request_id,
        &route_path,
        &tracker,
        state.expose_stack,
    )
    .await;

    info!(
        request_id = %request_id,
        route = %route_path,
        status = envelope.status,
        latency_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );
    into_http(envelope)
}
