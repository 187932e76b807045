//! Gateway runtime error types

use axum::response::{IntoResponse, Response};
use edge_kernel::gateway::ResponseEnvelope;
use edge_script::ScriptError;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while serving a request or starting the gateway.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The handler module is missing, does not compile, or its top-level
    /// statements failed.
    #[error("failed to load handler module '{}': {message}", module.display())]
    Load {
        module: PathBuf,
        message: String,
        trace: Option<String>,
    },

    /// The handler threw while running.
    #[error("{message}")]
    Invocation {
        message: String,
        trace: Option<String>,
    },

    /// The handler produced nothing the translator recognises.
    #[error("No response from function")]
    Translation,

    #[error("no route registered for '{0}'")]
    RouteNotFound(String),

    #[error("failed to read request body: {0}")]
    Body(String),

    /// A panic escaped the request pipeline.
    #[error("request pipeline panicked: {0}")]
    Panic(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read functions root '{}': {source}", root.display())]
    FunctionsRoot {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] edge_kernel::gateway::GatewayError),

    #[error(transparent)]
    Settings(#[from] edge_kernel::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Map a script failure for `module` onto the load/invoke taxonomy.
    pub fn from_script(module: impl Into<PathBuf>, err: ScriptError) -> Self {
        let trace = err.trace().map(str::to_string);
        if err.is_load_error() {
            GatewayError::Load {
                module: module.into(),
                message: err.to_string(),
                trace,
            }
        } else {
            GatewayError::Invocation {
                message: err.to_string(),
                trace,
            }
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::RouteNotFound(_) => 404,
            _ => 500,
        }
    }

    /// Engine diagnostic for the failure, when one exists.
    pub fn trace(&self) -> Option<&str> {
        match self {
            GatewayError::Load { trace, .. } | GatewayError::Invocation { trace, .. } => {
                trace.as_deref()
            }
            _ => None,
        }
    }

    /// The `{ "error": message }` envelope for this error. With
    /// `expose_stack`, a `stack` field carries the diagnostic trace.
    pub fn into_envelope(self, expose_stack: bool) -> ResponseEnvelope {
        let status = self.status();
        let mut body = json!({ "error": self.to_string() });
        if expose_stack {
            if let Some(trace) = self.trace() {
                body["stack"] = json!(trace);
            }
        }
        ResponseEnvelope::json(status, body)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        crate::translate::into_http(self.into_envelope(false))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use edge_kernel::gateway::EnvelopeBody;

    #[test]
    fn route_miss_is_404() {
        let envelope = GatewayError::RouteNotFound("/api/nope".into()).into_envelope(false);
        assert_eq!(envelope.status, 404);
        assert_eq!(
            envelope.body,
            EnvelopeBody::Json(json!({"error": "no route registered for '/api/nope'"}))
        );
    }

    #[test]
    fn stack_is_hidden_unless_exposed() {
        let err = || GatewayError::Invocation {
            message: "boom".into(),
            trace: Some("Runtime error: boom (line 1, position 20)".into()),
        };
        assert_eq!(
            err().into_envelope(false).body,
            EnvelopeBody::Json(json!({"error": "boom"}))
        );
        let exposed = err().into_envelope(true);
        assert_eq!(exposed.status, 500);
        match exposed.body {
            EnvelopeBody::Json(v) => assert!(v["stack"].as_str().unwrap().contains("line 1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn translation_error_message() {
        let envelope = GatewayError::Translation.into_envelope(true);
        assert_eq!(
            envelope.body,
            EnvelopeBody::Json(json!({"error": "No response from function"}))
        );
    }

    #[test]
    fn script_errors_split_into_load_and_invocation() {
        let load = GatewayError::from_script(
            "functions/x.rhai",
            ScriptError::MissingEntryPoint("functions/x.rhai".into()),
        );
        assert!(matches!(load, GatewayError::Load { .. }));

        let invoke = GatewayError::from_script(
            "functions/x.rhai",
            ScriptError::Runtime {
                message: "boom".into(),
                trace: "t".into(),
            },
        );
        assert!(matches!(invoke, GatewayError::Invocation { .. }));
        assert_eq!(invoke.to_string(), "boom");
    }
}
