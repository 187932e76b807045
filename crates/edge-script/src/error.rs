//! Typed errors for the handler script runtime.

use rhai::EvalAltResult;
use thiserror::Error;

/// Errors raised while compiling or running a handler module.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScriptError {
    /// The module source did not parse.
    #[error("failed to compile '{path}': {message}")]
    Compile { path: String, message: String },

    /// The module defines no `handler` function.
    #[error("module '{0}' does not define a `handler` function")]
    MissingEntryPoint(String),

    /// The module defines `handler` with neither one nor two parameters.
    #[error("`handler` in '{path}' takes {arity} parameters; expected (req) or (req, res)")]
    UnsupportedArity { path: String, arity: usize },

    /// The module's top-level statements failed.
    #[error("{message}")]
    Evaluate { message: String, trace: String },

    /// The entry point threw or failed while running.
    #[error("{message}")]
    Runtime { message: String, trace: String },
}

impl ScriptError {
    /// `true` for failures that happen before the entry point is entered.
    pub fn is_load_error(&self) -> bool {
        !matches!(self, ScriptError::Runtime { .. })
    }

    /// Full engine diagnostic (positions, call chain) when one exists.
    pub fn trace(&self) -> Option<&str> {
        match self {
            ScriptError::Evaluate { trace, .. } | ScriptError::Runtime { trace, .. } => {
                Some(trace.as_str())
            }
            _ => None,
        }
    }

    pub(crate) fn evaluate(err: Box<EvalAltResult>) -> Self {
        ScriptError::Evaluate {
            message: thrown_message(&err),
            trace: err.to_string(),
        }
    }

    pub(crate) fn runtime(err: Box<EvalAltResult>) -> Self {
        ScriptError::Runtime {
            message: thrown_message(&err),
            trace: err.to_string(),
        }
    }
}

/// Convenience result alias for the script runtime.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// The message a handler author would expect to see: the thrown value for
/// `throw`, the engine's description for anything else.
fn thrown_message(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => thrown_message(inner),
        EvalAltResult::ErrorRuntime(value, _) => {
            if value.is_string() {
                return value.to_string();
            }
            if let Some(map) = value.read_lock::<rhai::Map>() {
                if let Some(message) = map.get("message") {
                    return message.to_string();
                }
            }
            value.to_string()
        }
        other => other.to_string(),
    }
}
