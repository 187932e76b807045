//! `edge-script`: the Rhai runtime that executes handler modules.
//!
//! Provides:
//! - [`HandlerEngine`]: compiles a module, detects its calling convention,
//!   and invokes it against an [`AdaptedRequest`](edge_kernel::gateway::AdaptedRequest)
//! - the script-side `Request`, `Response` and `ResponseBuilder` types
//! - [`StateHandle`], per-module state shared across invocations
//! - a small standard library (logging, JSON, time, numbers)
//!
//! ```rust
//! use edge_kernel::gateway::{AdaptedRequest, ReturnedValue};
//! use edge_script::{HandlerEngine, StateHandle};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let engine = HandlerEngine::default();
//! let module = engine
//!     .compile(Path::new("hello.rhai"), r#"fn handler(req) { #{ hello: req.path } }"#, "d0", 1)
//!     .unwrap();
//! let out = engine
//!     .invoke(&module, Arc::new(AdaptedRequest::new("r1", "GET", "/api/hello")), StateHandle::new())
//!     .unwrap();
//! assert_eq!(out.returned, ReturnedValue::Value(serde_json::json!({"hello": "/api/hello"})));
//! ```

pub mod convert;
pub mod engine;
pub mod error;
pub mod request;
pub mod response;
pub mod state;
mod stdlib;

pub use convert::{dynamic_to_json, json_to_dynamic};
pub use engine::{ENTRY_POINT, EntryPoint, HandlerEngine, HandlerKind, HandlerModule, ScriptLimits};
pub use error::{ScriptError, ScriptResult};
pub use request::EdgeRequest;
pub use response::{ResponseBuilder, ResponseValue};
pub use state::StateHandle;
