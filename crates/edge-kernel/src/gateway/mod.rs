//! Edge-function gateway kernel contract.
//!
//! This module defines the *trait interfaces and data types* of the local
//! edge-function gateway. No concrete implementations live here: the route
//! table, handler registry and HTTP server belong in `edge-gateway`, the
//! script runtime that executes handler modules in `edge-script`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              edge-kernel  (this module)                     │
//! │  GatewayRouter trait    RouteEntry / RouteMatch             │
//! │  GatewayConfig + validate()   GatewayError                  │
//! │  AdaptedRequest   HandlerOutput   ResponseEnvelope          │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//! ┌───────────────▼──────────────┐ ┌────────────▼───────────────┐
//! │  edge-script                 │ │  edge-gateway              │
//! │  HandlerEngine (Rhai)        │ │  RouteTable, registry,     │
//! │  Request / ResponseBuilder   │ │  translator, boundary,     │
//! │  Response adapter            │ │  axum server               │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use edge_kernel::gateway::{GatewayConfig, RouteEntry};
//!
//! let config = GatewayConfig::new()
//!     .with_route(RouteEntry::new("/api/calculator", "functions/calculator.rhai"))
//!     .with_route(RouteEntry::new("/api/counter", "functions/counter.rhai"));
//!
//! config.validate().expect("gateway config is valid");
//! ```

pub mod envelope;
pub mod error;
pub mod router;
pub mod types;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use envelope::{
    CORS_HEADERS, EnvelopeBody, HandlerOutput, ResponseEnvelope, ResponseRecord, ReturnedBody,
    ReturnedResponse, ReturnedValue, cors_preflight,
};
pub use error::GatewayError;
pub use router::{GatewayRouter, RouteEntry};
pub use types::{AdaptedRequest, RequestBody, RouteMatch};
pub use validation::GatewayConfig;
