//! `edge-gateway`: local edge-function gateway.
//!
//! Serves handler modules from a functions directory over HTTP, reloading
//! each module when its source changes. Implements the contracts defined
//! in `edge_kernel::gateway`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | `GatewayRouter` | [`router::RouteTable`] |
//! | module loading | [`loader::HandlerRegistry`] behind [`loader::ModuleLoader`] |
//! | `HandlerOutput` → `ResponseEnvelope` | [`translate::translate`] |
//!
//! Requests flow through [`pipeline::run`] inside [`boundary::guard`], which
//! turns any failure into a single JSON error response.

pub mod boundary;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod router;
pub mod server;
pub mod state;
pub mod translate;

pub use config::GatewaySettings;
pub use error::{GatewayError, GatewayResult};
pub use server::{AppState, GatewayServer};
