//! `edge-kernel`: contract types for the local edge-function gateway.
//!
//! Nothing in here touches a socket or a script engine. The crate defines
//! the vocabulary the other two crates speak:
//!
//! | Concern | Types |
//! |---------|-------|
//! | Routing | [`gateway::RouteEntry`], [`gateway::RouteMatch`], [`gateway::GatewayRouter`] |
//! | Startup validation | [`gateway::GatewayConfig`], [`gateway::GatewayError`] |
//! | Handler input | [`gateway::AdaptedRequest`], [`gateway::RequestBody`] |
//! | Handler output | [`gateway::HandlerOutput`], [`gateway::ResponseRecord`], [`gateway::ResponseEnvelope`] |
//! | Configuration files | [`config`] (behind the `config` feature) |

#[cfg(feature = "config")]
pub mod config;

pub mod gateway;
