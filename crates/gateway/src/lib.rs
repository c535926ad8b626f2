//! HTTP gateway: receives channel webhooks and runs them through the pipeline.

pub mod server;
pub mod state;

pub use {
    server::{ACK_OUTCOME_HEADER, build_gateway_app, serve, start_gateway},
    state::GatewayState,
};
