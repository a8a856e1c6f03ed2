//! HTTP application for famcal.
//!
//! Exposed as a library so integration tests can drive the full router
//! (gate included) without binding a socket.

pub mod auth;
pub mod config;
pub mod gate;
pub mod routes;
pub mod state;
pub mod store;

use axum::{middleware, Router};

use crate::state::AppState;

/// Assemble the full router with the access gate in front of every route.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::events::router())
        .merge(routes::tags::router())
        .merge(routes::profile::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::access_gate,
        ))
        .with_state(state)
}
