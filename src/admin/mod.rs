//! Admin API: inspect and replace the live chaos configuration.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::chaos::ChaosEngine;

#[derive(Debug, Clone)]
pub struct AdminState {
    pub engine: Arc<ChaosEngine>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(engine: Arc<ChaosEngine>, api_key: &str) -> Self {
        Self {
            engine,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/chaos", get(get_chaos).put(put_chaos))
        .route("/admin/chaos/active", get(get_active))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
