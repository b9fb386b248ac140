//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with local routes and the proxy fallback
//! - Wire up middleware (tracing, request ID, timeout, chaos)
//! - Bind server to listener and spawn the admin API
//! - Forward requests to the upstream
//! - Apply hot-reloaded chaos configuration

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri, Version,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::chaos::{ChaosEngine, Classifier};
use crate::config::validation::clamp_chaos_config;
use crate::config::{ChaosConfig, ProxyConfig};
use crate::http::middleware::{chaos_middleware, ChaosState};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the chaos proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    engine: Arc<ChaosEngine>,
}

impl HttpServer {
    /// Create a server with a fresh engine seeded from `config.chaos`.
    pub fn new(config: ProxyConfig) -> Self {
        let engine = Arc::new(ChaosEngine::new(config.chaos.clone()));
        Self::with_engine(config, engine)
    }

    /// Create a server around an existing engine (shared with the admin API).
    pub fn with_engine(config: ProxyConfig, engine: Arc<ChaosEngine>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let upstream = config
            .upstream
            .address
            .parse::<Authority>()
            .unwrap_or_else(|e| {
                tracing::error!(
                    address = %config.upstream.address,
                    error = %e,
                    "Invalid upstream address, falling back to 127.0.0.1:5000"
                );
                Authority::from_static("127.0.0.1:5000")
            });

        let state = AppState { client, upstream };
        let chaos = ChaosState::new(
            Arc::clone(&engine),
            Classifier::from_config(&config.routing),
        );

        let router = Self::build_router(&config, state, chaos);
        Self {
            router,
            config,
            engine,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, chaos: ChaosState) -> Router {
        Router::new()
            .route("/health/live", get(health))
            .route("/health/ready", get(health))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(chaos, chaos_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The proxy router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn engine(&self) -> &Arc<ChaosEngine> {
        &self.engine
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ChaosConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        // Hot reload of the chaos section, clamped like admin input.
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            while let Some(chaos) = config_updates.recv().await {
                engine.update_config(clamp_chaos_config(chaos)).await;
            }
        });

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_addr = admin_listener.local_addr()?;
            let admin_router = admin::setup_admin_router(admin::AdminState::new(
                Arc::clone(&self.engine),
                &self.config.admin.api_key,
            ));
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                tracing::info!(address = %admin_addr, "Admin API listening");
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> &'static str {
    "Healthy"
}

/// Forward the request to the upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request_id(&request).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    let (mut parts, body) = request.into_parts();

    // URI rewrite
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method, 502, start_time);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            upstream_response(response)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

fn upstream_response(response: hyper::Response<hyper::body::Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}
