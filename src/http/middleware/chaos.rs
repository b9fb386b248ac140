//! Chaos injection middleware.
//!
//! Sits between the request-ID/timeout layers and the proxy handler, so
//! `next.run` is "forward to the upstream".

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::chaos::{ChaosEngine, Classifier, Decision, Disposition, Injection};
use crate::http::request::request_id;
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct ChaosState {
    pub engine: Arc<ChaosEngine>,
    pub classifier: Arc<Classifier>,
}

impl ChaosState {
    pub fn new(engine: Arc<ChaosEngine>, classifier: Classifier) -> Self {
        Self {
            engine,
            classifier: Arc::new(classifier),
        }
    }
}

pub async fn chaos_middleware(
    State(state): State<ChaosState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // 1. Excluded paths never see chaos.
    let Some(context) = state.classifier.classify(&path) else {
        return next.run(request).await;
    };

    // 2. Decide and pick against one snapshot.
    let Decision {
        triggered,
        injection,
    } = state.engine.choose(context);
    metrics::record_decision(context, triggered);
    let Some(Injection { kind, config }) = injection else {
        return next.run(request).await;
    };

    tracing::warn!(
        request_id = %request_id(&request),
        kind = %kind,
        context = %context,
        path = %path,
        "Chaos triggered"
    );
    metrics::record_injection(kind);

    // 3. Apply.
    match state.engine.executor().execute(kind, &config, &path).await {
        Disposition::Forward => next.run(request).await,
        Disposition::ForwardThenDelay(delay) => {
            let response = next.run(request).await;
            tokio::time::sleep(delay).await;
            response
        }
        Disposition::Respond(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChaosConfig, FrequencyStrategy};
    use axum::{middleware::from_fn_with_state, Router};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn triggering_without_faults() -> ChaosConfig {
        let mut config = ChaosConfig::default();
        config.enabled = true;
        config.frequency.strategy = FrequencyStrategy::Percentage;
        config.frequency.percentage = 100;
        config
    }

    #[test]
    fn trigger_without_faults_is_counted_as_triggered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let status = ::metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let engine = Arc::new(ChaosEngine::new(triggering_without_faults()));
                let app = Router::new()
                    .fallback(|| async { "upstream" })
                    .layer(from_fn_with_state(
                        ChaosState::new(engine, Classifier::default()),
                        chaos_middleware,
                    ));
                let res = app
                    .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                res.status()
            })
        });

        assert_eq!(status, 200);
        let rendered = handle.render();
        assert!(rendered.contains("triggered=\"true\""), "{rendered}");
        assert!(!rendered.contains("triggered=\"false\""), "{rendered}");
        assert!(!rendered.contains("chaos_injections_total"), "{rendered}");
    }
}
