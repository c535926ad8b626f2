use std::{future::Future, sync::Arc};

use {
    answerline_channels::{AckOutcome, AckTracker, PendingAck},
    answerline_config::ServerConfig,
    answerline_whatsapp::{EMPTY_TWIML, TWIML_CONTENT_TYPE, TwilioWebhookForm},
    axum::{
        Form, Json, Router,
        extract::{State, rejection::FormRejection},
        http::{HeaderValue, StatusCode, header},
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    tokio::net::TcpListener,
    tower_http::trace::TraceLayer,
    tracing::{debug, error, info, warn},
};

use crate::state::GatewayState;

/// Response header naming the pipeline path that acknowledged the call.
pub const ACK_OUTCOME_HEADER: &str = "x-ack-outcome";

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>, webhook_path: &str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(webhook_path, post(whatsapp_webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then wait for background work to finish.
pub async fn serve(
    listener: TcpListener,
    state: Arc<GatewayState>,
    webhook_path: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_gateway_app(Arc::clone(&state), webhook_path);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    let tasks = state.pipeline.tasks();
    info!(in_flight = tasks.len(), "server stopped, draining background tasks");
    tasks.shutdown().await;
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn start_gateway(server: &ServerConfig, state: Arc<GatewayState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind((server.bind.as_str(), server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        webhook = %server.webhook_path,
        version = state.version,
        "gateway listening"
    );
    serve(listener, state, &server.webhook_path, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "background_tasks": state.pipeline.tasks().len(),
    }))
}

/// The fixed empty TwiML acknowledgment. Twilio gets this on every path.
fn twiml_ack(outcome: AckOutcome) -> Response {
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        EMPTY_TWIML,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&outcome.to_string()) {
        response.headers_mut().insert(ACK_OUTCOME_HEADER, value);
    }
    response
}

async fn whatsapp_webhook_handler(
    State(state): State<Arc<GatewayState>>,
    form: Result<Form<TwilioWebhookForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return twiml_ack(AckOutcome::Rejected);
        },
    };
    let message_sid = form.message_sid.clone().unwrap_or_default();
    let inbound = match form.into_inbound() {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(%message_sid, error = %e, "rejecting webhook call");
            return twiml_ack(AckOutcome::Rejected);
        },
    };

    // Own task, so a dropped connection cannot cancel the pipeline midway.
    let pipeline = Arc::clone(&state.pipeline);
    let run = state.pipeline.tasks().track(async move {
        let mut ack = AckTracker::new(PendingAck::new());
        pipeline.handle(inbound, &mut ack).await;
        ack.into_inner().outcome()
    });

    let outcome = match run.await {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            warn!(%message_sid, "pipeline returned without acknowledging");
            AckOutcome::Failed
        },
        Err(e) => {
            error!(%message_sid, error = %e, "pipeline task aborted");
            AckOutcome::Failed
        },
    };
    debug!(%message_sid, %outcome, "webhook acknowledged");
    twiml_ack(outcome)
}
