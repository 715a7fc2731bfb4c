use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::dispatch::NotificationDispatcher;
use crate::interaction::InteractionHandler;
use crate::telegram::decode_update;

#[derive(Clone)]
pub struct TriggerState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub interactions: Arc<InteractionHandler>,
    pub clock: Arc<dyn Clock>,
}

/// `GET /` runs a sweep, `POST /` takes a messenger webhook update.
pub fn router(state: TriggerState) -> Router {
    Router::new()
        .route("/", get(run_sweep).post(process_update))
        .with_state(state)
}

pub async fn serve(
    bind: &str,
    state: TriggerState,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    Ok(())
}

async fn run_sweep(State(state): State<TriggerState>) -> Response {
    match state.dispatcher.sweep(state.clock.now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => {
            log::error!("Triggered sweep failed: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

async fn process_update(State(state): State<TriggerState>, body: String) -> StatusCode {
    let event = match decode_update(&body) {
        Ok(event) => event,
        Err(error) => {
            log::warn!("Rejected malformed update: {error}");
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Some(event) = event {
        if let Err(error) = state.interactions.handle(event).await {
            log::debug!("Update handled with error: {error}");
        }
    }

    StatusCode::OK
}
