//! HTTP surface for a running engine.
//!
//! Handlers never touch the engine: inputs go into the shared signal cells,
//! outputs are read from the render task's `watch` channel.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tess_core::{EngineStatus, Frame, SignalCell, clamp_coherence, clamp_rotation_speed};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::render::Published;

#[derive(Clone)]
pub struct AppState {
    pub coherence: SignalCell,
    pub speed: SignalCell,
    pub published: watch::Receiver<Published>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SignalRequest {
    pub value: f64,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct SignalAccepted {
    /// Value as received.
    pub value: f64,
    /// Value the engine will use after clamping.
    pub effective: f64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/frame", get(get_frame))
        .route("/frames", get(stream_frames))
        .route("/coherence", post(post_coherence))
        .route("/speed", post(post_speed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.published.borrow().status)
}

async fn get_frame(State(state): State<AppState>) -> Result<Json<Frame>, StatusCode> {
    let frame = state.published.borrow().frame.clone();
    frame.map(Json).ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn post_coherence(
    State(state): State<AppState>,
    Json(req): Json<SignalRequest>,
) -> Json<SignalAccepted> {
    state.coherence.set(req.value);
    let effective = clamp_coherence(req.value);
    if effective != req.value {
        tracing::debug!("coherence {} clamped to {effective}", req.value);
    }
    Json(SignalAccepted {
        value: req.value,
        effective,
    })
}

async fn post_speed(
    State(state): State<AppState>,
    Json(req): Json<SignalRequest>,
) -> Json<SignalAccepted> {
    state.speed.set(req.value);
    let effective = clamp_rotation_speed(req.value);
    if effective != req.value {
        tracing::debug!("rotation speed {} clamped to {effective}", req.value);
    }
    Json(SignalAccepted {
        value: req.value,
        effective,
    })
}

/// Server-sent events: one `frame` event per published frame. Slow clients
/// skip frames rather than queueing them.
async fn stream_frames(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.published.clone();
    let stream = async_stream::stream! {
        while rx.changed().await.is_ok() {
            let frame = rx.borrow_and_update().frame.clone();
            let Some(frame) = frame else { continue };
            match Event::default().event("frame").json_data(&frame) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!("failed to encode frame {}: {e}", frame.tick),
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
