//! Axum web surface.
//!
//! Routes:
//! - GET `/api/state` - JSON status snapshot
//! - GET `/?action=set_color&color=<tag>` - manual color toggle
//! - GET `/?action=set_mode&mode=<tag>` - mode toggle
//! - GET `/` - control page
//!
//! Actions ride on the page URL as query parameters so the page can stay
//! a plain document with `fetch` calls and no POST plumbing. A request
//! with no action, or an unrecognized action, just serves the page.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::color::Color;
use crate::config::NetworkConfig;
use crate::controller::StatusSnapshot;
use crate::mode::Mode;
use crate::traits::LightOutput;

use super::shared::SharedLightState;

/// Query parameters of the control surface.
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    action: Option<String>,
    color: Option<String>,
    mode: Option<String>,
}

/// GET /api/state - current system snapshot.
async fn get_state<L: LightOutput + Send + 'static>(
    State(state): State<Arc<SharedLightState<L>>>,
) -> Json<StatusSnapshot> {
    Json(state.snapshot())
}

/// GET / - apply a control action if one is present, else serve the page.
async fn index<L: LightOutput + Send + 'static>(
    State(state): State<Arc<SharedLightState<L>>>,
    Query(query): Query<ActionQuery>,
) -> Response {
    match query.action.as_deref() {
        Some("set_color") => {
            let Some(color) = query.color.as_deref().and_then(Color::from_text) else {
                return (StatusCode::BAD_REQUEST, "unrecognized color").into_response();
            };
            state.set_manual_color(color);
            StatusCode::OK.into_response()
        }
        Some("set_mode") => {
            let Some(mode) = query.mode.as_deref().and_then(Mode::from_text) else {
                return (StatusCode::BAD_REQUEST, "unrecognized mode").into_response();
            };
            state.set_mode(mode);
            StatusCode::OK.into_response()
        }
        _ => Html(include_str!("../../www/index.html")).into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

/// Build the router over shared state.
pub fn build_router<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    network: &NetworkConfig,
) -> Router {
    let mut router = Router::new()
        .route("/api/state", get(get_state::<L>))
        .route("/", get(index::<L>))
        .fallback(not_found)
        .with_state(state);

    if network.cors_permissive {
        router = router
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    router
}

/// Bind and serve until the server future is dropped or errors.
pub async fn serve<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    network: &NetworkConfig,
) -> std::io::Result<()> {
    let router = build_router(state, network);
    let listener = tokio::net::TcpListener::bind(network.web_addr()).await?;
    info!(addr = %network.web_addr(), "web server listening");
    axum::serve(listener, router).await
}
