use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use election_results::*;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use snafu::prelude::*;

use crate::dashboard::render::render_dashboard;
use crate::dashboard::*;

/// The query string of the page. Every value is optional and invalid values
/// are replaced by defaults, so the page never fails on a bad link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub mode: Option<String>,
    pub vote_type: Option<String>,
    pub state: Option<String>,
    pub top_n: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateParams {
    pub state: Option<String>,
    pub vote_type: Option<String>,
}

pub fn router(app: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/states", get(api_states))
        .route("/api/aggregate", get(api_aggregate))
        .route("/healthz", get(healthz))
        .with_state(app)
}

async fn index(
    State(app): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Html<String> {
    debug!("index: {:?}", params);
    let req = PageRequest::resolve(
        params.mode.as_deref(),
        params.vote_type.as_deref(),
        params.state.as_deref(),
        params.top_n.as_deref(),
        &app,
    );
    Html(render_dashboard(&app, &req))
}

async fn api_states(State(app): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "states": app.dataset.states() }))
}

async fn api_aggregate(
    State(app): State<Arc<AppState>>,
    Query(params): Query<AggregateParams>,
) -> Response {
    let vote_type = match params.vote_type.as_deref() {
        None => VoteType::Second,
        Some(s) => match VoteType::parse(s) {
            Some(vt) => vt,
            None => {
                let msg = format!("unknown vote type {:?}, expected first or second", s);
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
            }
        },
    };
    let state = StateFilter::parse(params.state.as_deref().unwrap_or(""));
    if let StateFilter::State(s) = &state {
        if !app.dataset.has_state(s) {
            warn!("api_aggregate: unknown state {:?}, returning no result", s);
        }
    }
    let selection = Selection { state, vote_type };
    let view = aggregate(&app.dataset, &selection);
    Json(view_to_json(&selection, &view)).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves the dashboard until the process is stopped.
pub async fn serve(app: AppState, host: &str, port: u16) -> DashboardResult<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(BindSnafu { addr: addr.clone() })?;
    info!("Serving the dashboard on http://{}", addr);
    axum::serve(listener, router(Arc::new(app)))
        .await
        .context(ServeSnafu {})
}
