use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::config::LocalizeOptions;
use crate::fetch::Fetcher;
use crate::host::{BufferDocument, DocumentHandle, Notice, WorkspaceRoot};
use crate::models::{LocalizeRequest, LocalizeResponse};
use crate::pipeline::{localize_images, LocalizeError};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn Fetcher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/localize", post(localize_endpoint))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn localize_endpoint(
    State(state): State<AppState>,
    Json(req): Json<LocalizeRequest>,
) -> Response {
    let workspaces: Vec<WorkspaceRoot> = req
        .workspace_roots
        .iter()
        .map(WorkspaceRoot::new)
        .collect();
    let mut options = LocalizeOptions {
        dedup: req.dedup,
        ..LocalizeOptions::default()
    };
    if let Some(dir) = req.images_dir {
        options.images_dir = dir;
    }

    let mut document = req
        .text
        .map(|text| BufferDocument::new(text, req.document_path.map(PathBuf::from)));
    let mut notices: Vec<Notice> = Vec::new();

    let result = localize_images(
        document.as_mut().map(|d| d as &mut dyn DocumentHandle),
        &workspaces,
        state.fetcher.as_ref(),
        &options,
        &mut notices,
    )
    .await;

    match result {
        Ok(report) => {
            let response = LocalizeResponse {
                text: document.and_then(BufferDocument::into_edited_text),
                localized: report.entries.len(),
                notices,
                report,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let status = match &e {
                LocalizeError::Precondition(_) | LocalizeError::InvalidImagesDir(_) => {
                    StatusCode::BAD_REQUEST
                }
                LocalizeError::ImagesDir { .. } | LocalizeError::EditApplication(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(json!({"detail": e.to_string(), "notices": notices})),
            )
                .into_response()
        }
    }
}
