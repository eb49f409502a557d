//! Statement upload and analysis handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use resilience_core::{analyze_statement, AnalysisReport, InsightFusion};

/// POST /upload - Analyze a CSV statement sent as multipart field `file`
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut total_size: usize = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;
        total_size += bytes.len();

        if total_size > MAX_UPLOAD_SIZE {
            return Err(too_large());
        }

        file_data = Some(bytes.to_vec());
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    analyze_bytes(&state, &file_data).await
}

/// Body for `POST /upload/json`
#[derive(Debug, Deserialize)]
pub struct UploadJsonRequest {
    pub csv_data: String,
}

/// POST /upload/json - Analyze CSV text sent in a JSON body
pub async fn upload_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadJsonRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    if request.csv_data.len() > MAX_UPLOAD_SIZE {
        return Err(too_large());
    }
    analyze_bytes(&state, request.csv_data.as_bytes()).await
}

async fn analyze_bytes(state: &AppState, data: &[u8]) -> Result<Json<AnalysisReport>, AppError> {
    info!(bytes = data.len(), "Analyzing statement");

    let fusion = InsightFusion::new(state.ai.as_ref(), &state.prompts);
    let report = analyze_statement(data, &fusion)
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(report))
}

fn too_large() -> AppError {
    AppError::bad_request(&format!(
        "File too large. Maximum size is {} MB",
        MAX_UPLOAD_SIZE / 1024 / 1024
    ))
}
