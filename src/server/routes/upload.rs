//! PDF upload and ingestion endpoint

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Response for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
}

/// Handle `POST /upload`: accept a multipart PDF and ingest it.
///
/// The payload is spooled to a temporary file for the loader; the file is
/// removed when it goes out of scope, on success and on every failure path.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::upload(format!("Malformed multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::upload(format!("Failed to read upload: {e}")))?;

        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| Error::upload("No file present in upload"))?;
    if data.is_empty() {
        return Err(Error::upload("Uploaded file is empty"));
    }

    tracing::info!(filename, bytes = data.len(), "Received upload");

    let tmp = tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
        use std::io::Write;

        let mut tmp = tempfile::Builder::new()
            .prefix("pdf-chat-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| Error::upload(format!("Failed to create temporary file: {e}")))?;
        tmp.write_all(&data)
            .map_err(|e| Error::upload(format!("Failed to write temporary file: {e}")))?;
        Ok(tmp)
    })
    .await
    .map_err(|e| Error::upload(format!("Upload task failed: {e}")))??;

    let count = state.ingestion().ingest(tmp.path(), &filename).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!("PDF indexed successfully ({count} chunks)"),
    }))
}
