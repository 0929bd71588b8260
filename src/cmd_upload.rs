//! `upload` and `detach`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chatcast_browser_cdp::OpenMode;
use chatcast_protocols::{FilePayload, FloatState, RuntimeCommand};

use crate::app::App;

pub(crate) async fn handle_upload(app: &App, site: &str, files: &[PathBuf]) -> Result<()> {
    let site = app.site(site)?.clone();
    let mut payloads = Vec::with_capacity(files.len());
    for path in files {
        payloads.push(read_payload(path).await?);
    }

    let live = app.open(None, &HashMap::new(), OpenMode::Reuse).await?;
    live.messenger.upload(&site, payloads).await?;
    println!("Pasted {} file(s) into {}", files.len(), site.name);
    live.close().await
}

pub(crate) async fn handle_detach(app: &App) -> Result<()> {
    let live = app.open(None, &HashMap::new(), OpenMode::Reuse).await?;
    let response = live.handler.handle(&RuntimeCommand::DetachBatchSearch).await;
    if !response.success {
        bail!(
            "Detach failed: {}",
            response.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    let state: FloatState = serde_json::from_value(response.data.unwrap_or_default())
        .context("Unexpected detach reply")?;
    println!(
        "Batch page moved to window {} (was {})",
        state.window_id, state.original_window_id
    );
    live.close().await
}

async fn read_payload(path: &Path) -> Result<FilePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(FilePayload {
        mime_type: guess_mime(path).to_string(),
        file_name,
        data: STANDARD.encode(bytes),
    })
}

/// MIME type from the file extension.
pub(crate) fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
