//! Stored photo serving.
//!
//! Streams files out of the per-submission directories with a content type
//! derived from the file extension.

use actix_web::{get, web, HttpResponse};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Configure file routes (mounted at the server root, not under /api).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(serve_upload);
}

/// Serve a stored photo.
///
/// GET /uploads/{id}/{filename}
#[utoipa::path(
    get,
    path = "/uploads/{id}/{filename}",
    tag = "Files",
    params(
        ("id" = String, Path, description = "Submission identifier"),
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse)
    )
)]
#[get("/uploads/{id}/{filename}")]
pub async fn serve_upload(
    config: web::Data<Config>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (raw_id, filename) = path.into_inner();

    // Only a parsed UUID and an allow-listed filename are joined onto the
    // data directory; everything else is a 404, including traversal shapes.
    let id = Uuid::parse_str(&raw_id).map_err(|_| AppError::NotFound("File".to_string()))?;
    if !is_safe_filename(&filename) {
        return Err(AppError::NotFound("File".to_string()));
    }

    let file_path = config.data_dir.join(id.to_string()).join(&filename);

    debug!("Serving upload {}", file_path.display());

    let data = tokio::fs::read(&file_path)
        .await
        .map_err(|_| AppError::NotFound("File".to_string()))?;

    let ext = filename.rsplit('.').next().unwrap_or("");
    Ok(HttpResponse::Ok()
        .content_type(content_type_for_extension(ext))
        .body(data))
}

/// Stored filenames are produced by the submission pipeline from an
/// allow-list; anything outside it never names a stored file.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
