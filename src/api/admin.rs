//! Back-office endpoints: list all submissions, delete a submission.
//!
//! Guarded by the `X-Admin-Key` header (see [`crate::auth::AdminAuth`]).

use actix_web::{get, post, web, HttpResponse};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::config::Config;
use crate::db::{appraisals, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{AppraisalListResponse, DeleteAppraisalRequest, DeleteAppraisalResponse};

/// Configure admin routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_appraisals).service(delete_appraisal);
}

/// List all appraisals, newest first.
///
/// GET /admin/appraisals
///
/// Projects only summary columns; photo data is never loaded.
#[utoipa::path(
    get,
    path = "/api/v1/admin/appraisals",
    tag = "Admin",
    responses(
        (status = 200, description = "All appraisal summaries", body = AppraisalListResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::error::ErrorResponse)
    ),
    security(("admin_key" = []))
)]
#[get("/admin/appraisals")]
pub async fn list_appraisals(
    _auth: AdminAuth,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let summaries = {
        let conn = pool.connection();
        appraisals::list_appraisal_summaries(&conn)?
    };

    let total = summaries.len();
    Ok(HttpResponse::Ok().json(AppraisalListResponse {
        appraisals: summaries,
        total,
    }))
}

/// Delete an appraisal and its photo directory.
///
/// POST /admin/appraisals/delete
///
/// Idempotent and best-effort: the row delete and the directory removal are
/// attempted independently; an already-absent row or directory is fine, and
/// a failure of one half is logged without aborting the other.
#[utoipa::path(
    post,
    path = "/api/v1/admin/appraisals/delete",
    tag = "Admin",
    request_body = DeleteAppraisalRequest,
    responses(
        (status = 200, description = "Deletion attempted", body = DeleteAppraisalResponse),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::error::ErrorResponse)
    ),
    security(("admin_key" = []))
)]
#[post("/admin/appraisals/delete")]
pub async fn delete_appraisal(
    _auth: AdminAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<DeleteAppraisalRequest>,
) -> AppResult<HttpResponse> {
    // The identifier becomes a path segment below; only a parsed UUID is
    // ever joined onto data_dir.
    let id = Uuid::parse_str(&body.id)
        .map_err(|_| AppError::InvalidInput(format!("Invalid submission ID: {}", body.id)))?;

    match {
        let conn = pool.connection();
        appraisals::delete_appraisal(&conn, id)
    } {
        Ok(true) => info!("Deleted appraisal row {}", id),
        Ok(false) => info!("Appraisal row {} already absent", id),
        Err(e) => error!("Failed to delete appraisal row {}: {}", id, e),
    }

    let photo_dir = config.data_dir.join(id.to_string());
    match tokio::fs::remove_dir_all(&photo_dir).await {
        Ok(()) => info!("Removed photo directory for appraisal {}", id),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove photo directory for {}: {}", id, e),
    }

    Ok(HttpResponse::Ok().json(DeleteAppraisalResponse {
        message: "Appraisal deleted successfully!".to_string(),
    }))
}
