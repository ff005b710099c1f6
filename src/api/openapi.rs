//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, schema};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trade-In Vision Server",
        version = "0.3.0",
        description = "API server for collecting and reviewing vehicle trade-in appraisals"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Appraisal endpoints
        api::appraisals::submit_appraisal,
        api::appraisals::get_appraisal,
        // Admin endpoints
        api::admin::list_appraisals,
        api::admin::delete_appraisal,
        // File serving
        api::files::serve_upload,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            error::ValidationErrorResponse,
            schema::FieldError,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Appraisals
            models::YesNo,
            models::Transmission,
            models::Drivetrain,
            models::ConditionAnswer,
            models::ConditionReport,
            models::StoredPhoto,
            models::PhotoManifest,
            models::Appraisal,
            models::AppraisalSummary,
            models::PhotoView,
            models::SubmitAppraisalResponse,
            models::AppraisalDetailResponse,
            models::AppraisalListResponse,
            models::DeleteAppraisalRequest,
            models::DeleteAppraisalResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Appraisals", description = "Submission and record viewing"),
        (name = "Admin", description = "Back-office listing and deletion"),
        (name = "Files", description = "Stored photo serving")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add admin key security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Admin-Key"),
                    ),
                ),
            );
        }
    }
}
