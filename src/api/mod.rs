//! API endpoint modules.

pub mod admin;
pub mod appraisals;
pub mod files;
pub mod health;
pub mod openapi;

pub use admin::configure_routes as configure_admin_routes;
pub use appraisals::configure_routes as configure_appraisal_routes;
pub use files::configure_routes as configure_file_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
