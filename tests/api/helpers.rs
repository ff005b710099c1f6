//! Shared test helpers for API integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_web::dev::ServiceResponse;
use actix_web::{test, web, App};
use async_trait::async_trait;
use secrecy::SecretString;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use tiv_lib::auth::AdminKey;
use tiv_lib::config::{Config, EmailSettings, Environment};
use tiv_lib::db::{migrations, DbPool};
use tiv_lib::error::AppResult;
use tiv_lib::services::mailer::{EmailMessage, Mailer};

/// Admin key used in tests.
pub const TEST_ADMIN_KEY: &str = "test-admin-key-for-api-tests";

/// Mailer that records messages instead of dispatching them.
pub struct RecordingMailer {
    pub fail: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.fail {
            return Err(tiv_lib::error::AppError::Email(
                "delivery refused".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Everything a test needs to drive the app and inspect its side effects.
pub struct TestServer {
    pub pool: DbPool,
    pub config: Config,
    pub mailer: Arc<RecordingMailer>,
    // Held so the scratch data/database directories outlive the test.
    _temp: TempDir,
}

impl TestServer {
    pub fn new() -> Self {
        Self::build(Some(test_email_settings()), RecordingMailer::new())
    }

    pub fn without_email_config() -> Self {
        Self::build(None, RecordingMailer::new())
    }

    pub fn with_failing_mailer() -> Self {
        Self::build(Some(test_email_settings()), RecordingMailer::failing())
    }

    fn build(email: Option<EmailSettings>, mailer: RecordingMailer) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let data_dir = temp.path().join("uploads");
        std::fs::create_dir_all(&data_dir).expect("data dir");

        let config = Config {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: format!("file:{}", temp.path().join("test.db").display()),
            data_dir,
            static_dir: None,
            admin_key: Some(TEST_ADMIN_KEY.to_string()),
            public_base_url: "http://localhost:8080".to_string(),
            max_photo_size: 5 * 1024 * 1024,
            max_concurrent_uploads: 4,
            email,
        };

        let pool = DbPool::new(&config).expect("database");
        migrations::run_migrations(&pool).expect("migrations");

        Self {
            pool,
            config,
            mailer: Arc::new(mailer),
            _temp: temp,
        }
    }

    /// Build the actix application under test.
    pub async fn app(
        &self,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    > {
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_uploads));

        test::init_service(
            App::new()
                .app_data(web::Data::new(self.pool.clone()))
                .app_data(web::Data::new(self.config.clone()))
                .app_data(web::Data::new(AdminKey::new(self.config.admin_key.clone())))
                .app_data(web::Data::from(mailer))
                .app_data(web::Data::new(semaphore))
                .service(
                    web::scope("/api/v1")
                        .configure(tiv_lib::api::configure_health_routes)
                        .configure(tiv_lib::api::configure_appraisal_routes)
                        .configure(tiv_lib::api::configure_admin_routes),
                )
                .configure(tiv_lib::api::configure_file_routes),
        )
        .await
    }

    /// Path of a submission's photo directory.
    pub fn submission_dir(&self, id: &str) -> PathBuf {
        self.config.data_dir.join(id)
    }
}

fn test_email_settings() -> EmailSettings {
    EmailSettings {
        api_key: SecretString::from("re_test_key".to_string()),
        from_address: "appraisals@tradein.example.com".to_string(),
        to_address: "backoffice@tradein.example.com".to_string(),
    }
}

// ============================================================================
// Multipart form builders
// ============================================================================

pub const BOUNDARY: &str = "----tivtestboundary7MA4YWxkTrZu0gW";

/// A field of the multipart form under construction.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode parts as a multipart/form-data body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Required photo slot keys, in form order.
pub const REQUIRED_SLOTS: &[&str] = &[
    "driver_front_corner",
    "driver_quarter_panel",
    "passenger_quarter_panel",
    "front_seats",
    "rear_seat_area",
    "dashboard",
];

/// All the text fields of a fully valid form.
pub fn valid_text_fields() -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = vec![
        ("vin", "1HGCM82633A004352"),
        ("make", "Honda"),
        ("model", "Accord"),
        ("year", "2003"),
        ("odometer", "120000"),
        ("trim", "EX"),
        ("transmission", "Automatic"),
        ("drivetrain", "2-Wheel Drive"),
        ("accident_history", "yes"),
        ("accident_history_details", "Minor fender bender 2019"),
        ("keys", "2"),
        ("name", "Jane Doe"),
        ("email", "jane@example.com"),
        ("phone", "5551234567"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for key in [
        "frame_damage",
        "flood_damage",
        "smoked_in",
        "mechanical_issues",
        "odometer_broken",
        "paint_body_work",
        "rust_hail_damage",
        "interior_broken",
        "interior_rips",
        "tires_need_replacement",
        "aftermarket_modifications",
        "other_issues",
    ] {
        fields.push((key.to_string(), "no".to_string()));
    }

    fields
}

/// Build a fully valid multipart submission body.
pub fn valid_submission_body(photo_bytes: &[u8]) -> Vec<u8> {
    let text_fields = valid_text_fields();
    let mut parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();

    let filenames: Vec<String> = REQUIRED_SLOTS.iter().map(|s| format!("{}.jpg", s)).collect();
    for (&slot, filename) in REQUIRED_SLOTS.iter().zip(filenames.iter()) {
        parts.push(Part::File {
            name: slot,
            filename: filename.as_str(),
            content_type: "image/jpeg",
            bytes: photo_bytes,
        });
    }

    multipart_body(&parts)
}

/// POST a multipart body to the submit endpoint and return the response.
pub async fn post_submission<S>(app: &S, body: Vec<u8>) -> ServiceResponse
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/appraisals")
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(body)
        .to_request();
    test::call_service(app, req).await
}
