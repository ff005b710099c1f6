//! Notification email rendering and dispatch.
//!
//! The back office is notified of each submission through an HTTP email
//! delivery API. Dispatch sits behind the [`Mailer`] trait so the submission
//! pipeline can be exercised without network access.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::EmailSettings;
use crate::error::{AppError, AppResult};
use crate::models::Appraisal;
use crate::schema;

/// Email delivery API endpoint.
const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// HTTP connect timeout for the email API.
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// HTTP total timeout for the email API. This is the only bounded wait in
/// the submission pipeline; its expiry never rolls back durable writes.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// A rendered notification message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Outbound email seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: SecretString,
}

impl ResendMailer {
    pub fn new(settings: &EmailSettings) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client for email API");

        Self {
            client,
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("Email API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "Email API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Placeholder mailer registered when notification settings are absent.
///
/// The submit endpoint fails fast on missing configuration before any
/// dispatch, so this is never reached by a live request.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _message: &EmailMessage) -> AppResult<()> {
        Err(AppError::Configuration(
            "Notification email settings are not configured".to_string(),
        ))
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Build the notification message for a stored appraisal.
///
/// Recipients are the configured back-office address plus the submitter's
/// own address.
pub fn build_notification(
    appraisal: &Appraisal,
    settings: &EmailSettings,
    public_base_url: &str,
) -> EmailMessage {
    EmailMessage {
        from: format!("Trade-In Vision <{}>", settings.from_address),
        to: vec![settings.to_address.clone(), appraisal.email.clone()],
        subject: format!("New Appraisal Request: {}", appraisal.vehicle_title()),
        html: render_appraisal_email(appraisal, public_base_url),
    }
}

/// Render the notification body.
pub fn render_appraisal_email(appraisal: &Appraisal, public_base_url: &str) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html><html><body>");
    html.push_str("<h1>New Appraisal Request</h1>");
    html.push_str(&format!("<h2>{}</h2>", escape(&appraisal.vehicle_title())));

    let detail_url = format!(
        "{}/appraisals/{}",
        public_base_url.trim_end_matches('/'),
        appraisal.id
    );
    html.push_str(&format!(
        "<p>Submission <a href=\"{url}\">{id}</a></p>",
        url = escape(&detail_url),
        id = appraisal.id
    ));

    html.push_str("<h2>Vehicle Information</h2><table>");
    data_row(&mut html, "VIN", &appraisal.vin);
    data_row(&mut html, "Odometer", &appraisal.odometer.to_string());
    data_row(&mut html, "Trim", appraisal.trim.as_deref().unwrap_or("Not Provided"));
    data_row(&mut html, "Transmission", appraisal.transmission.as_str());
    data_row(&mut html, "Drivetrain", appraisal.drivetrain.as_str());
    html.push_str("</table>");

    html.push_str("<h2>Condition Report</h2><table>");
    for (label, answer) in appraisal.condition.entries() {
        data_row(&mut html, label, answer.answer.as_str());
        if schema::requires_detail(answer.answer.as_str()) {
            if let Some(details) = &answer.details {
                data_row(&mut html, "Details", details);
            }
        }
    }
    data_row(&mut html, "Number of Keys", &appraisal.condition.keys);
    html.push_str("</table>");

    if !appraisal.photos.is_empty() {
        html.push_str("<h2>Submitted Photos</h2><ul>");
        for slot in schema::PHOTO_SLOTS {
            if let Some(photo) = appraisal.photos.get(slot.key) {
                match &photo.description {
                    Some(description) => html.push_str(&format!(
                        "<li>{}: {}</li>",
                        escape(slot.label),
                        escape(description)
                    )),
                    None => html.push_str(&format!("<li>{}</li>", escape(slot.label))),
                }
            }
        }
        html.push_str("</ul>");
    }

    html.push_str("<h2>Contact Information</h2><table>");
    data_row(&mut html, "Name", &appraisal.name);
    data_row(&mut html, "Email", &appraisal.email);
    data_row(&mut html, "Phone", &appraisal.phone);
    html.push_str("</table>");

    html.push_str(
        "<p>This email was automatically generated by the Trade-In Vision application.</p>",
    );
    html.push_str("</body></html>");

    html
}

fn data_row(html: &mut String, label: &str, value: &str) {
    let value = if value.is_empty() { "Not Provided" } else { value };
    html.push_str(&format!(
        "<tr><td>{}:</td><td>{}</td></tr>",
        escape(label),
        escape(value)
    ));
}

/// Minimal HTML escaping for user-supplied text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
