//! Submission pipeline: multipart parsing, photo storage, row insert, and
//! notification dispatch.
//!
//! The pipeline is split in two so the storage half is testable without an
//! HTTP request: [`parse_multipart`] streams the wire payload into a
//! [`FormValues`] map (files land in a per-request temp directory), and
//! [`finalize_submission`] validates, stores, inserts, and notifies.
//!
//! Failure policy: anything before the database insert aborts the request
//! and cleans up; a notification failure after the insert is logged and the
//! request still succeeds: the appraisal is durable, delivery is not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EmailSettings;
use crate::db::{appraisals, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{Appraisal, PhotoManifest, StoredPhoto};
use crate::schema::{self, FieldError, FormValues, PhotoInput, PhotoSource, TempUpload};
use crate::services::mailer::{self, Mailer};

/// Ceiling for a single text field value; anything beyond is drained.
const MAX_TEXT_FIELD_SIZE: usize = 64 * 1024;

/// Maximum length of a sanitized original filename component.
const MAX_FILENAME_LEN: usize = 64;

/// Everything the pipeline needs besides the payload itself.
pub struct SubmissionContext<'a> {
    pub pool: &'a DbPool,
    pub data_dir: &'a Path,
    pub public_base_url: &'a str,
    pub email: &'a EmailSettings,
    pub mailer: &'a dyn Mailer,
    pub max_photo_size: usize,
}

/// Result of parsing the multipart payload.
pub struct ParsedSubmission {
    pub values: FormValues,
    /// Structural violations found during parsing (unknown slot, duplicate
    /// file for a slot); merged with the schema validation results.
    pub parse_errors: Vec<FieldError>,
    /// Per-request temp directory holding the streamed files.
    temp_dir: PathBuf,
}

/// Stream a multipart payload into a form-value map.
///
/// Text fields are collected as strings; file fields keyed by a photo-slot
/// name are streamed to temp files. File parts with zero bytes are ignored
/// (empty optional slots are sent as empty parts by some clients). Files are
/// streamed up to the size ceiling and then drained, so an oversized upload
/// never occupies more than the ceiling on disk.
pub async fn parse_multipart(
    payload: &mut Multipart,
    data_dir: &Path,
    max_photo_size: usize,
) -> AppResult<ParsedSubmission> {
    let temp_dir = data_dir.join(".upload_tmp").join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to create temp directory: {}", e)))?;

    match parse_into(payload, &temp_dir, max_photo_size).await {
        Ok((values, parse_errors)) => Ok(ParsedSubmission {
            values,
            parse_errors,
            temp_dir,
        }),
        Err(e) => {
            // Streamed files drop with their inputs; the directory goes too.
            remove_dir_quietly(&temp_dir).await;
            Err(e)
        }
    }
}

async fn parse_into(
    payload: &mut Multipart,
    temp_dir: &Path,
    max_photo_size: usize,
) -> AppResult<(FormValues, Vec<FieldError>)> {
    let mut values = FormValues::new();
    let mut parse_errors: Vec<FieldError> = Vec::new();
    let mut file_counter: u32 = 0;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        let Some(name) = content_disposition.get_name().map(str::to_string) else {
            continue;
        };
        let filename = content_disposition.get_filename().map(str::to_string);

        match filename {
            None => {
                let text = read_text_field(&mut field).await?;
                values.set_text(name, text);
            }
            Some(filename) => {
                if schema::photo_slot(&name).is_none() {
                    drain_field(&mut field).await;
                    parse_errors.push(FieldError::new(name, "Unknown photo field"));
                    continue;
                }
                if values.photo(&name).is_some() {
                    drain_field(&mut field).await;
                    parse_errors.push(FieldError::new(
                        name,
                        "Only one file may be uploaded per photo slot",
                    ));
                    continue;
                }

                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_default();

                let temp_path = temp_dir.join(format!("upload_{}", file_counter));
                file_counter += 1;

                let size = stream_to_temp(&mut field, &temp_path, max_photo_size).await?;
                if size == 0 {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    continue;
                }

                values.set_photo(
                    name,
                    PhotoInput {
                        file_name: filename,
                        content_type,
                        size,
                        source: PhotoSource::Temp(TempUpload::new(temp_path)),
                    },
                );
            }
        }
    }

    Ok((values, parse_errors))
}

/// Validate, store photos, insert the row, and dispatch the notification.
pub async fn finalize_submission(
    parsed: ParsedSubmission,
    ctx: &SubmissionContext<'_>,
) -> AppResult<Uuid> {
    let ParsedSubmission {
        mut values,
        mut parse_errors,
        temp_dir,
    } = parsed;

    // Server-side validation is the trust boundary; client validation is
    // advisory only.
    parse_errors.extend(schema::validate_all(&values));
    if !parse_errors.is_empty() {
        drop(values);
        remove_dir_quietly(&temp_dir).await;
        return Err(AppError::Validation(parse_errors));
    }

    let id = Uuid::new_v4();
    let submission_dir = ctx.data_dir.join(id.to_string());
    tokio::fs::create_dir_all(&submission_dir).await.map_err(|e| {
        AppError::FileSystem(format!("Failed to create submission directory: {}", e))
    })?;

    let photos = match store_photos(&mut values, &submission_dir).await {
        Ok(photos) => photos,
        Err(e) => {
            drop(values);
            remove_dir_quietly(&temp_dir).await;
            remove_dir_quietly(&submission_dir).await;
            return Err(e);
        }
    };
    remove_dir_quietly(&temp_dir).await;

    let appraisal = match Appraisal::from_form(id, Utc::now(), &values, photos) {
        Ok(appraisal) => appraisal,
        Err(e) => {
            remove_dir_quietly(&submission_dir).await;
            return Err(e);
        }
    };

    {
        let conn = ctx.pool.connection();
        if let Err(e) = appraisals::insert_appraisal(&conn, &appraisal) {
            drop(conn);
            // No partial record may stay reachable: the row failed, so the
            // photo directory goes too (best effort).
            remove_dir_quietly(&submission_dir).await;
            return Err(e);
        }
    }

    info!(
        "Appraisal {} stored ({}, {} photos)",
        id,
        appraisal.vehicle_title(),
        appraisal.photos.len()
    );

    // The record is durable from here on. Delivery failures are logged and
    // the caller still sees success.
    let message = mailer::build_notification(&appraisal, ctx.email, ctx.public_base_url);
    if let Err(e) = ctx.mailer.send(&message).await {
        warn!("Notification delivery failed for appraisal {}: {}", id, e);
    }

    Ok(id)
}

// ============================================================================
// Photo storage
// ============================================================================

/// Move every attached photo into the submission directory under a
/// collision-safe stored name and record it in the manifest.
pub async fn store_photos(
    values: &mut FormValues,
    submission_dir: &Path,
) -> AppResult<PhotoManifest> {
    let mut manifest = PhotoManifest::new();
    let photos: HashMap<String, PhotoInput> = values.take_photos();

    for (slot_key, photo) in photos {
        let stored_name = stored_file_name(&slot_key, &photo.file_name);
        let final_path = submission_dir.join(&stored_name);

        match photo.source {
            PhotoSource::Temp(temp) => {
                let temp_path = temp.into_path();
                tokio::fs::rename(&temp_path, &final_path)
                    .await
                    .map_err(|e| {
                        AppError::FileSystem(format!("Failed to move photo into place: {}", e))
                    })?;
            }
            PhotoSource::Memory(bytes) => {
                tokio::fs::write(&final_path, &bytes).await.map_err(|e| {
                    AppError::FileSystem(format!("Failed to write photo: {}", e))
                })?;
            }
        }

        let description = schema::photo_slot(&slot_key)
            .and_then(|slot| slot.description_key)
            .map(|key| values.text(key))
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        manifest.insert(
            slot_key,
            StoredPhoto {
                file: stored_name,
                description,
            },
        );
    }

    Ok(manifest)
}

/// Compose a collision-safe stored filename: slot key, a random token, and
/// the sanitized client filename.
fn stored_file_name(slot_key: &str, original: &str) -> String {
    let token_bytes: [u8; 3] = rand::random();
    format!(
        "{}_{}_{}",
        slot_key,
        hex::encode(token_bytes),
        sanitize_filename(original)
    )
}

/// Keep only allow-listed filename characters; anything else is dropped.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(MAX_FILENAME_LEN)
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        "photo".to_string()
    } else {
        sanitized
    }
}

// ============================================================================
// Multipart helpers
// ============================================================================

async fn read_text_field(field: &mut actix_multipart::Field) -> AppResult<String> {
    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        if data.len() + chunk.len() <= MAX_TEXT_FIELD_SIZE {
            data.extend_from_slice(&chunk);
        }
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Stream a file field to a temp file, counting the full field size but
/// writing at most `max_size + 1` bytes so validation can flag the overrun
/// without unbounded disk usage.
async fn stream_to_temp(
    field: &mut actix_multipart::Field,
    temp_path: &Path,
    max_size: usize,
) -> AppResult<usize> {
    let mut temp_file = tokio::fs::File::create(temp_path)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to create temp file: {}", e)))?;

    let mut size: usize = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        if size <= max_size {
            let allowed = (max_size + 1).saturating_sub(size).min(chunk.len());
            temp_file
                .write_all(&chunk[..allowed])
                .await
                .map_err(|e| AppError::FileSystem(format!("Failed to write temp file: {}", e)))?;
        }
        size += chunk.len();
    }
    temp_file.flush().await.ok();

    Ok(size)
}

/// Drain a multipart field without saving.
async fn drain_field(field: &mut actix_multipart::Field) {
    while let Some(chunk) = field.next().await {
        let _ = chunk;
    }
}

async fn remove_dir_quietly(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove directory {}: {}", dir.display(), e);
        }
    }
}
