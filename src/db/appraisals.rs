//! Database queries for appraisal submissions.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Appraisal, AppraisalSummary, ConditionReport, Drivetrain, PhotoManifest, Transmission,
};

/// Insert a new appraisal row.
pub fn insert_appraisal(conn: &Connection, appraisal: &Appraisal) -> AppResult<()> {
    let condition_json = serde_json::to_string(&appraisal.condition)
        .map_err(|e| AppError::Database(format!("Failed to serialize condition report: {}", e)))?;
    let photos_json = appraisal.photos.to_json()?;

    conn.execute(
        "INSERT INTO appraisals (id, created_at, vin, make, model, year, odometer, trim, transmission, drivetrain, name, email, phone, condition_report, photos)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            appraisal.id.to_string(),
            // Fixed-width timestamps keep ORDER BY created_at lexicographic.
            appraisal
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            appraisal.vin,
            appraisal.make,
            appraisal.model,
            appraisal.year,
            appraisal.odometer,
            appraisal.trim.as_deref(),
            appraisal.transmission.as_str(),
            appraisal.drivetrain.as_str(),
            appraisal.name,
            appraisal.email,
            appraisal.phone,
            condition_json,
            photos_json,
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to insert appraisal: {}", e)))?;

    Ok(())
}

/// Get an appraisal by ID. Absent rows are a normal outcome, not an error.
pub fn get_appraisal_by_id(conn: &Connection, id: Uuid) -> AppResult<Option<Appraisal>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, created_at, vin, make, model, year, odometer, trim, transmission, drivetrain, name, email, phone, condition_report, photos
             FROM appraisals WHERE id = ?1",
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(AppraisalRow {
            id: row.get(0)?,
            created_at: row.get(1)?,
            vin: row.get(2)?,
            make: row.get(3)?,
            model: row.get(4)?,
            year: row.get(5)?,
            odometer: row.get(6)?,
            trim: row.get(7)?,
            transmission: row.get(8)?,
            drivetrain: row.get(9)?,
            name: row.get(10)?,
            email: row.get(11)?,
            phone: row.get(12)?,
            condition_report: row.get(13)?,
            photos: row.get(14)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(row_to_appraisal(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

/// List all appraisals as summaries, newest first.
///
/// Projects only the scalar summary columns; photo data is never read.
pub fn list_appraisal_summaries(conn: &Connection) -> AppResult<Vec<AppraisalSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, created_at, year, make, model, name, email
             FROM appraisals
             ORDER BY created_at DESC",
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(SummaryRow {
                id: row.get(0)?,
                created_at: row.get(1)?,
                year: row.get(2)?,
                make: row.get(3)?,
                model: row.get(4)?,
                name: row.get(5)?,
                email: row.get(6)?,
            })
        })
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_summary).collect()
}

/// Delete an appraisal row. Returns whether a row was actually removed;
/// deleting an absent id is not an error (idempotent delete).
pub fn delete_appraisal(conn: &Connection, id: Uuid) -> AppResult<bool> {
    let changed = conn
        .execute("DELETE FROM appraisals WHERE id = ?1", params![id.to_string()])
        .map_err(|e| AppError::Database(format!("Failed to delete appraisal: {}", e)))?;

    Ok(changed > 0)
}

// ============================================================================
// Row mapping
// ============================================================================

struct AppraisalRow {
    id: String,
    created_at: String,
    vin: String,
    make: String,
    model: String,
    year: i32,
    odometer: i64,
    trim: Option<String>,
    transmission: String,
    drivetrain: String,
    name: String,
    email: String,
    phone: String,
    condition_report: String,
    photos: String,
}

struct SummaryRow {
    id: String,
    created_at: String,
    year: i32,
    make: String,
    model: String,
    name: String,
    email: String,
}

fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|e| AppError::Database(format!("Corrupt appraisal id '{}': {}", id, e)))
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Corrupt timestamp '{}': {}", raw, e)))
}

fn row_to_appraisal(row: AppraisalRow) -> AppResult<Appraisal> {
    let condition: ConditionReport = serde_json::from_str(&row.condition_report)
        .map_err(|e| AppError::Database(format!("Corrupt condition report: {}", e)))?;

    let transmission = Transmission::parse(&row.transmission).ok_or_else(|| {
        AppError::Database(format!("Corrupt transmission '{}'", row.transmission))
    })?;
    let drivetrain = Drivetrain::parse(&row.drivetrain)
        .ok_or_else(|| AppError::Database(format!("Corrupt drivetrain '{}'", row.drivetrain)))?;

    Ok(Appraisal {
        id: parse_id(&row.id)?,
        created_at: parse_timestamp(&row.created_at)?,
        vin: row.vin,
        make: row.make,
        model: row.model,
        year: row.year,
        odometer: row.odometer,
        trim: row.trim,
        transmission,
        drivetrain,
        name: row.name,
        email: row.email,
        phone: row.phone,
        condition,
        photos: PhotoManifest::from_json(&row.photos)?,
    })
}

fn row_to_summary(row: SummaryRow) -> AppResult<AppraisalSummary> {
    Ok(AppraisalSummary {
        id: parse_id(&row.id)?,
        created_at: parse_timestamp(&row.created_at)?,
        year: row.year,
        make: row.make,
        model: row.model,
        name: row.name,
        email: row.email,
    })
}
