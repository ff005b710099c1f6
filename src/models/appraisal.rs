//! Appraisal domain models and DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::schema::{self, FormValues};

/// Yes/no condition answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transmission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Manual => "Manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Automatic" => Some(Self::Automatic),
            "Manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for Transmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drivetrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Drivetrain {
    #[serde(rename = "2-Wheel Drive")]
    TwoWheelDrive,
    #[serde(rename = "4-Wheel Drive")]
    FourWheelDrive,
    #[serde(rename = "All-Wheel Drive")]
    AllWheelDrive,
}

impl Drivetrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoWheelDrive => "2-Wheel Drive",
            Self::FourWheelDrive => "4-Wheel Drive",
            Self::AllWheelDrive => "All-Wheel Drive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2-Wheel Drive" => Some(Self::TwoWheelDrive),
            "4-Wheel Drive" => Some(Self::FourWheelDrive),
            "All-Wheel Drive" => Some(Self::AllWheelDrive),
            _ => None,
        }
    }
}

impl std::fmt::Display for Drivetrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One condition question's answer with its optional detail text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConditionAnswer {
    pub answer: YesNo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The full condition questionnaire (stored as one JSON column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConditionReport {
    pub accident_history: ConditionAnswer,
    pub frame_damage: ConditionAnswer,
    pub flood_damage: ConditionAnswer,
    pub smoked_in: ConditionAnswer,
    pub mechanical_issues: ConditionAnswer,
    pub odometer_broken: ConditionAnswer,
    pub paint_body_work: ConditionAnswer,
    pub rust_hail_damage: ConditionAnswer,
    pub interior_broken: ConditionAnswer,
    pub interior_rips: ConditionAnswer,
    pub tires_need_replacement: ConditionAnswer,
    pub aftermarket_modifications: ConditionAnswer,
    pub other_issues: ConditionAnswer,
    /// Number of keys the seller has (free text, e.g. "2").
    pub keys: String,
}

impl ConditionReport {
    /// Pure mapping from the validated form map.
    pub fn from_form(values: &FormValues) -> AppResult<Self> {
        Ok(Self {
            accident_history: condition_answer(values, "accident_history")?,
            frame_damage: condition_answer(values, "frame_damage")?,
            flood_damage: condition_answer(values, "flood_damage")?,
            smoked_in: condition_answer(values, "smoked_in")?,
            mechanical_issues: condition_answer(values, "mechanical_issues")?,
            odometer_broken: condition_answer(values, "odometer_broken")?,
            paint_body_work: condition_answer(values, "paint_body_work")?,
            rust_hail_damage: condition_answer(values, "rust_hail_damage")?,
            interior_broken: condition_answer(values, "interior_broken")?,
            interior_rips: condition_answer(values, "interior_rips")?,
            tires_need_replacement: condition_answer(values, "tires_need_replacement")?,
            aftermarket_modifications: condition_answer(values, "aftermarket_modifications")?,
            other_issues: condition_answer(values, "other_issues")?,
            keys: values.text("keys").to_string(),
        })
    }

    /// Look up an answer by its form key.
    pub fn get(&self, key: &str) -> Option<&ConditionAnswer> {
        match key {
            "accident_history" => Some(&self.accident_history),
            "frame_damage" => Some(&self.frame_damage),
            "flood_damage" => Some(&self.flood_damage),
            "smoked_in" => Some(&self.smoked_in),
            "mechanical_issues" => Some(&self.mechanical_issues),
            "odometer_broken" => Some(&self.odometer_broken),
            "paint_body_work" => Some(&self.paint_body_work),
            "rust_hail_damage" => Some(&self.rust_hail_damage),
            "interior_broken" => Some(&self.interior_broken),
            "interior_rips" => Some(&self.interior_rips),
            "tires_need_replacement" => Some(&self.tires_need_replacement),
            "aftermarket_modifications" => Some(&self.aftermarket_modifications),
            "other_issues" => Some(&self.other_issues),
            _ => None,
        }
    }

    /// All answers with their display labels, in questionnaire order.
    pub fn entries(&self) -> Vec<(&'static str, &ConditionAnswer)> {
        schema::CONDITION_QUESTIONS
            .iter()
            .filter_map(|q| self.get(q.key).map(|a| (q.label, a)))
            .collect()
    }
}

fn condition_answer(values: &FormValues, key: &str) -> AppResult<ConditionAnswer> {
    let answer = YesNo::parse(values.text(key))
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid answer for '{}'", key)))?;

    let details_key = format!("{}_details", key);
    let details = values.text(&details_key);
    let details = if details.is_empty() {
        None
    } else {
        Some(details.to_string())
    };

    Ok(ConditionAnswer { answer, details })
}

/// A photo recorded against a slot, as persisted in the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredPhoto {
    /// Stored filename within the submission directory.
    pub file: String,
    /// Seller-supplied description (optional slots only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Slot key → stored photo, persisted as one JSON column.
///
/// Filenames live in the row rather than being recovered from directory
/// listings, so the record viewer's read path never guesses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoManifest(pub BTreeMap<String, StoredPhoto>);

impl PhotoManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: impl Into<String>, photo: StoredPhoto) {
        self.0.insert(slot.into(), photo);
    }

    pub fn get(&self, slot: &str) -> Option<&StoredPhoto> {
        self.0.get(slot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Database(format!("Failed to serialize photo manifest: {}", e)))
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Database(format!("Failed to parse photo manifest: {}", e)))
    }
}

/// A complete appraisal submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appraisal {
    /// Submission UUID.
    pub id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub odometer: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    pub transmission: Transmission,
    pub drivetrain: Drivetrain,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub condition: ConditionReport,
    pub photos: PhotoManifest,
}

impl Appraisal {
    /// Pure mapping from the validated wire representation to the stored
    /// record. The caller has already run [`schema::validate_all`]; parse
    /// failures here mean the map bypassed validation and are rejected.
    pub fn from_form(
        id: Uuid,
        created_at: DateTime<Utc>,
        values: &FormValues,
        photos: PhotoManifest,
    ) -> AppResult<Self> {
        let year: i32 = values
            .text("year")
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid year".to_string()))?;
        let odometer: i64 = values
            .text("odometer")
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid odometer reading".to_string()))?;
        let transmission = Transmission::parse(values.text("transmission"))
            .ok_or_else(|| AppError::InvalidInput("Invalid transmission".to_string()))?;
        let drivetrain = Drivetrain::parse(values.text("drivetrain"))
            .ok_or_else(|| AppError::InvalidInput("Invalid drivetrain".to_string()))?;

        let trim = values.text("trim");
        let trim = if trim.is_empty() {
            None
        } else {
            Some(trim.to_string())
        };

        Ok(Self {
            id,
            created_at,
            vin: values.text("vin").to_string(),
            make: values.text("make").to_string(),
            model: values.text("model").to_string(),
            year,
            odometer,
            trim,
            transmission,
            drivetrain,
            name: values.text("name").to_string(),
            email: values.text("email").to_string(),
            phone: values.text("phone").to_string(),
            condition: ConditionReport::from_form(values)?,
            photos,
        })
    }

    /// "2003 Honda Accord", used in email subjects and admin views.
    pub fn vehicle_title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// Summary projection for the admin listing. Never includes photo data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppraisalSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub name: String,
    pub email: String,
}

// ============================================================================
// API DTOs
// ============================================================================

/// Response after a successful submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitAppraisalResponse {
    /// Generated submission identifier.
    pub submission_id: Uuid,
    pub message: String,
}

/// A resolved photo in the record detail view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoView {
    /// Slot key.
    pub slot: String,
    /// Display label for the slot.
    pub label: String,
    /// Server path to the image ("/uploads/{id}/{file}").
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Record detail response: the full record plus its resolved photos.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppraisalDetailResponse {
    pub appraisal: Appraisal,
    /// Photos resolved from the manifest; slots with no file are omitted.
    pub resolved_photos: Vec<PhotoView>,
}

/// Admin list response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppraisalListResponse {
    pub appraisals: Vec<AppraisalSummary>,
    pub total: usize,
}

/// Admin delete request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAppraisalRequest {
    /// Submission identifier to delete.
    pub id: String,
}

/// Admin delete response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAppraisalResponse {
    pub message: String,
}
