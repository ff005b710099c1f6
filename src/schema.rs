//! Declarative validation schema for the appraisal form.
//!
//! The same rules run in the multi-step form controller (advisory, per step)
//! and in the submission handler (the trust boundary, full map). Validation
//! is pure over a [`FormValues`] map so both callers share one code path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-photo size ceiling in bytes.
pub const MAX_PHOTO_SIZE: usize = 5 * 1024 * 1024;

/// MIME types accepted for photo uploads.
pub const ACCEPTED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Earliest model year the form accepts.
const MIN_MODEL_YEAR: i32 = 1900;

/// Transmission options offered by the form.
pub const TRANSMISSIONS: &[&str] = &["Automatic", "Manual"];

/// Drivetrain options offered by the form.
pub const DRIVETRAINS: &[&str] = &["2-Wheel Drive", "4-Wheel Drive", "All-Wheel Drive"];

/// A single field violation, surfaced inline next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Whether a condition answer obligates its paired detail text.
///
/// Consumed identically by display logic (show the detail input) and by
/// validation (require the detail text), so the two can never disagree.
pub fn requires_detail(answer: &str) -> bool {
    !answer.is_empty() && answer != "no"
}

// ============================================================================
// Condition questions and photo slots
// ============================================================================

/// A yes/no condition question with an optional paired detail field.
pub struct ConditionQuestion {
    /// Form key of the answer field.
    pub key: &'static str,
    /// Form key of the paired detail field, if the question has one.
    pub details_key: Option<&'static str>,
    /// Human-readable label (admin views, notification email).
    pub label: &'static str,
}

/// All condition questions, in display order.
pub const CONDITION_QUESTIONS: &[ConditionQuestion] = &[
    ConditionQuestion { key: "accident_history", details_key: Some("accident_history_details"), label: "Accident History" },
    ConditionQuestion { key: "frame_damage", details_key: Some("frame_damage_details"), label: "Frame Damage" },
    ConditionQuestion { key: "flood_damage", details_key: Some("flood_damage_details"), label: "Flood Damage" },
    ConditionQuestion { key: "smoked_in", details_key: Some("smoked_in_details"), label: "Smoked In" },
    ConditionQuestion { key: "mechanical_issues", details_key: Some("mechanical_issues_details"), label: "Mechanical Issues" },
    ConditionQuestion { key: "odometer_broken", details_key: Some("odometer_broken_details"), label: "Odometer Broken/Replaced" },
    ConditionQuestion { key: "paint_body_work", details_key: Some("paint_body_work_details"), label: "Paint/Body Work Needed" },
    ConditionQuestion { key: "rust_hail_damage", details_key: Some("rust_hail_damage_details"), label: "Rust/Hail Damage" },
    ConditionQuestion { key: "interior_broken", details_key: Some("interior_broken_details"), label: "Interior Parts Broken" },
    ConditionQuestion { key: "interior_rips", details_key: Some("interior_rips_details"), label: "Interior Rips/Tears/Stains" },
    ConditionQuestion { key: "tires_need_replacement", details_key: Some("tires_need_replacement_details"), label: "Tires Need Replacement" },
    ConditionQuestion { key: "aftermarket_modifications", details_key: Some("aftermarket_modifications_details"), label: "Aftermarket Modifications" },
    ConditionQuestion { key: "other_issues", details_key: Some("other_issues_details"), label: "Other Issues" },
];

/// A named photo upload position.
pub struct PhotoSlot {
    /// Form key, also the slot key in the stored photo manifest.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Whether the slot must be filled.
    pub required: bool,
    /// Form key of the paired description (optional slots only).
    pub description_key: Option<&'static str>,
}

/// All photo slots, in display order.
pub const PHOTO_SLOTS: &[PhotoSlot] = &[
    PhotoSlot { key: "driver_front_corner", label: "Front of Vehicle", required: true, description_key: None },
    PhotoSlot { key: "driver_quarter_panel", label: "Driver Side", required: true, description_key: None },
    PhotoSlot { key: "passenger_quarter_panel", label: "Passenger Side", required: true, description_key: None },
    PhotoSlot { key: "front_seats", label: "Front Seats", required: true, description_key: None },
    PhotoSlot { key: "rear_seat_area", label: "Rear Seats", required: true, description_key: None },
    PhotoSlot { key: "dashboard", label: "Dashboard", required: true, description_key: None },
    PhotoSlot { key: "damage1", label: "Damage Area 1", required: false, description_key: Some("damage1_description") },
    PhotoSlot { key: "damage2", label: "Damage Area 2", required: false, description_key: Some("damage2_description") },
    PhotoSlot { key: "damage3", label: "Damage Area 3", required: false, description_key: Some("damage3_description") },
    PhotoSlot { key: "damage4", label: "Damage Area 4", required: false, description_key: Some("damage4_description") },
    PhotoSlot { key: "feature1", label: "Special Feature 1", required: false, description_key: Some("feature1_description") },
    PhotoSlot { key: "feature2", label: "Special Feature 2", required: false, description_key: Some("feature2_description") },
    PhotoSlot { key: "feature3", label: "Special Feature 3", required: false, description_key: Some("feature3_description") },
    PhotoSlot { key: "feature4", label: "Special Feature 4", required: false, description_key: Some("feature4_description") },
];

/// Look up a slot by its form key.
pub fn photo_slot(key: &str) -> Option<&'static PhotoSlot> {
    PHOTO_SLOTS.iter().find(|s| s.key == key)
}

// ============================================================================
// Form values
// ============================================================================

/// A photo attached to the form, before it is stored.
#[derive(Debug)]
pub struct PhotoInput {
    /// Client-supplied filename.
    pub file_name: String,
    /// Client-supplied MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: usize,
    /// Where the bytes currently live.
    pub source: PhotoSource,
}

/// Backing storage for a [`PhotoInput`].
#[derive(Debug)]
pub enum PhotoSource {
    /// Bytes held in memory (form previews, tests).
    Memory(Vec<u8>),
    /// A file streamed to disk during multipart parsing, deleted on drop
    /// unless consumed into its final location.
    Temp(TempUpload),
}

/// A temp file that cleans up after itself.
///
/// Dropping a `TempUpload` removes the file unless [`TempUpload::into_path`]
/// consumed it first (the submission pipeline renames it into the
/// submission directory instead).
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    keep: bool,
}

impl TempUpload {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take ownership of the path, disarming the drop cleanup.
    pub fn into_path(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// The candidate field-value map validation runs over.
///
/// Text fields and photo fields are kept separately; photo values own their
/// backing resources, so replacing or removing a photo releases the previous
/// preview immediately.
#[derive(Debug, Default)]
pub struct FormValues {
    text: HashMap<String, String>,
    photos: HashMap<String, PhotoInput>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.text.insert(key.into(), value.into());
    }

    /// Get a text field, treating whitespace-only values as empty.
    pub fn text(&self, key: &str) -> &str {
        self.text.get(key).map(|s| s.trim()).unwrap_or("")
    }

    /// Attach a photo, returning the replaced input (its resources are
    /// released when the caller drops it).
    pub fn set_photo(&mut self, key: impl Into<String>, photo: PhotoInput) -> Option<PhotoInput> {
        self.photos.insert(key.into(), photo)
    }

    pub fn remove_photo(&mut self, key: &str) -> Option<PhotoInput> {
        self.photos.remove(key)
    }

    pub fn photo(&self, key: &str) -> Option<&PhotoInput> {
        self.photos.get(key)
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// Drain all photos out of the map (used when moving files into their
    /// final submission directory).
    pub fn take_photos(&mut self) -> HashMap<String, PhotoInput> {
        std::mem::take(&mut self.photos)
    }
}

// ============================================================================
// Field rules
// ============================================================================

/// Validation rule attached to a single form field.
pub enum FieldRule {
    /// VIN: 11-17 characters.
    Vin,
    /// Non-empty text with a minimum length.
    RequiredText { min: usize },
    /// Free text, no constraints.
    OptionalText,
    /// 4-digit year within the accepted model-year range.
    Year,
    /// Non-negative integer reading.
    Odometer,
    /// Membership in a fixed option set.
    Enumerated(&'static [&'static str]),
    /// Yes/no condition answer.
    ConditionAnswer,
    /// Detail text required whenever its paired answer is not "no".
    ConditionDetail { answer_key: &'static str },
    /// Structural email check.
    Email,
    /// At least 10 digits.
    Phone,
    /// Photo slot that must contain exactly one acceptable file.
    RequiredPhoto,
    /// Photo slot validated only when filled.
    OptionalPhoto,
    /// Description paired with an optional photo slot: required iff the
    /// slot is filled.
    PhotoDescription { photo_key: &'static str },
}

/// A form field and its rule.
pub struct FieldSpec {
    pub key: &'static str,
    pub rule: FieldRule,
}

/// Every field in the form, in step order.
pub const FIELDS: &[FieldSpec] = &[
    // Vehicle
    FieldSpec { key: "vin", rule: FieldRule::Vin },
    FieldSpec { key: "make", rule: FieldRule::RequiredText { min: 1 } },
    FieldSpec { key: "model", rule: FieldRule::RequiredText { min: 1 } },
    FieldSpec { key: "year", rule: FieldRule::Year },
    FieldSpec { key: "odometer", rule: FieldRule::Odometer },
    FieldSpec { key: "trim", rule: FieldRule::OptionalText },
    // Details
    FieldSpec { key: "transmission", rule: FieldRule::Enumerated(TRANSMISSIONS) },
    FieldSpec { key: "drivetrain", rule: FieldRule::Enumerated(DRIVETRAINS) },
    // Condition
    FieldSpec { key: "accident_history", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "accident_history_details", rule: FieldRule::ConditionDetail { answer_key: "accident_history" } },
    FieldSpec { key: "frame_damage", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "frame_damage_details", rule: FieldRule::ConditionDetail { answer_key: "frame_damage" } },
    FieldSpec { key: "flood_damage", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "flood_damage_details", rule: FieldRule::ConditionDetail { answer_key: "flood_damage" } },
    FieldSpec { key: "smoked_in", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "smoked_in_details", rule: FieldRule::ConditionDetail { answer_key: "smoked_in" } },
    FieldSpec { key: "mechanical_issues", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "mechanical_issues_details", rule: FieldRule::ConditionDetail { answer_key: "mechanical_issues" } },
    FieldSpec { key: "odometer_broken", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "odometer_broken_details", rule: FieldRule::ConditionDetail { answer_key: "odometer_broken" } },
    FieldSpec { key: "paint_body_work", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "paint_body_work_details", rule: FieldRule::ConditionDetail { answer_key: "paint_body_work" } },
    FieldSpec { key: "rust_hail_damage", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "rust_hail_damage_details", rule: FieldRule::ConditionDetail { answer_key: "rust_hail_damage" } },
    FieldSpec { key: "interior_broken", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "interior_broken_details", rule: FieldRule::ConditionDetail { answer_key: "interior_broken" } },
    FieldSpec { key: "interior_rips", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "interior_rips_details", rule: FieldRule::ConditionDetail { answer_key: "interior_rips" } },
    FieldSpec { key: "tires_need_replacement", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "tires_need_replacement_details", rule: FieldRule::ConditionDetail { answer_key: "tires_need_replacement" } },
    FieldSpec { key: "keys", rule: FieldRule::RequiredText { min: 1 } },
    FieldSpec { key: "aftermarket_modifications", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "aftermarket_modifications_details", rule: FieldRule::ConditionDetail { answer_key: "aftermarket_modifications" } },
    FieldSpec { key: "other_issues", rule: FieldRule::ConditionAnswer },
    FieldSpec { key: "other_issues_details", rule: FieldRule::ConditionDetail { answer_key: "other_issues" } },
    // Photos
    FieldSpec { key: "driver_front_corner", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "driver_quarter_panel", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "passenger_quarter_panel", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "front_seats", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "rear_seat_area", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "dashboard", rule: FieldRule::RequiredPhoto },
    FieldSpec { key: "damage1", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "damage1_description", rule: FieldRule::PhotoDescription { photo_key: "damage1" } },
    FieldSpec { key: "damage2", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "damage2_description", rule: FieldRule::PhotoDescription { photo_key: "damage2" } },
    FieldSpec { key: "damage3", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "damage3_description", rule: FieldRule::PhotoDescription { photo_key: "damage3" } },
    FieldSpec { key: "damage4", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "damage4_description", rule: FieldRule::PhotoDescription { photo_key: "damage4" } },
    FieldSpec { key: "feature1", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "feature1_description", rule: FieldRule::PhotoDescription { photo_key: "feature1" } },
    FieldSpec { key: "feature2", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "feature2_description", rule: FieldRule::PhotoDescription { photo_key: "feature2" } },
    FieldSpec { key: "feature3", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "feature3_description", rule: FieldRule::PhotoDescription { photo_key: "feature3" } },
    FieldSpec { key: "feature4", rule: FieldRule::OptionalPhoto },
    FieldSpec { key: "feature4_description", rule: FieldRule::PhotoDescription { photo_key: "feature4" } },
    // Contact
    FieldSpec { key: "name", rule: FieldRule::RequiredText { min: 2 } },
    FieldSpec { key: "email", rule: FieldRule::Email },
    FieldSpec { key: "phone", rule: FieldRule::Phone },
];

// ============================================================================
// Validation
// ============================================================================

/// Validate only the named fields.
///
/// Fields outside `keys` are never inspected, so a step can be checked in
/// isolation without surfacing errors for later steps.
pub fn validate_fields(values: &FormValues, keys: &[&str]) -> Vec<FieldError> {
    FIELDS
        .iter()
        .filter(|spec| keys.contains(&spec.key))
        .filter_map(|spec| check_field(spec, values))
        .collect()
}

/// Validate the entire field map.
pub fn validate_all(values: &FormValues) -> Vec<FieldError> {
    FIELDS
        .iter()
        .filter_map(|spec| check_field(spec, values))
        .collect()
}

fn check_field(spec: &FieldSpec, values: &FormValues) -> Option<FieldError> {
    let text = values.text(spec.key);

    let message: Option<String> = match &spec.rule {
        FieldRule::Vin => {
            if text.len() < 11 || text.len() > 17 {
                Some("VIN must be 11-17 characters".to_string())
            } else {
                None
            }
        }
        FieldRule::RequiredText { min } => {
            if text.chars().count() < *min {
                Some("This field is required".to_string())
            } else {
                None
            }
        }
        FieldRule::OptionalText => None,
        FieldRule::Year => check_year(text),
        FieldRule::Odometer => match text.parse::<i64>() {
            Ok(n) if n >= 0 => None,
            _ => Some("Enter a valid odometer reading".to_string()),
        },
        FieldRule::Enumerated(options) => {
            if options.contains(&text) {
                None
            } else {
                Some("This field is required".to_string())
            }
        }
        FieldRule::ConditionAnswer => {
            if text == "yes" || text == "no" {
                None
            } else {
                Some("This field is required".to_string())
            }
        }
        FieldRule::ConditionDetail { answer_key } => {
            let answer = values.text(answer_key);
            if requires_detail(answer) && text.is_empty() {
                Some("Please provide details".to_string())
            } else {
                None
            }
        }
        FieldRule::Email => {
            if is_plausible_email(text) {
                None
            } else {
                Some("Invalid email address".to_string())
            }
        }
        FieldRule::Phone => {
            if text.chars().filter(|c| c.is_ascii_digit()).count() >= 10 {
                None
            } else {
                Some("Enter a valid phone number".to_string())
            }
        }
        FieldRule::RequiredPhoto => match values.photo(spec.key) {
            None => Some("Image is required.".to_string()),
            Some(photo) => check_photo_file(photo),
        },
        FieldRule::OptionalPhoto => values.photo(spec.key).and_then(check_photo_file),
        FieldRule::PhotoDescription { photo_key } => {
            let has_photo = values.photo(photo_key).is_some();
            if has_photo && text.is_empty() {
                Some("Please describe this photo".to_string())
            } else if !has_photo && !text.is_empty() {
                Some("Description provided without a photo".to_string())
            } else {
                None
            }
        }
    };

    message.map(|m| FieldError::new(spec.key, m))
}

fn check_year(text: &str) -> Option<String> {
    if text.len() != 4 || !text.chars().all(|c| c.is_ascii_digit()) {
        return Some("Enter a valid 4-digit year".to_string());
    }
    let max = Utc::now().year() + 1;
    match text.parse::<i32>() {
        Ok(year) if (MIN_MODEL_YEAR..=max).contains(&year) => None,
        _ => Some(format!(
            "Year must be between {} and {}",
            MIN_MODEL_YEAR, max
        )),
    }
}

fn check_photo_file(photo: &PhotoInput) -> Option<String> {
    if photo.size == 0 {
        return Some("Image is required.".to_string());
    }
    if photo.size > MAX_PHOTO_SIZE {
        return Some("Max file size is 5MB.".to_string());
    }
    if !ACCEPTED_IMAGE_TYPES.contains(&photo.content_type.as_str()) {
        return Some("Only .jpg, .jpeg, .png and .webp formats are supported.".to_string());
    }
    None
}

/// Structural email check: one '@', non-empty local part, dotted domain.
fn is_plausible_email(text: &str) -> bool {
    let mut parts = text.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !text.contains(char::is_whitespace)
}
