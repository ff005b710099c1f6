//! Multi-step appraisal form controller.
//!
//! A pure state machine over [`FormValues`]: one step of fields is shown and
//! validated at a time, submission runs the full validation and hands the map
//! to a pluggable [`SubmissionGateway`]. The controller holds no I/O of its
//! own, so the driving UI (or a test) supplies the gateway.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::schema::{self, FieldError, FormValues, PhotoInput};

/// A contiguous group of fields displayed and validated together.
pub struct Step {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// The data-entry steps, in order. The terminal summary step is
/// `STEPS.len()` and has no fields of its own.
pub const STEPS: &[Step] = &[
    Step {
        name: "Vehicle",
        fields: &["vin", "make", "model", "year", "odometer", "trim"],
    },
    Step {
        name: "Details",
        fields: &["transmission", "drivetrain"],
    },
    Step {
        name: "Condition",
        fields: &[
            "accident_history",
            "accident_history_details",
            "frame_damage",
            "frame_damage_details",
            "flood_damage",
            "flood_damage_details",
            "smoked_in",
            "smoked_in_details",
            "mechanical_issues",
            "mechanical_issues_details",
            "odometer_broken",
            "odometer_broken_details",
            "paint_body_work",
            "paint_body_work_details",
            "rust_hail_damage",
            "rust_hail_damage_details",
            "interior_broken",
            "interior_broken_details",
            "interior_rips",
            "interior_rips_details",
            "tires_need_replacement",
            "tires_need_replacement_details",
            "keys",
            "aftermarket_modifications",
            "aftermarket_modifications_details",
            "other_issues",
            "other_issues_details",
        ],
    },
    Step {
        name: "Photos",
        fields: &[
            "driver_front_corner",
            "driver_quarter_panel",
            "passenger_quarter_panel",
            "front_seats",
            "rear_seat_area",
            "dashboard",
            "damage1",
            "damage1_description",
            "damage2",
            "damage2_description",
            "damage3",
            "damage3_description",
            "damage4",
            "damage4_description",
            "feature1",
            "feature1_description",
            "feature2",
            "feature2_description",
            "feature3",
            "feature3_description",
            "feature4",
            "feature4_description",
        ],
    },
    Step {
        name: "Contact",
        fields: &["name", "email", "phone"],
    },
];

/// The network seam the controller submits through.
#[async_trait]
pub trait SubmissionGateway {
    /// Deliver the completed form; returns the generated submission id.
    async fn submit(&self, values: &FormValues) -> AppResult<Uuid>;
}

/// Why a submit attempt did not produce a submission id.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Submission is only available from the final step")]
    NotOnFinalStep,

    #[error("A submission is already in flight")]
    AlreadyInFlight,

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Single top-level error from the gateway; the form stays on the final
    /// step so the seller can retry.
    #[error("{0}")]
    Gateway(String),
}

/// Multi-step form state machine.
pub struct FormController {
    step: usize,
    values: FormValues,
    submission_id: Option<Uuid>,
    in_flight: bool,
}

impl FormController {
    pub fn new() -> Self {
        Self {
            step: 0,
            values: FormValues::new(),
            submission_id: None,
            in_flight: false,
        }
    }

    /// Current step index; `STEPS.len()` is the terminal summary step.
    pub fn current_step(&self) -> usize {
        self.step
    }

    /// Whether the form has reached the terminal summary step.
    pub fn is_complete(&self) -> bool {
        self.step == STEPS.len()
    }

    pub fn submission_id(&self) -> Option<Uuid> {
        self.submission_id
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.set_text(key, value);
    }

    /// Attach a photo to a slot. The replaced input, if any, is returned so
    /// the caller can release its preview; dropping it releases any backing
    /// temp file.
    pub fn set_photo(&mut self, key: impl Into<String>, photo: PhotoInput) -> Option<PhotoInput> {
        self.values.set_photo(key, photo)
    }

    /// Detach a photo from a slot, releasing it on drop.
    pub fn remove_photo(&mut self, key: &str) -> Option<PhotoInput> {
        self.values.remove_photo(key)
    }

    /// Validate the current step and advance.
    ///
    /// Only the current step's declared fields are checked; violations keep
    /// the form on the step. The index is bounded at the last data-entry
    /// step; reaching the summary goes through [`FormController::submit`].
    pub fn next(&mut self) -> Result<(), Vec<FieldError>> {
        if self.step >= STEPS.len() - 1 {
            return Ok(());
        }

        let errors = schema::validate_fields(&self.values, STEPS[self.step].fields);
        if !errors.is_empty() {
            return Err(errors);
        }

        self.step += 1;
        Ok(())
    }

    /// Go back one step. Never validates; bounded at step zero.
    pub fn previous(&mut self) {
        if self.step > 0 && self.step < STEPS.len() {
            self.step -= 1;
        }
    }

    /// Validate the whole form and submit through the gateway.
    ///
    /// Only invocable from the final data-entry step. While the gateway call
    /// is awaited the controller is in flight and rejects re-entry; success
    /// moves to the terminal step carrying the returned id, failure keeps
    /// the form on the final step with a single top-level error.
    pub async fn submit(&mut self, gateway: &dyn SubmissionGateway) -> Result<Uuid, SubmitError> {
        if self.step != STEPS.len() - 1 {
            return Err(SubmitError::NotOnFinalStep);
        }
        if self.in_flight {
            return Err(SubmitError::AlreadyInFlight);
        }

        let errors = schema::validate_all(&self.values);
        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        self.in_flight = true;
        let result = gateway.submit(&self.values).await;
        self.in_flight = false;

        match result {
            Ok(id) => {
                self.submission_id = Some(id);
                self.step = STEPS.len();
                Ok(id)
            }
            Err(e) => Err(SubmitError::Gateway(e.to_string())),
        }
    }

    /// Clear all fields and results and return to the first step. Dropping
    /// the old values releases every attached photo.
    pub fn restart(&mut self) {
        *self = Self::new();
    }
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}
