//! Domain models and DTOs.

pub mod appraisal;

pub use appraisal::{
    Appraisal, AppraisalDetailResponse, AppraisalListResponse, AppraisalSummary, ConditionAnswer,
    ConditionReport, DeleteAppraisalRequest, DeleteAppraisalResponse, Drivetrain, PhotoManifest,
    PhotoView, StoredPhoto, SubmitAppraisalResponse, Transmission, YesNo,
};
