//! Business logic services.

pub mod mailer;
pub mod submission;

pub use mailer::{Mailer, ResendMailer};
pub use submission::{SubmissionContext, parse_multipart, finalize_submission};
