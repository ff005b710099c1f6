//! Trade-In Vision server library.
//!
//! This library provides the core functionality for the appraisal server:
//! the shared validation schema, the multi-step form controller, database
//! operations, the submission pipeline, and the API services.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
