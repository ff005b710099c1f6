//! API integration tests.

mod helpers;

mod admin_tests;
mod files_tests;
mod health_tests;
mod submit_tests;
