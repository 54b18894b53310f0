//! Diabetes prediction web service
//!
//! Serves the patient form, the JSON prediction API, CSV report downloads,
//! and the health/metrics endpoints.

pub mod api;
pub mod config;
pub mod pages;
