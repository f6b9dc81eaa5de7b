//! Faculty role listings for the internal transfer dashboard, with optional
//! interest form provisioning, respondent pre-fill and HR notification.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod telemetry;
pub mod workflows;

pub use dashboard::{Dashboard, InterestForms};
