//! HTTP route handlers

pub mod auth;
pub mod exercises;
pub mod learner;
pub mod progress;
