//! API handlers for all routes.

pub mod screenings;
pub mod webhooks;
