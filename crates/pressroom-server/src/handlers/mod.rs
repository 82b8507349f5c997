//! HTTP handlers.

pub mod content;
pub mod health;
pub mod invalidate;
pub mod metrics;
