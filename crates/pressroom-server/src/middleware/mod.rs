//! Tower middleware applied to every route.
//!
//! Order matters: `RequestIdLayer` runs first and stores a [`RequestId`] in
//! the request extensions, which `LoggingLayer` puts on the request span.

mod logging;
mod request_id;

pub use logging::{LoggingLayer, LoggingMiddleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer, RequestIdMiddleware};
