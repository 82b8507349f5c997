//! Test helpers para pressroom-server.

#![allow(dead_code, unused_imports)]

pub mod app;
pub mod client;

pub use app::{KEY_PREFIX, RecordingStore, TestApp};
pub use client::{TestClient, TestResponse};
