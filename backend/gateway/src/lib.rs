//! `meterline-gateway`: HTTP surface for LINE webhooks.
//!
//! Provides:
//! - Webhook endpoint (GET probe, POST deliveries)
//! - Concurrent per-event routing with failure isolation
//! - Acknowledgment policy
//! - Health endpoint

pub mod ack;
pub mod dispatch;
pub mod health;
pub mod server;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use ack::Acknowledgment;
pub use dispatch::{DEFAULT_CALL_TIMEOUT, DEFAULT_OCR_TIMEOUT, EventRouter};
pub use server::{build_router, serve_until, start_server};
pub use webhook::{Pipeline, Readiness, WebhookState};
