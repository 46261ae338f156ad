//! WebSocket HTTP handler for the web layer.
//!
//! This module contains only the Axum upgrade handler. The hub itself
//! (coordinator, outboxes, session loops) lives in the `hub` crate.

pub(crate) mod handler;
