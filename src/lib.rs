//! # kcenter-rs
//!
//! Asynchronous AI task bridge for the knowledge-center API.
//!
//! Submits summarize / keyword / normalize calls onto a Redis list consumed
//! by an external worker pool, reads the worker's result records back, and
//! exposes both over a small JSON HTTP API. With no broker configured the
//! subsystem stays disabled and its endpoints answer 503.

pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod service;
pub mod telemetry;
