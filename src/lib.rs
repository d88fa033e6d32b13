//! Irrigator library.
//!
//! Exposes the controller core, its port traits and the concrete adapters
//! so the binary and the integration tests share one implementation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod journal;
pub mod telemetry;

pub use error::{Error, Result};
