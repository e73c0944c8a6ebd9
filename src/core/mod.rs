//! Core module - shared infrastructure for Gondola
//!
//! This module contains foundational types, configuration, logging, and error
//! handling used throughout the application.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use error::{GondolaError, Result};
pub use types::*;
