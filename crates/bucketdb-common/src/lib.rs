//! BucketDB Common - Shared utilities and types
//!
//! This crate provides functionality used by every BucketDB component:
//! - Error types and handling
//! - Configuration management
//! - Logging initialisation

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
