//! Common types, errors, and configuration for capstone-wasm.
//!
//! This crate provides shared functionality used across the workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for the engine and the decoder module
//! - TOML configuration file loading

pub mod config;
pub mod config_file;
pub mod error;

pub use config::{DecoderConfig, EngineConfig, RuntimeConfig};
pub use config_file::{ConfigFile, ConfigFileError, LogConfig, LogFormat};
pub use error::RuntimeError;
