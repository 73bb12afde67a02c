//! Error types for capstone-wasm.
//!
//! [`RuntimeError`] covers everything that can go wrong between reading the
//! decoder image and having a live module instance: compilation,
//! instantiation, export lookup and configuration.
//!
//! Failures that indicate a broken low-level contract with the decoder module
//! (an out-of-bounds pointer, a trap in the middle of a decode loop) are not
//! represented here. Those are programming errors and panic at the call site.

use std::io;

use thiserror::Error;

/// Errors raised while bootstrapping or instantiating the decoder module.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No decoder module image was configured or it does not exist.
    #[error("Decoder module not found: {path}")]
    ModuleNotFound {
        /// Path (or description) of the missing module.
        path: String,
    },

    /// WebAssembly compilation failed.
    #[error("Compilation failed: {reason}")]
    CompilationFailed {
        /// Description of the compilation failure.
        reason: String,
    },

    /// Instantiating the compiled module failed.
    #[error("Instantiation failed: {reason}")]
    InstantiationFailed {
        /// Description of the instantiation failure.
        reason: String,
    },

    /// The module does not export a function the bridge depends on.
    #[error("Export not found: {name}")]
    ExportNotFound {
        /// Name of the missing export.
        name: String,
    },

    /// A WebAssembly trap occurred while calling into the module.
    #[error("Wasm trap: {message}")]
    Trap {
        /// Description of the trap.
        message: String,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration was provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl RuntimeError {
    /// Create a new `ModuleNotFound` error.
    pub fn module_not_found(path: impl Into<String>) -> Self {
        Self::ModuleNotFound { path: path.into() }
    }

    /// Create a new `CompilationFailed` error.
    pub fn compilation_failed(reason: impl Into<String>) -> Self {
        Self::CompilationFailed {
            reason: reason.into(),
        }
    }

    /// Create a new `InstantiationFailed` error.
    pub fn instantiation_failed(reason: impl Into<String>) -> Self {
        Self::InstantiationFailed {
            reason: reason.into(),
        }
    }

    /// Create a new `ExportNotFound` error.
    pub fn export_not_found(name: impl Into<String>) -> Self {
        Self::ExportNotFound { name: name.into() }
    }

    /// Create a new `Trap` error.
    pub fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error indicates the module image was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound { .. })
    }
}
