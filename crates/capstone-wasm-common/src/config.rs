//! Configuration structures for capstone-wasm.
//!
//! This module defines configuration options for various components:
//! - [`RuntimeConfig`]: Top-level configuration containing all settings
//! - [`EngineConfig`]: Wasmtime engine settings (pooling, compilation cache)
//! - [`DecoderConfig`]: Where the decoder module image lives

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sub-directory of the user cache directory used for compiled artifacts.
pub const CACHE_NAMESPACE: &str = "capstone-wasm";

/// Environment variable naming the decoder module image.
pub const MODULE_PATH_ENV: &str = "CAPSTONE_WASM";

/// Top-level runtime configuration.
///
/// Can be loaded from a TOML file (see [`crate::config_file::ConfigFile`])
/// or built in code.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Wasmtime engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Decoder module configuration.
    #[serde(default)]
    pub decoder: DecoderConfig,
}

/// Wasmtime engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Enable the pooling allocator for instance creation.
    ///
    /// Each decoder instance owns a single linear memory, so the on-demand
    /// allocator is the default. Pooling pays off for hosts that open and
    /// close many decoders per second.
    #[serde(default = "defaults::pooling_allocator")]
    pub pooling_allocator: bool,

    /// Maximum concurrent instances in the pool.
    ///
    /// Only effective when `pooling_allocator` is enabled.
    #[serde(default = "defaults::max_instances")]
    pub max_instances: u32,

    /// Memory per instance slot in megabytes.
    ///
    /// Only effective when `pooling_allocator` is enabled.
    #[serde(default = "defaults::instance_memory_mb")]
    pub instance_memory_mb: u32,

    /// Enable the persistent compilation cache.
    #[serde(default = "defaults::cache_compiled_modules")]
    pub cache_compiled_modules: bool,

    /// Directory for the compilation cache.
    ///
    /// When unset, `<user cache dir>/capstone-wasm` is used.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pooling_allocator: defaults::pooling_allocator(),
            max_instances: defaults::max_instances(),
            instance_memory_mb: defaults::instance_memory_mb(),
            cache_compiled_modules: defaults::cache_compiled_modules(),
            cache_dir: None,
        }
    }
}

impl EngineConfig {
    /// Resolve the directory the compilation cache should live in.
    ///
    /// Returns `None` when caching is disabled or no cache directory can be
    /// determined for the current user. Neither case is an error.
    pub fn resolve_cache_dir(&self) -> Option<PathBuf> {
        if !self.cache_compiled_modules {
            return None;
        }

        if let Some(dir) = &self.cache_dir {
            return Some(dir.clone());
        }

        let dir = user_cache_dir().map(|base| base.join(CACHE_NAMESPACE));
        if dir.is_none() {
            debug!("No user cache directory available, compilation cache disabled");
        }
        dir
    }
}

/// Decoder module configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecoderConfig {
    /// Path to the decoder WebAssembly module.
    #[serde(default)]
    pub module_path: Option<PathBuf>,
}

impl DecoderConfig {
    /// Module path from the configuration, falling back to `CAPSTONE_WASM`.
    pub fn module_path_or_env(&self) -> Option<PathBuf> {
        self.module_path
            .clone()
            .or_else(|| env::var_os(MODULE_PATH_ENV).map(PathBuf::from))
    }
}

/// Locate the per-user cache directory of the host OS.
///
/// - Linux and other Unix: `$XDG_CACHE_HOME`, else `$HOME/.cache`
/// - macOS: `$HOME/Library/Caches`
/// - Windows: `%LOCALAPPDATA%`
pub fn user_cache_dir() -> Option<PathBuf> {
    let non_empty = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    if cfg!(windows) {
        non_empty("LOCALAPPDATA")
    } else if cfg!(target_os = "macos") {
        non_empty("HOME").map(|home| home.join("Library").join("Caches"))
    } else {
        non_empty("XDG_CACHE_HOME")
            .filter(|p| p.is_absolute())
            .or_else(|| non_empty("HOME").map(|home| home.join(".cache")))
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn pooling_allocator() -> bool {
        false
    }

    pub const fn max_instances() -> u32 {
        64
    }

    pub const fn instance_memory_mb() -> u32 {
        64
    }

    pub const fn cache_compiled_modules() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();

        assert!(!config.engine.pooling_allocator);
        assert_eq!(config.engine.max_instances, 64);
        assert_eq!(config.engine.instance_memory_mb, 64);
        assert!(config.engine.cache_compiled_modules);
        assert!(config.engine.cache_dir.is_none());
        assert!(config.decoder.module_path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = RuntimeConfig::default();
        config.decoder.module_path = Some(PathBuf::from("/opt/capstone.wasm"));

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RuntimeConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            config.engine.max_instances,
            deserialized.engine.max_instances
        );
        assert_eq!(
            deserialized.decoder.module_path,
            Some(PathBuf::from("/opt/capstone.wasm"))
        );
    }

    #[test]
    fn test_partial_deserialization() {
        let json = r#"{"engine": {"max_instances": 8}}"#;
        let config: RuntimeConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.engine.max_instances, 8);
        assert!(config.engine.cache_compiled_modules);
        assert!(config.decoder.module_path.is_none());
    }

    #[test]
    fn test_cache_dir_disabled() {
        let config = EngineConfig {
            cache_compiled_modules: false,
            cache_dir: Some(PathBuf::from("/tmp/ignored")),
            ..Default::default()
        };

        assert_eq!(config.resolve_cache_dir(), None);
    }

    #[test]
    fn test_cache_dir_explicit() {
        let config = EngineConfig {
            cache_dir: Some(PathBuf::from("/var/cache/decoder")),
            ..Default::default()
        };

        assert_eq!(
            config.resolve_cache_dir(),
            Some(PathBuf::from("/var/cache/decoder"))
        );
    }

    #[test]
    fn test_explicit_module_path_wins() {
        let config = DecoderConfig {
            module_path: Some(PathBuf::from("./capstone.wasm")),
        };

        assert_eq!(
            config.module_path_or_env(),
            Some(PathBuf::from("./capstone.wasm"))
        );
    }
}
