//! Wasmtime engine configuration and creation.
//!
//! The [`WasmEngine`] is shared by every decoder instance in the process. It
//! is configured for synchronous execution, optionally with the pooling
//! allocator and a persistent compilation cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use wasmtime::{Config, Engine, InstanceAllocationStrategy, PoolingAllocationConfig};

use capstone_wasm_common::{EngineConfig, RuntimeError};

/// File name of the generated Wasmtime cache configuration.
const CACHE_CONFIG_FILE: &str = "wasmtime-cache.toml";

/// Thread-safe WebAssembly engine wrapper.
///
/// Holds no per-instance state. Cloning is cheap.
///
/// # Example
///
/// ```ignore
/// use capstone_wasm_common::EngineConfig;
/// use capstone_wasm_core::WasmEngine;
///
/// let engine = WasmEngine::new(&EngineConfig::default())?;
/// ```
#[derive(Clone)]
pub struct WasmEngine {
    engine: Arc<Engine>,
    config: EngineConfig,
    cache_dir: Option<PathBuf>,
}

impl WasmEngine {
    /// Create a new WebAssembly engine with the given configuration.
    ///
    /// A cache directory that cannot be prepared does not fail engine
    /// creation; the engine simply compiles without a cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wasmtime configuration is invalid.
    pub fn new(config: &EngineConfig) -> Result<Self, RuntimeError> {
        let mut wasmtime_config = Config::new();

        wasmtime_config.cranelift_opt_level(wasmtime::OptLevel::Speed);

        if config.pooling_allocator {
            let pooling_config = Self::create_pooling_config(config);

            wasmtime_config
                .allocation_strategy(InstanceAllocationStrategy::Pooling(pooling_config));

            info!(
                max_instances = config.max_instances,
                instance_memory_mb = config.instance_memory_mb,
                "Pooling allocator enabled"
            );
        }

        let cache_dir = config.resolve_cache_dir().and_then(|dir| {
            match Self::configure_cache(&mut wasmtime_config, &dir) {
                Ok(dir) => {
                    debug!(cache_dir = %dir.display(), "Compilation cache enabled");
                    Some(dir)
                }
                Err(e) => {
                    debug!(
                        cache_dir = %dir.display(),
                        error = %e,
                        "Compilation cache unavailable, continuing without it"
                    );
                    None
                }
            }
        });

        let engine = Engine::new(&wasmtime_config).map_err(|e| {
            RuntimeError::invalid_config(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        info!("Wasmtime engine initialized");

        Ok(Self {
            engine: Arc::new(engine),
            config: config.clone(),
            cache_dir,
        })
    }

    /// Create pooling allocation configuration.
    fn create_pooling_config(config: &EngineConfig) -> PoolingAllocationConfig {
        let mut pooling = PoolingAllocationConfig::default();

        pooling.total_core_instances(config.max_instances);
        pooling.total_memories(config.max_instances);
        pooling.total_tables(config.max_instances);

        let max_memory_bytes = (config.instance_memory_mb as usize) * 1024 * 1024;
        pooling.max_memory_size(max_memory_bytes);

        pooling
    }

    /// Point Wasmtime's compilation cache at `dir`.
    ///
    /// Wasmtime reads cache settings from a TOML file, so one is written into
    /// the cache directory itself.
    fn configure_cache(wasmtime_config: &mut Config, dir: &Path) -> Result<PathBuf, RuntimeError> {
        fs::create_dir_all(dir)?;
        let dir = fs::canonicalize(dir)?;

        let settings = CacheConfigFile {
            cache: CacheSection {
                enabled: true,
                directory: dir.clone(),
            },
        };
        let content = toml::to_string(&settings).map_err(|e| {
            RuntimeError::invalid_config(format!("Failed to render cache config: {e}"))
        })?;

        let config_path = dir.join(CACHE_CONFIG_FILE);
        fs::write(&config_path, content)?;

        wasmtime_config
            .cache_config_load(&config_path)
            .map_err(|e| RuntimeError::invalid_config(format!("Failed to load cache config: {e}")))?;

        Ok(dir)
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Directory of the active compilation cache, if any.
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

impl std::fmt::Debug for WasmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmEngine")
            .field("pooling_allocator", &self.config.pooling_allocator)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

/// On-disk layout of Wasmtime's cache configuration.
#[derive(Serialize)]
struct CacheConfigFile {
    cache: CacheSection,
}

#[derive(Serialize)]
struct CacheSection {
    enabled: bool,
    directory: PathBuf,
}
