//! Decoder module bootstrap.
//!
//! [`DecoderRuntime`] compiles the decoder image once and hands out fresh
//! [`ModuleInstance`]s. It replaces any notion of process-global module
//! state: construct it at startup and pass it (or an `Arc` of it) to whoever
//! needs to open decoders.

use std::path::Path;

use tracing::{debug, info, instrument};
use wasmtime::Linker;

use crate::store::{ModuleContext, create_store};
use crate::{CompiledModule, ModuleInstance, WasmEngine};
use capstone_wasm_common::{EngineConfig, RuntimeConfig, RuntimeError};

/// Compiled decoder module plus everything needed to instantiate it.
///
/// # Thread Safety
///
/// `DecoderRuntime` is `Send + Sync`. Instantiation only reads the shared
/// compiled module; each instance gets its own store.
pub struct DecoderRuntime {
    engine: WasmEngine,
    module: CompiledModule,
    linker: Linker<ModuleContext>,
}

impl DecoderRuntime {
    /// Build a runtime from an engine and an already compiled module.
    ///
    /// # Errors
    ///
    /// Returns an error if WASI cannot be registered on the linker or the
    /// module's imports cannot be satisfied.
    pub fn with_module(engine: WasmEngine, module: CompiledModule) -> Result<Self, RuntimeError> {
        let mut linker = Linker::new(engine.inner());

        wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |cx: &mut ModuleContext| {
            &mut cx.wasi
        })
        .map_err(|e| RuntimeError::invalid_config(format!("Failed to register WASI: {e}")))?;

        // Imports outside WASI are never reached by the decoding paths; make
        // them trap instead of refusing to instantiate.
        linker
            .define_unknown_imports_as_traps(module.inner())
            .map_err(|e| RuntimeError::instantiation_failed(format!("Unresolvable imports: {e}")))?;

        debug!(
            content_hash = %module.content_hash(),
            pooling_allocator = engine.config().pooling_allocator,
            cache_dir = ?engine.cache_dir(),
            "Decoder runtime ready"
        );

        Ok(Self {
            engine,
            module,
            linker,
        })
    }

    /// Compile the decoder from WebAssembly bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be created or compilation fails.
    pub fn from_bytes(config: &EngineConfig, bytes: &[u8]) -> Result<Self, RuntimeError> {
        let engine = WasmEngine::new(config)?;
        let module = CompiledModule::from_bytes(engine.inner(), bytes)?;
        Self::with_module(engine, module)
    }

    /// Compile the decoder from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ModuleNotFound`] if the file does not exist,
    /// or an engine/compilation error.
    pub fn from_file(config: &EngineConfig, path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let engine = WasmEngine::new(config)?;
        let module = CompiledModule::from_file(engine.inner(), path)?;
        Self::with_module(engine, module)
    }

    /// Compile the decoder from WAT text.
    ///
    /// This is primarily for testing purposes.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be created or compilation fails.
    pub fn from_wat(config: &EngineConfig, wat: &str) -> Result<Self, RuntimeError> {
        let engine = WasmEngine::new(config)?;
        let module = CompiledModule::from_wat(engine.inner(), wat)?;
        Self::with_module(engine, module)
    }

    /// Build the runtime described by a full configuration.
    ///
    /// The module path comes from `config.decoder.module_path`, falling back
    /// to the `CAPSTONE_WASM` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ModuleNotFound`] if no module path is
    /// configured, or any error from [`DecoderRuntime::from_file`].
    #[instrument(skip(config))]
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let path = config.decoder.module_path_or_env().ok_or_else(|| {
            RuntimeError::module_not_found(
                "no decoder module configured (set runtime.decoder.module_path or CAPSTONE_WASM)",
            )
        })?;

        info!(path = %path.display(), "Loading decoder module");
        Self::from_file(&config.engine, path)
    }

    /// Create a fresh, initialized instance of the decoder module.
    ///
    /// # Errors
    ///
    /// Returns an error if instantiation or the module's initializer fails.
    pub fn instantiate(&self) -> Result<ModuleInstance, RuntimeError> {
        let mut store = create_store(&self.engine);

        let instance = self
            .linker
            .instantiate(&mut store, self.module.inner())
            .map_err(|e| RuntimeError::instantiation_failed(format!("{e:#}")))?;

        ModuleInstance::new(store, instance)
    }

    /// Check that the module exports every function in `names`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ExportNotFound`] for the first missing export.
    pub fn require_exports(&self, names: &[&str]) -> Result<(), RuntimeError> {
        match names.iter().find(|name| !self.module.exports_function(name)) {
            Some(missing) => Err(RuntimeError::export_not_found(*missing)),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for DecoderRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRuntime")
            .field("engine", &self.engine)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryAccess;

    const WAT: &str = r#"
        (module
            (memory (export "memory") 1)
            (global $ready (mut i32) (i32.const 0))
            (func (export "_initialize") (global.set $ready (i32.const 1)))
            (func (export "ready") (result i32) (global.get $ready))
            (func (export "store") (param $addr i32) (param $value i32)
                (i32.store (local.get $addr) (local.get $value)))
        )
    "#;

    fn config() -> EngineConfig {
        EngineConfig {
            cache_compiled_modules: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_runtime_from_wat() {
        let runtime = DecoderRuntime::from_wat(&config(), WAT).unwrap();
        assert!(runtime.require_exports(&["ready", "store"]).is_ok());
    }

    #[test]
    fn test_require_exports_missing() {
        let runtime = DecoderRuntime::from_wat(&config(), WAT).unwrap();
        let err = runtime.require_exports(&["ready", "cs_open"]).unwrap_err();

        assert!(matches!(err, RuntimeError::ExportNotFound { ref name } if name == "cs_open"));
    }

    #[test]
    fn test_instantiate_runs_initializer() {
        let runtime = DecoderRuntime::from_wat(&config(), WAT).unwrap();
        let mut instance = runtime.instantiate().unwrap();

        let ready = instance.get_func("ready").unwrap();
        let mut results = [wasmtime::Val::I32(0)];
        ready.call(instance.store_mut(), &[], &mut results).unwrap();

        assert_eq!(results[0].i32(), Some(1));
    }

    #[test]
    fn test_instances_have_separate_memory() {
        let runtime = DecoderRuntime::from_wat(&config(), WAT).unwrap();
        let mut a = runtime.instantiate().unwrap();
        let b = runtime.instantiate().unwrap();

        a.memory_mut().write_u32_le(16, 0xabcd).unwrap();

        assert_eq!(a.memory().read_u32_le(16).unwrap(), 0xabcd);
        assert_eq!(b.memory().read_u32_le(16).unwrap(), 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_instantiate_without_memory_export() {
        let runtime = DecoderRuntime::from_wat(&config(), "(module)").unwrap();
        let err = runtime.instantiate().unwrap_err();

        assert!(matches!(err, RuntimeError::ExportNotFound { .. }));
    }

    #[test]
    fn test_start_with_clean_exit() {
        let wat = r#"
            (module
                (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
                (memory (export "memory") 1)
                (func (export "_start") (call $exit (i32.const 0)))
            )
        "#;
        let runtime = DecoderRuntime::from_wat(&config(), wat).unwrap();

        assert!(runtime.instantiate().is_ok());
    }

    #[test]
    fn test_initializer_trap_is_reported() {
        let wat = r#"
            (module
                (memory (export "memory") 1)
                (func (export "_initialize") unreachable)
            )
        "#;
        let runtime = DecoderRuntime::from_wat(&config(), wat).unwrap();
        let err = runtime.instantiate().unwrap_err();

        assert!(matches!(err, RuntimeError::Trap { .. }));
    }

    #[test]
    fn test_from_config_without_module() {
        let config = RuntimeConfig {
            engine: config(),
            ..Default::default()
        };
        // Only meaningful when the environment does not provide a module.
        if config.decoder.module_path_or_env().is_none() {
            let err = DecoderRuntime::from_config(&config).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn test_runtime_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DecoderRuntime>();
    }
}
