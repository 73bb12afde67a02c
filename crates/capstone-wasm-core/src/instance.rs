//! Module instance lifecycle.
//!
//! A [`ModuleInstance`] is one instantiation of the decoder module: its own
//! store, linear memory and call stack. It is exclusively owned by whoever
//! instantiated it, and dropping it releases the whole memory segment at once.

use tracing::{debug, instrument};
use uuid::Uuid;
use wasmtime::{Func, Instance, Memory, Store};

use crate::store::ModuleContext;
use capstone_wasm_common::RuntimeError;

/// Name of the exported linear memory.
const MEMORY_EXPORT: &str = "memory";

/// WASI reactor initializer.
const INITIALIZE_EXPORT: &str = "_initialize";

/// WASI command entry point.
const START_EXPORT: &str = "_start";

/// A live instance of the decoder module.
pub struct ModuleInstance {
    store: Store<ModuleContext>,
    instance: Instance,
    memory: Memory,
}

impl ModuleInstance {
    /// Wrap a freshly instantiated module and run its initializer.
    ///
    /// A module exporting `_initialize` is a WASI reactor and gets it called
    /// once. Otherwise `_start` is called if present; a clean `proc_exit(0)`
    /// from it is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the module does not export its memory or the
    /// initializer traps.
    #[instrument(skip_all, fields(instance_id = %store.data().instance_id()))]
    pub(crate) fn new(mut store: Store<ModuleContext>, instance: Instance) -> Result<Self, RuntimeError> {
        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| RuntimeError::export_not_found(MEMORY_EXPORT))?;

        let mut this = Self {
            store,
            instance,
            memory,
        };
        this.initialize()?;

        debug!(memory_bytes = this.memory_size(), "Module instance ready");
        Ok(this)
    }

    fn initialize(&mut self) -> Result<(), RuntimeError> {
        if let Ok(init) = self
            .instance
            .get_typed_func::<(), ()>(&mut self.store, INITIALIZE_EXPORT)
        {
            debug!("Running reactor initializer");
            return init
                .call(&mut self.store, ())
                .map_err(|e| RuntimeError::trap(format!("{INITIALIZE_EXPORT}: {e:#}")));
        }

        if let Ok(start) = self
            .instance
            .get_typed_func::<(), ()>(&mut self.store, START_EXPORT)
        {
            debug!("Running command entry point");
            return match start.call(&mut self.store, ()) {
                Ok(()) => Ok(()),
                Err(e) => match e.downcast_ref::<wasmtime_wasi::I32Exit>() {
                    Some(exit) if exit.0 == 0 => Ok(()),
                    _ => Err(RuntimeError::trap(format!("{START_EXPORT}: {e:#}"))),
                },
            };
        }

        Ok(())
    }

    /// Identifier used in log lines for this instance.
    pub fn id(&self) -> Uuid {
        self.store.data().instance_id()
    }

    /// Look up an exported function by name.
    pub fn get_func(&mut self, name: &str) -> Option<Func> {
        self.instance.get_func(&mut self.store, name)
    }

    /// The instance's linear memory as it is right now.
    ///
    /// Any call into the module may grow (and move) the memory, which is why
    /// this borrows the whole instance.
    pub fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    /// Mutable view of the instance's linear memory.
    pub fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    /// Size of the linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    /// Get the store.
    pub fn store(&self) -> &Store<ModuleContext> {
        &self.store
    }

    /// Get the store mutably.
    pub fn store_mut(&mut self) -> &mut Store<ModuleContext> {
        &mut self.store
    }
}

impl std::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("instance_id", &self.id())
            .field("memory_size", &self.memory_size())
            .finish_non_exhaustive()
    }
}
