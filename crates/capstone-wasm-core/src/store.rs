//! Per-instance store context.
//!
//! Every decoder instance gets its own [`Store`] whose data is a
//! [`ModuleContext`]. Dropping the store releases the instance's linear
//! memory and everything allocated inside it.

use uuid::Uuid;
use wasmtime::Store;
use wasmtime_wasi::WasiCtxBuilder;
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::WasmEngine;

/// State owned by one module instance's store.
///
/// The WASI context exposes only the host's standard streams to the
/// decoder: no preopened directories, no environment, no sockets.
pub struct ModuleContext {
    /// WASI preview1 context.
    pub(crate) wasi: WasiP1Ctx,

    /// Identifier used to correlate log lines for this instance.
    instance_id: Uuid,
}

impl ModuleContext {
    /// Create a new context with a fresh instance identifier.
    pub fn new() -> Self {
        let wasi = WasiCtxBuilder::new().inherit_stdio().build_p1();

        Self {
            wasi,
            instance_id: Uuid::new_v4(),
        }
    }

    /// Identifier of the owning instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}

/// Create a new Wasmtime store for one decoder instance.
pub fn create_store(engine: &WasmEngine) -> Store<ModuleContext> {
    Store::new(engine.inner(), ModuleContext::new())
}
