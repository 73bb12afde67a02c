//! Wasmtime host bridge for the capstone-wasm decoder module.
//!
//! This crate knows how to load, instantiate and talk to a WebAssembly
//! module through its C ABI, without knowing what the module does:
//! - [`WasmEngine`]: Configured Wasmtime engine with optional compilation cache
//! - [`CompiledModule`]: Compiled WebAssembly module wrapper
//! - [`DecoderRuntime`]: Compile-once bootstrap and instance factory
//! - [`ModuleInstance`]: One isolated instance with its own linear memory
//! - [`ExportedFunction`]: Lazily resolved export called with `u64` arguments
//! - [`MemoryAccess`]: Bounds-checked reads and writes of guest memory
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   DecoderRuntime                        │
//! │  (One per process, shared, read-only)                   │
//! │  - WasmEngine + compilation cache                       │
//! │  - CompiledModule                                       │
//! │  - Linker with WASI preview1                            │
//! └─────────────────────────────────────────────────────────┘
//!                            │ instantiate()
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          ModuleInstance (Store<ModuleContext>)          │
//! │  (Per decoder, exclusively owned)                       │
//! │  - Linear memory  ◄── MemoryAccess                      │
//! │  - Exports        ◄── ExportedFunction                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod function;
pub mod instance;
pub mod memory;
pub mod module;
pub mod runtime;
pub mod store;

pub use engine::WasmEngine;
pub use function::ExportedFunction;
pub use instance::ModuleInstance;
pub use memory::{MemoryAccess, MemoryError};
pub use module::CompiledModule;
pub use runtime::DecoderRuntime;
pub use store::ModuleContext;
