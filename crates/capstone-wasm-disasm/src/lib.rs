//! Capstone disassembler running inside a sandboxed WebAssembly module.
//!
//! ```no_run
//! use capstone_wasm_common::RuntimeConfig;
//! use capstone_wasm_core::DecoderRuntime;
//! use capstone_wasm_disasm::{Arch, Mode, OpenDisassembler};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = DecoderRuntime::from_config(&RuntimeConfig::default())?;
//! let cs = runtime.open(Arch::AArch64, Mode::ARM)?;
//!
//! for line in cs.decode(&[0xff, 0x03, 0xff, 0xb8]) {
//!     println!("{line}");
//! }
//! cs.close();
//! # Ok(())
//! # }
//! ```

mod abi;
pub mod arch;
mod capstone;
mod decode;
pub mod error;

pub use abi::REQUIRED_EXPORTS;
pub use arch::{Arch, Mode, OptType, OptValue};
pub use capstone::{Capstone, OpenDisassembler};
pub use decode::{Disassembly, Instruction};
pub use error::{CsError, DisasmError};
