//! Disassembler engine instances.

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use capstone_wasm_core::{DecoderRuntime, MemoryAccess, ModuleInstance};

use crate::abi::{Abi, REQUIRED_EXPORTS};
use crate::decode::Disassembly;
use crate::{Arch, CsError, DisasmError, Mode, OptType, OptValue};

/// An open disassembler for one architecture and mode.
///
/// Each `Capstone` owns a private instance of the decoder module, so
/// independent engines never contend. Calls on one engine are serialized by
/// an internal lock held for the whole decode.
///
/// Dropping the engine releases its module instance. [`Capstone::close`] does
/// the same explicitly; decoding after `close` panics.
pub struct Capstone {
    arch: Arch,
    mode: Mode,
    session: Mutex<Option<Session>>,
}

/// Decoder state behind the lock.
pub(crate) struct Session {
    pub(crate) instance: ModuleInstance,
    pub(crate) abi: Abi,
    pub(crate) handle: u32,
}

impl Capstone {
    /// Instantiate the decoder module and open an engine on it.
    ///
    /// The output syntax is set to AT&T on every architecture; decoders
    /// that reject the option keep their default syntax.
    ///
    /// # Errors
    ///
    /// Returns [`DisasmError::Runtime`] if the module cannot be instantiated
    /// and [`DisasmError::Open`] if `cs_open` rejects `arch`/`mode`.
    #[instrument(skip(runtime), fields(arch = %arch, mode = %mode))]
    pub fn new(runtime: &DecoderRuntime, arch: Arch, mode: Mode) -> Result<Self, DisasmError> {
        let instance = runtime.instantiate()?;
        let session = Session::open(instance, arch, mode)?;

        info!(instance_id = %session.instance.id(), "Disassembler opened");

        Ok(Self {
            arch,
            mode,
            session: Mutex::new(Some(session)),
        })
    }

    /// Architecture this engine decodes.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Mode this engine was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Decode `code` into one `"mnemonic operands"` line per instruction.
    ///
    /// Decoding stops at the first byte sequence that is not a valid
    /// instruction; everything decoded before it is returned. Empty input
    /// yields an empty list.
    ///
    /// # Panics
    ///
    /// Panics if the engine is closed or the decoder module faults.
    pub fn decode(&self, code: &[u8]) -> Vec<String> {
        self.disassemble(code)
            .instructions
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Decode `code`, keeping offsets and the undecoded remainder.
    ///
    /// # Panics
    ///
    /// Panics if the engine is closed or the decoder module faults.
    pub fn disassemble(&self, code: &[u8]) -> Disassembly {
        let mut guard = self.session.lock();
        let session = guard
            .as_mut()
            .unwrap_or_else(|| panic!("{} disassembler used after close", self.arch));

        session.disassemble(code)
    }

    /// Release the module instance. Calling it again is a no-op.
    pub fn close(&self) {
        if let Some(session) = self.session.lock().take() {
            debug!(instance_id = %session.instance.id(), "Disassembler closed");
        }
    }

    /// Returns `true` once [`Capstone::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.session.lock().is_none()
    }
}

impl std::fmt::Debug for Capstone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capstone")
            .field("arch", &self.arch)
            .field("mode", &self.mode)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Session {
    /// Run `cs_open` on a fresh instance and configure the handle.
    pub(crate) fn open(
        mut instance: ModuleInstance,
        arch: Arch,
        mode: Mode,
    ) -> Result<Self, DisasmError> {
        let mut abi = Abi::new();

        let slot = abi.malloc(&mut instance, 4);
        assert!(slot != 0, "decoder malloc failed for the handle slot");

        let status = abi.cs_open(&mut instance, arch, mode, slot);
        let handle = match status {
            0 => Some(
                instance
                    .memory()
                    .read_u32_le(slot)
                    .unwrap_or_else(|e| panic!("decoder handle slot: {e}")),
            ),
            _ => None,
        };
        if let Err(e) = abi.free(&mut instance, slot) {
            warn!(error = %e, "Failed to free the handle slot");
        }

        let Some(handle) = handle else {
            return Err(DisasmError::Open {
                arch,
                mode,
                code: CsError::from(status),
            });
        };

        let mut session = Self {
            instance,
            abi,
            handle,
        };
        session.set_option(OptType::Syntax, OptValue::SYNTAX_ATT);

        Ok(session)
    }

    /// Set an engine option. A rejected option is logged and otherwise
    /// ignored.
    pub(crate) fn set_option(&mut self, opt: OptType, value: OptValue) {
        let status = self
            .abi
            .cs_option(&mut self.instance, self.handle, opt, value);

        if status != 0 {
            warn!(
                option = ?opt,
                value = value.bits(),
                error = %CsError::from(status),
                "Decoder rejected option"
            );
        }
    }
}

/// Open engines straight from a [`DecoderRuntime`].
pub trait OpenDisassembler {
    /// Instantiate the decoder and open an engine on it.
    ///
    /// # Errors
    ///
    /// See [`Capstone::new`].
    fn open(&self, arch: Arch, mode: Mode) -> Result<Capstone, DisasmError>;

    /// Check that the decoder module exports the full disassembler ABI.
    ///
    /// # Errors
    ///
    /// Returns [`DisasmError::Runtime`] naming the first missing export.
    fn verify_disassembler(&self) -> Result<(), DisasmError>;
}

impl OpenDisassembler for DecoderRuntime {
    fn open(&self, arch: Arch, mode: Mode) -> Result<Capstone, DisasmError> {
        Capstone::new(self, arch, mode)
    }

    fn verify_disassembler(&self) -> Result<(), DisasmError> {
        Ok(self.require_exports(&REQUIRED_EXPORTS)?)
    }
}
