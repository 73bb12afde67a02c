//! Disassembler error types.

use std::fmt;

use thiserror::Error;

use crate::{Arch, Mode};
use capstone_wasm_common::RuntimeError;

/// Errors returned when opening a disassembler.
///
/// Failures after a successful open are treated as fatal: the decoder
/// module is trusted and fixed at build time, so a trap or out-of-bounds
/// pointer while decoding panics rather than returning an error.
#[derive(Error, Debug)]
pub enum DisasmError {
    /// The decoder module could not be loaded or instantiated.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// `cs_open` rejected the architecture/mode combination.
    #[error("cs_open failed for arch {arch} mode {mode}: {code}")]
    Open {
        arch: Arch,
        mode: Mode,
        code: CsError,
    },
}

impl DisasmError {
    /// The decoder's status code, if `cs_open` failed.
    pub fn cs_error(&self) -> Option<CsError> {
        match self {
            Self::Open { code, .. } => Some(*code),
            Self::Runtime(_) => None,
        }
    }
}

/// Status codes returned by the decoder's C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsError {
    /// No error.
    Ok,
    /// Out of memory.
    Mem,
    /// Unsupported architecture.
    Arch,
    /// Invalid handle.
    Handle,
    /// Invalid handle argument.
    Csh,
    /// Invalid or unsupported mode.
    Mode,
    /// Invalid or unsupported option.
    Option,
    /// Information unavailable because detail mode is off.
    Detail,
    /// Dynamic memory management uninitialized.
    MemSetup,
    /// Unsupported version.
    Version,
    /// Irrelevant data in diet engine.
    Diet,
    /// Irrelevant data for data instructions in skip-data mode.
    SkipData,
    /// AT&T syntax is unsupported.
    X86Att,
    /// Intel syntax is unsupported.
    X86Intel,
    /// MASM syntax is unsupported.
    X86Masm,
    /// A code this crate does not know about.
    Unknown(u32),
}

impl CsError {
    /// Numeric status code.
    pub fn code(self) -> u32 {
        match self {
            CsError::Ok => 0,
            CsError::Mem => 1,
            CsError::Arch => 2,
            CsError::Handle => 3,
            CsError::Csh => 4,
            CsError::Mode => 5,
            CsError::Option => 6,
            CsError::Detail => 7,
            CsError::MemSetup => 8,
            CsError::Version => 9,
            CsError::Diet => 10,
            CsError::SkipData => 11,
            CsError::X86Att => 12,
            CsError::X86Intel => 13,
            CsError::X86Masm => 14,
            CsError::Unknown(code) => code,
        }
    }

    fn description(self) -> &'static str {
        match self {
            CsError::Ok => "OK (CS_ERR_OK)",
            CsError::Mem => "Out of memory (CS_ERR_MEM)",
            CsError::Arch => "Invalid/unsupported architecture (CS_ERR_ARCH)",
            CsError::Handle => "Invalid handle (CS_ERR_HANDLE)",
            CsError::Csh => "Invalid csh (CS_ERR_CSH)",
            CsError::Mode => "Invalid mode (CS_ERR_MODE)",
            CsError::Option => "Invalid option (CS_ERR_OPTION)",
            CsError::Detail => "Details are unavailable (CS_ERR_DETAIL)",
            CsError::MemSetup => "Dynamic memory management uninitialized (CS_ERR_MEMSETUP)",
            CsError::Version => "Different API version between core & binding (CS_ERR_VERSION)",
            CsError::Diet => "Information irrelevant in diet engine (CS_ERR_DIET)",
            CsError::SkipData => "Information irrelevant for 'data' instruction in SKIPDATA mode (CS_ERR_SKIPDATA)",
            CsError::X86Att => "AT&T syntax is unavailable (CS_ERR_X86_ATT)",
            CsError::X86Intel => "INTEL syntax is unavailable (CS_ERR_X86_INTEL)",
            CsError::X86Masm => "MASM syntax is unavailable (CS_ERR_X86_MASM)",
            CsError::Unknown(_) => "Unknown error code",
        }
    }
}

impl From<u32> for CsError {
    fn from(code: u32) -> Self {
        match code {
            0 => CsError::Ok,
            1 => CsError::Mem,
            2 => CsError::Arch,
            3 => CsError::Handle,
            4 => CsError::Csh,
            5 => CsError::Mode,
            6 => CsError::Option,
            7 => CsError::Detail,
            8 => CsError::MemSetup,
            9 => CsError::Version,
            10 => CsError::Diet,
            11 => CsError::SkipData,
            12 => CsError::X86Att,
            13 => CsError::X86Intel,
            14 => CsError::X86Masm,
            other => CsError::Unknown(other),
        }
    }
}

impl fmt::Display for CsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsError::Unknown(code) => write!(f, "{} ({code})", self.description()),
            _ => f.write_str(self.description()),
        }
    }
}
