//! Command-line arguments.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use capstone_wasm_disasm::{Arch, Mode};

/// Decode machine code into assembly.
#[derive(Debug, Parser)]
#[command(
    name = "decodeasm",
    version,
    override_usage = "decodeasm --arch <ARCH> <HEX OPCODE>\n       decodeasm --arch <ARCH> --stdin"
)]
pub struct Cli {
    /// Architecture to decode.
    #[arg(long, value_enum)]
    pub arch: CliArch,

    /// Opcode bytes as a hex string, with an optional 0x prefix.
    #[arg(
        value_name = "HEX OPCODE",
        required_unless_present = "stdin",
        conflicts_with = "stdin"
    )]
    pub opcode: Option<String>,

    /// Read Go `[]byte{...}` literals from standard input and decode them as
    /// one buffer.
    #[arg(long)]
    pub stdin: bool,

    /// Path to the Capstone WebAssembly module.
    #[arg(long, env = "CAPSTONE_WASM", value_name = "PATH")]
    pub module: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Architectures the command line accepts, named after Go's `GOARCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliArch {
    Arm64,
    Amd64,
}

impl CliArch {
    /// Decoder architecture and mode for this name.
    pub fn target(self) -> (Arch, Mode) {
        match self {
            CliArch::Arm64 => (Arch::AArch64, Mode::ARM),
            CliArch::Amd64 => (Arch::X86, Mode::MODE_64),
        }
    }
}

/// Exit status for an argument error: help and version output succeed,
/// everything else is a usage failure.
pub fn parse_exit_status(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_opcode() {
        let cli = Cli::try_parse_from(["decodeasm", "--arch", "arm64", "ff03ffb8"]).unwrap();

        assert_eq!(cli.arch, CliArch::Arm64);
        assert_eq!(cli.opcode.as_deref(), Some("ff03ffb8"));
        assert!(!cli.stdin);
    }

    #[test]
    fn test_parse_stdin() {
        let cli = Cli::try_parse_from(["decodeasm", "--arch", "amd64", "--stdin"]).unwrap();

        assert!(cli.stdin);
        assert!(cli.opcode.is_none());
    }

    #[test]
    fn test_missing_arch() {
        let err = Cli::try_parse_from(["decodeasm", "90"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_arch() {
        let err = Cli::try_parse_from(["decodeasm", "--arch", "mips", "90"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_opcode() {
        let err = Cli::try_parse_from(["decodeasm", "--arch", "amd64"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_exit_status() {
        let help = Cli::try_parse_from(["decodeasm", "--help"]).unwrap_err();
        let version = Cli::try_parse_from(["decodeasm", "--version"]).unwrap_err();
        let usage = Cli::try_parse_from(["decodeasm", "90"]).unwrap_err();

        assert_eq!(parse_exit_status(&help), 0);
        assert_eq!(parse_exit_status(&version), 0);
        assert_eq!(parse_exit_status(&usage), 1);
    }

    #[test]
    fn test_targets() {
        assert_eq!(CliArch::Arm64.target(), (Arch::AArch64, Mode::ARM));
        assert_eq!(CliArch::Amd64.target(), (Arch::X86, Mode::MODE_64));
    }
}
