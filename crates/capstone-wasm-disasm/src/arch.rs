//! Architecture, mode and option constants of the decoder's C API.
//!
//! Values are part of the module's ABI and must match its headers exactly.

use std::fmt;

use bitflags::bitflags;

/// Instruction-set family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Arch {
    /// ARM, including Thumb and Thumb-2.
    Arm = 0,
    /// AArch64.
    AArch64 = 1,
    /// MIPS.
    Mips = 2,
    /// x86, including x86-64.
    X86 = 3,
    /// PowerPC.
    Ppc = 4,
    /// SPARC.
    Sparc = 5,
    /// SystemZ.
    SysZ = 6,
    /// XCore.
    XCore = 7,
    /// Motorola 68K.
    M68k = 8,
    /// TMS320C64x.
    Tms320c64x = 9,
    /// Motorola 680X.
    M680x = 10,
    /// Ethereum VM.
    Evm = 11,
    /// MOS65XX, including MOS6502.
    Mos65xx = 12,
    /// WebAssembly.
    Wasm = 13,
    /// Berkeley Packet Filter, including eBPF.
    Bpf = 14,
    /// RISC-V.
    RiscV = 15,
    /// SuperH.
    Sh = 16,
    /// TriCore.
    TriCore = 17,
    /// Alpha.
    Alpha = 18,
}

impl Arch {
    /// Every architecture, in ABI order.
    pub const ALL: [Arch; 19] = [
        Arch::Arm,
        Arch::AArch64,
        Arch::Mips,
        Arch::X86,
        Arch::Ppc,
        Arch::Sparc,
        Arch::SysZ,
        Arch::XCore,
        Arch::M68k,
        Arch::Tms320c64x,
        Arch::M680x,
        Arch::Evm,
        Arch::Mos65xx,
        Arch::Wasm,
        Arch::Bpf,
        Arch::RiscV,
        Arch::Sh,
        Arch::TriCore,
        Arch::Alpha,
    ];

    /// Numeric value passed across the ABI.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Look up an architecture by its ABI value.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::AArch64 => "aarch64",
            Arch::Mips => "mips",
            Arch::X86 => "x86",
            Arch::Ppc => "ppc",
            Arch::Sparc => "sparc",
            Arch::SysZ => "sysz",
            Arch::XCore => "xcore",
            Arch::M68k => "m68k",
            Arch::Tms320c64x => "tms320c64x",
            Arch::M680x => "m680x",
            Arch::Evm => "evm",
            Arch::Mos65xx => "mos65xx",
            Arch::Wasm => "wasm",
            Arch::Bpf => "bpf",
            Arch::RiscV => "riscv",
            Arch::Sh => "sh",
            Arch::TriCore => "tricore",
            Arch::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mode bit-field.
///
/// Which bits are meaningful depends on the architecture, and several names
/// share a value (for example [`Mode::THUMB`] and [`Mode::MICRO`]). Combine
/// with `|`.
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mode: u32 {
        /// Little-endian (default).
        const LITTLE_ENDIAN = 0;
        /// 32-bit ARM.
        const ARM = 0;
        /// 16-bit mode (x86).
        const MODE_16 = 1 << 1;
        /// 32-bit mode (x86).
        const MODE_32 = 1 << 2;
        /// 64-bit mode (x86, PPC).
        const MODE_64 = 1 << 3;
        /// ARM's Thumb mode, including Thumb-2.
        const THUMB = 1 << 4;
        /// ARM's Cortex-M series.
        const MCLASS = 1 << 5;
        /// ARMv8 A32 encodings for ARM.
        const V8 = 1 << 6;
        /// MicroMips mode.
        const MICRO = 1 << 4;
        /// Mips III ISA.
        const MIPS3 = 1 << 5;
        /// Mips32r6 ISA.
        const MIPS32R6 = 1 << 6;
        /// Mips II ISA.
        const MIPS2 = 1 << 7;
        /// Mips32 ISA.
        const MIPS32 = Self::MODE_32.bits();
        /// Mips64 ISA.
        const MIPS64 = Self::MODE_64.bits();
        /// SparcV9 mode.
        const V9 = 1 << 4;
        /// Quad Processing eXtensions (PPC).
        const QPX = 1 << 4;
        /// Signal Processing Engine (PPC).
        const SPE = 1 << 5;
        /// Book-E (PPC).
        const BOOKE = 1 << 6;
        /// Paired-singles (PPC).
        const PS = 1 << 7;
        /// M68K 68000.
        const M68K_000 = 1 << 1;
        /// M68K 68010.
        const M68K_010 = 1 << 2;
        /// M68K 68020.
        const M68K_020 = 1 << 3;
        /// M68K 68030.
        const M68K_030 = 1 << 4;
        /// M68K 68040.
        const M68K_040 = 1 << 5;
        /// M68K 68060.
        const M68K_060 = 1 << 6;
        /// Big-endian.
        const BIG_ENDIAN = 1 << 31;
        /// Hitachi 6301/6303.
        const M680X_6301 = 1 << 1;
        /// Hitachi 6309.
        const M680X_6309 = 1 << 2;
        /// Motorola 6800/6802.
        const M680X_6800 = 1 << 3;
        /// Motorola 6801/6803.
        const M680X_6801 = 1 << 4;
        /// Motorola/Freescale 6805.
        const M680X_6805 = 1 << 5;
        /// Motorola/Freescale/NXP 68HC08.
        const M680X_6808 = 1 << 6;
        /// Motorola 6809.
        const M680X_6809 = 1 << 7;
        /// Motorola/Freescale/NXP 68HC11.
        const M680X_6811 = 1 << 8;
        /// Motorola/Freescale/NXP CPU12, used on M68HC12/HCS12.
        const M680X_CPU12 = 1 << 9;
        /// Freescale/NXP HCS08.
        const M680X_HCS08 = 1 << 10;
        /// Classic BPF (default).
        const BPF_CLASSIC = 0;
        /// Extended BPF.
        const BPF_EXTENDED = 1 << 0;
        /// RISC-V RV32G.
        const RISCV32 = 1 << 0;
        /// RISC-V RV64G.
        const RISCV64 = 1 << 1;
        /// RISC-V compressed instructions.
        const RISCVC = 1 << 2;
        /// MOS 6502.
        const MOS65XX_6502 = 1 << 1;
        /// WDC 65c02.
        const MOS65XX_65C02 = 1 << 2;
        /// WDC W65c02.
        const MOS65XX_W65C02 = 1 << 3;
        /// WDC 65816, 8-bit m/x.
        const MOS65XX_65816 = 1 << 4;
        /// WDC 65816, 16-bit m, 8-bit x.
        const MOS65XX_65816_LONG_M = 1 << 5;
        /// WDC 65816, 8-bit m, 16-bit x.
        const MOS65XX_65816_LONG_X = 1 << 6;
        /// WDC 65816, 16-bit m/x.
        const MOS65XX_65816_LONG_MX =
            Self::MOS65XX_65816_LONG_M.bits() | Self::MOS65XX_65816_LONG_X.bits();
        /// SH2.
        const SH2 = 1 << 1;
        /// SH2A.
        const SH2A = 1 << 2;
        /// SH3.
        const SH3 = 1 << 3;
        /// SH4.
        const SH4 = 1 << 4;
        /// SH4A.
        const SH4A = 1 << 5;
        /// SH with FPU.
        const SHFPU = 1 << 6;
        /// SH with DSP.
        const SHDSP = 1 << 7;
        /// TriCore 1.1.
        const TRICORE_110 = 1 << 1;
        /// TriCore 1.2.
        const TRICORE_120 = 1 << 2;
        /// TriCore 1.3.
        const TRICORE_130 = 1 << 3;
        /// TriCore 1.3.1.
        const TRICORE_131 = 1 << 4;
        /// TriCore 1.6.
        const TRICORE_160 = 1 << 5;
        /// TriCore 1.6.1.
        const TRICORE_161 = 1 << 6;
        /// TriCore 1.6.2.
        const TRICORE_162 = 1 << 7;
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.bits())
    }
}

/// Runtime option selector for `cs_option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OptType {
    /// No option specified.
    Invalid = 0,
    /// Assembly output syntax.
    Syntax = 1,
    /// Break down instruction structure into details.
    Detail = 2,
    /// Change the engine's mode at run-time.
    Mode = 3,
    /// User-defined dynamic memory functions.
    Mem = 4,
    /// Skip data when disassembling.
    SkipData = 5,
    /// User-defined function for the skip-data option.
    SkipDataSetup = 6,
    /// Customize instruction mnemonic.
    Mnemonic = 7,
    /// Print immediate operands in unsigned form.
    Unsigned = 8,
    /// ARM: print branch immediates without offset.
    NoBranchOffset = 9,
}

/// Value argument for `cs_option`.
///
/// Different option types reuse the same bits.
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OptValue: u16 {
        /// Turn an option off.
        const OFF = 0;
        /// Turn an option on.
        const ON = 1 << 0;
        /// Default assembly syntax.
        const SYNTAX_DEFAULT = 1 << 1;
        /// x86 Intel syntax.
        const SYNTAX_INTEL = 1 << 2;
        /// x86 AT&T syntax.
        const SYNTAX_ATT = 1 << 3;
        /// Print register numbers only.
        const SYNTAX_NOREGNAME = 1 << 4;
        /// x86 Intel MASM syntax.
        const SYNTAX_MASM = 1 << 5;
        /// MOS65XX: `$` as hex prefix.
        const SYNTAX_MOTOROLA = 1 << 6;
        /// Print common register aliases not defined by LLVM.
        const SYNTAX_CS_REG_ALIAS = 1 << 7;
        /// PPC: print `%` in front of registers.
        const SYNTAX_PERCENT = 1 << 8;
        /// Always report the real instruction detail, even for aliases.
        const DETAIL_REAL = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_abi_values() {
        assert_eq!(Arch::Arm.as_u16(), 0);
        assert_eq!(Arch::AArch64.as_u16(), 1);
        assert_eq!(Arch::X86.as_u16(), 3);
        assert_eq!(Arch::Wasm.as_u16(), 13);
        assert_eq!(Arch::Alpha.as_u16(), 18);
    }

    #[test]
    fn test_arch_from_u16() {
        for arch in Arch::ALL {
            assert_eq!(Arch::from_u16(arch.as_u16()), Some(arch));
        }
        assert_eq!(Arch::from_u16(19), None);
        assert_eq!(Arch::from_u16(0xffff), None);
    }

    #[test]
    fn test_arch_display() {
        assert_eq!(Arch::AArch64.to_string(), "aarch64");
        assert_eq!(Arch::RiscV.to_string(), "riscv");
    }

    #[test]
    fn test_mode_combination() {
        let mode = Mode::THUMB | Mode::MCLASS | Mode::BIG_ENDIAN;

        assert_eq!(mode.bits(), 0x8000_0030);
        assert!(mode.contains(Mode::THUMB));
        assert!(!mode.contains(Mode::V8));

        let mut mode = Mode::RISCV64;
        mode |= Mode::RISCVC;
        assert_eq!(mode, Mode::from_bits_retain(0b110));
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!(Mode::ARM, Mode::LITTLE_ENDIAN);
        assert_eq!(Mode::MICRO, Mode::THUMB);
        assert_eq!(Mode::MIPS64, Mode::MODE_64);
        assert_eq!(Mode::MOS65XX_65816_LONG_MX.bits(), 0x60);
    }

    #[test]
    fn test_option_values() {
        assert_eq!(OptType::Syntax as u16, 1);
        assert_eq!(OptValue::SYNTAX_ATT.bits(), 8);
        assert_eq!(OptValue::SYNTAX_INTEL.bits(), 4);
    }

    #[test]
    fn test_mode_unknown_bits() {
        assert_eq!(Mode::from_bits(1 << 20), None);
        assert_eq!(Mode::from_bits_retain(1 << 20).bits(), 1 << 20);
        assert_eq!(Mode::from_bits(0x8000_0004), Some(Mode::BIG_ENDIAN | Mode::MODE_32));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::MODE_64.to_string(), "0x8");
    }
}
