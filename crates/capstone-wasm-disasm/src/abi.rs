//! Typed wrappers over the decoder module's exported C functions.
//!
//! Pointers are 32-bit offsets into the instance's linear memory. Every
//! wrapper panics on a trap; only the two release functions report traps as
//! errors, since they run from cleanup paths.

use capstone_wasm_common::RuntimeError;
use capstone_wasm_core::{ExportedFunction, ModuleInstance};

use crate::{Arch, Mode, OptType, OptValue};

/// Export names the disassembler calls.
pub const REQUIRED_EXPORTS: [&str; 9] = [
    "malloc",
    "free",
    "cs_open",
    "cs_option",
    "cs_malloc",
    "cs_free",
    "cs_disasm_iter",
    "cs_get_mnemonic",
    "cs_get_op_str",
];

/// Per-instance table of resolved exports.
#[derive(Debug, Clone)]
pub(crate) struct Abi {
    malloc: ExportedFunction,
    free: ExportedFunction,
    cs_open: ExportedFunction,
    cs_option: ExportedFunction,
    cs_malloc: ExportedFunction,
    cs_free: ExportedFunction,
    cs_disasm_iter: ExportedFunction,
    cs_get_mnemonic: ExportedFunction,
    cs_get_op_str: ExportedFunction,
}

#[allow(clippy::cast_possible_truncation)]
fn ptr(value: u64) -> u32 {
    value as u32
}

impl Abi {
    pub(crate) const fn new() -> Self {
        Self {
            malloc: ExportedFunction::new("malloc"),
            free: ExportedFunction::new("free"),
            cs_open: ExportedFunction::new("cs_open"),
            cs_option: ExportedFunction::new("cs_option"),
            cs_malloc: ExportedFunction::new("cs_malloc"),
            cs_free: ExportedFunction::new("cs_free"),
            cs_disasm_iter: ExportedFunction::new("cs_disasm_iter"),
            cs_get_mnemonic: ExportedFunction::new("cs_get_mnemonic"),
            cs_get_op_str: ExportedFunction::new("cs_get_op_str"),
        }
    }

    /// `malloc(size)`. Also resolves `free`, so a later release cannot fail
    /// on lookup.
    pub(crate) fn malloc(&mut self, instance: &mut ModuleInstance, size: usize) -> u32 {
        self.free.resolve(instance);
        ptr(self.malloc.call(instance, [size as u64]))
    }

    /// `free(ptr)`.
    pub(crate) fn free(&mut self, instance: &mut ModuleInstance, block: u32) -> Result<(), RuntimeError> {
        self.free.try_call(instance, [block.into()]).map(drop)
    }

    /// `cs_open(arch, mode, &handle)`, returning the raw status.
    pub(crate) fn cs_open(
        &mut self,
        instance: &mut ModuleInstance,
        arch: Arch,
        mode: Mode,
        handle_ptr: u32,
    ) -> u32 {
        let status = self.cs_open.call(
            instance,
            [arch.as_u16().into(), mode.bits().into(), handle_ptr.into()],
        );
        ptr(status)
    }

    /// `cs_option(handle, type, value)`, returning the raw status.
    pub(crate) fn cs_option(
        &mut self,
        instance: &mut ModuleInstance,
        handle: u32,
        opt: OptType,
        value: OptValue,
    ) -> u32 {
        let status = self.cs_option.call(
            instance,
            [handle.into(), (opt as u16).into(), value.bits().into()],
        );
        ptr(status)
    }

    /// `cs_malloc(handle)`. Also resolves `cs_free`.
    pub(crate) fn cs_malloc(&mut self, instance: &mut ModuleInstance, handle: u32) -> u32 {
        self.cs_free.resolve(instance);
        ptr(self.cs_malloc.call(instance, [handle.into()]))
    }

    /// `cs_free(insn, count)`.
    pub(crate) fn cs_free(
        &mut self,
        instance: &mut ModuleInstance,
        insn: u32,
        count: u32,
    ) -> Result<(), RuntimeError> {
        self.cs_free
            .try_call(instance, [insn.into(), count.into()])
            .map(drop)
    }

    /// `cs_disasm_iter(handle, &code, &size, &address, insn)`.
    ///
    /// Returns `false` once the input is exhausted or undecodable.
    pub(crate) fn cs_disasm_iter(
        &mut self,
        instance: &mut ModuleInstance,
        handle: u32,
        code_ptr_slot: u32,
        size_slot: u32,
        address_slot: u32,
        insn: u32,
    ) -> bool {
        let more = self.cs_disasm_iter.call(
            instance,
            [
                handle.into(),
                code_ptr_slot.into(),
                size_slot.into(),
                address_slot.into(),
                insn.into(),
            ],
        );
        more != 0
    }

    /// `cs_get_mnemonic(insn)`: address of the NUL-terminated mnemonic.
    pub(crate) fn cs_get_mnemonic(&mut self, instance: &mut ModuleInstance, insn: u32) -> u32 {
        ptr(self.cs_get_mnemonic.call(instance, [insn.into()]))
    }

    /// `cs_get_op_str(insn)`: address of the NUL-terminated operand text.
    pub(crate) fn cs_get_op_str(&mut self, instance: &mut ModuleInstance, insn: u32) -> u32 {
        ptr(self.cs_get_op_str.call(instance, [insn.into()]))
    }
}
