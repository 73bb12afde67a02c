//! The per-call decoding protocol.
//!
//! One call runs entirely inside the engine's module instance:
//!
//! ```text
//!   cs_malloc(handle)           -> insn     instruction record, reused
//!   malloc(16)                  -> cursor   [code ptr | size | address (u64)]
//!   malloc(len)                 -> input    copy of the caller's bytes
//!   loop cs_disasm_iter(handle, cursor+0, cursor+4, cursor+8, insn)
//!        cs_get_mnemonic(insn), cs_get_op_str(insn)
//!   free(input), free(cursor), cs_free(insn, 1)
//! ```
//!
//! `cs_disasm_iter` advances the cursor itself. The scratch blocks are
//! released in reverse order on every exit path, including unwinding.

use std::fmt;

use tracing::{error, trace, warn};

use capstone_wasm_core::{MemoryAccess, MemoryError};

use crate::capstone::Session;

/// Size of the cursor block: code pointer, remaining size and a 64-bit
/// address, all little-endian.
const CURSOR_SIZE: usize = 16;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset of the instruction within the decoded input.
    pub offset: u64,
    /// Mnemonic, such as `movb`.
    pub mnemonic: String,
    /// Operand text. Empty for instructions without operands.
    pub operands: String,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Result of decoding one byte buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disassembly {
    /// Decoded instructions in input order.
    pub instructions: Vec<Instruction>,
    /// Trailing bytes left undecoded. Zero when the whole input decoded.
    pub remaining: usize,
}

impl Disassembly {
    /// Returns `true` if every input byte decoded.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Allocation {
    Block(u32),
    Record(u32),
}

/// Guest allocations owned by one decode call, released on drop.
struct Scratch<'s> {
    session: &'s mut Session,
    allocations: Vec<Allocation>,
}

impl<'s> Scratch<'s> {
    fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            allocations: Vec::with_capacity(3),
        }
    }

    fn malloc(&mut self, size: usize) -> u32 {
        let Session { instance, abi, .. } = &mut *self.session;
        let block = abi.malloc(instance, size);
        assert!(block != 0 || size == 0, "decoder malloc({size}) failed");

        self.allocations.push(Allocation::Block(block));
        block
    }

    fn instruction_record(&mut self) -> u32 {
        let Session {
            instance,
            abi,
            handle,
        } = &mut *self.session;
        let insn = abi.cs_malloc(instance, *handle);
        assert!(insn != 0, "decoder cs_malloc failed");

        self.allocations.push(Allocation::Record(insn));
        insn
    }

    fn memory(&self) -> &[u8] {
        self.session.instance.memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.session.instance.memory_mut()
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        let Session { instance, abi, .. } = &mut *self.session;

        while let Some(allocation) = self.allocations.pop() {
            let released = match allocation {
                Allocation::Block(block) => abi.free(instance, block),
                Allocation::Record(insn) => abi.cs_free(instance, insn, 1),
            };
            if let Err(e) = released {
                warn!(?allocation, error = %e, "Failed to release decoder scratch memory");
            }
        }
    }
}

fn fatal(what: &str, err: &MemoryError) -> ! {
    error!(error = %err, "Decoder returned an invalid {what}");
    panic!("decoder returned an invalid {what}: {err}");
}

/// Copy the input into guest memory and point the cursor at it, starting
/// from address zero. `len` is `code.len()`, already checked to fit.
fn seed(
    memory: &mut [u8],
    input: u32,
    code: &[u8],
    len: u32,
    cursor: u32,
) -> Result<(), MemoryError> {
    memory.write(input, code)?;
    memory.write_u32_le(cursor, input)?;
    memory.write_u32_le(cursor + 4, len)?;
    memory.write_u64_le(cursor + 8, 0)
}

fn guest_string(memory: &[u8], address: u32, what: &str) -> String {
    let bytes = memory
        .read_cstring(address)
        .unwrap_or_else(|e| fatal(what, &e));
    String::from_utf8_lossy(&bytes).into_owned()
}

impl Session {
    /// Decode `code` inside this session's module instance.
    pub(crate) fn disassemble(&mut self, code: &[u8]) -> Disassembly {
        let handle = self.handle;
        let len = u32::try_from(code.len()).unwrap_or_else(|_| {
            panic!("{} byte input exceeds the decoder's address space", code.len())
        });

        let mut scratch = Scratch::new(self);
        let insn = scratch.instruction_record();
        let cursor = scratch.malloc(CURSOR_SIZE);
        let input = scratch.malloc(code.len());

        let (code_slot, size_slot, address_slot) = (cursor, cursor + 4, cursor + 8);
        seed(scratch.memory_mut(), input, code, len, cursor)
            .unwrap_or_else(|e| fatal("scratch buffer", &e));

        let mut instructions = Vec::new();
        loop {
            let offset = scratch
                .memory()
                .read_u64_le(address_slot)
                .unwrap_or_else(|e| fatal("cursor", &e));

            let Session { instance, abi, .. } = &mut *scratch.session;
            if !abi.cs_disasm_iter(instance, handle, code_slot, size_slot, address_slot, insn) {
                break;
            }

            let mnemonic = abi.cs_get_mnemonic(instance, insn);
            let operands = abi.cs_get_op_str(instance, insn);
            let instruction = Instruction {
                offset,
                mnemonic: guest_string(instance.memory(), mnemonic, "mnemonic"),
                operands: guest_string(instance.memory(), operands, "operand string"),
            };
            trace!(offset, %instruction, "Decoded instruction");
            instructions.push(instruction);
        }

        let remaining = scratch
            .memory()
            .read_u32_le(size_slot)
            .unwrap_or_else(|e| fatal("cursor", &e));

        Disassembly {
            instructions,
            remaining: remaining as usize,
        }
    }
}
