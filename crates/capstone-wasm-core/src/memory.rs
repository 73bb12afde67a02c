//! Linear memory access.
//!
//! [`MemoryAccess`] is the only place that turns a guest address into a
//! host-side byte range. Everything above it deals in guest addresses and
//! never indexes memory directly.
//!
//! The trait is implemented for `[u8]`, which is what a module instance's
//! memory looks like from the host between calls. Tests use plain vectors.

use std::ops::Range;

use thiserror::Error;

/// A guest memory access that fell outside committed memory.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The `[address, address + len)` range is not entirely in bounds.
    #[error("out of bounds access: {len} bytes at {address:#x} (memory size {size:#x})")]
    OutOfBounds {
        /// Guest address of the access.
        address: u32,
        /// Length of the access in bytes.
        len: usize,
        /// Size of the memory at the time of the access.
        size: usize,
    },
}

/// Bounds-checked access to a guest's linear memory.
pub trait MemoryAccess {
    /// Current size of the memory in bytes.
    fn size(&self) -> usize;

    /// Copy `buf.len()` bytes starting at `address` into `buf`.
    fn read_into(&self, address: u32, buf: &mut [u8]) -> Result<(), MemoryError>;

    /// Copy `bytes` into memory starting at `address`.
    fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError>;

    /// Read `len` bytes starting at `address`.
    fn read(&self, address: u32, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buf = vec![0; len];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }

    /// Read a single byte.
    fn read_byte(&self, address: u32) -> Result<u8, MemoryError> {
        let mut buf = [0; 1];
        self.read_into(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian `u32`.
    fn read_u32_le(&self, address: u32) -> Result<u32, MemoryError> {
        let mut buf = [0; 4];
        self.read_into(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a little-endian `u32`.
    fn write_u32_le(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        self.write(address, &value.to_le_bytes())
    }

    /// Read a little-endian `u64`.
    fn read_u64_le(&self, address: u32) -> Result<u64, MemoryError> {
        let mut buf = [0; 8];
        self.read_into(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Write a little-endian `u64`.
    fn write_u64_le(&mut self, address: u32, value: u64) -> Result<(), MemoryError> {
        self.write(address, &value.to_le_bytes())
    }

    /// Read the NUL-terminated byte string starting at `address`.
    ///
    /// Scans forward one byte at a time until a zero byte, then reads the span
    /// in a single bounded read. The terminator is not included.
    fn read_cstring(&self, address: u32) -> Result<Vec<u8>, MemoryError> {
        let mut end = address;
        while self.read_byte(end)? != 0 {
            end = end.checked_add(1).ok_or(MemoryError::OutOfBounds {
                address,
                len: (end - address) as usize + 1,
                size: self.size(),
            })?;
        }

        self.read(address, (end - address) as usize)
    }
}

impl MemoryAccess for [u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn read_into(&self, address: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
        let range = checked_range(address, buf.len(), self.len())?;
        buf.copy_from_slice(&self[range]);
        Ok(())
    }

    fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let range = checked_range(address, bytes.len(), self.len())?;
        self[range].copy_from_slice(bytes);
        Ok(())
    }
}

/// Host range for `[address, address + len)` if it lies within `size` bytes.
fn checked_range(address: u32, len: usize, size: usize) -> Result<Range<usize>, MemoryError> {
    let start = address as usize;
    match start.checked_add(len) {
        Some(end) if end <= size => Ok(start..end),
        _ => Err(MemoryError::OutOfBounds { address, len, size }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Vec<u8> {
        let mut mem = vec![0u8; 64];
        mem[8..14].copy_from_slice(b"movb\0\0");
        mem[16..27].copy_from_slice(b"%sil, 1(%r8");
        mem
    }

    #[test]
    fn test_u32_round_trip() {
        let mut mem = memory();

        mem.write_u32_le(32, 0xdead_beef).unwrap();
        assert_eq!(&mem[32..36], &[0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(mem.read_u32_le(32).unwrap(), 0xdead_beef);
    }

    #[test]
    fn test_write_u64() {
        let mut mem = memory();

        mem.write_u64_le(40, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(mem.read_u32_le(40).unwrap(), 0x0506_0708);
        assert_eq!(mem.read_u32_le(44).unwrap(), 0x0102_0304);
        assert_eq!(mem.read_u64_le(40).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_read_cstring() {
        let mem = memory();

        assert_eq!(mem.read_cstring(8).unwrap(), b"movb");
        // Empty string: the first byte is already the terminator.
        assert_eq!(mem.read_cstring(12).unwrap(), b"");
    }

    #[test]
    fn test_read_cstring_unterminated() {
        let mut mem = memory();
        mem[60..64].copy_from_slice(b"abcd");

        let err = mem.read_cstring(60).unwrap_err();
        assert_eq!(
            err,
            MemoryError::OutOfBounds {
                address: 64,
                len: 1,
                size: 64
            }
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mem = memory();

        assert!(mem.read(60, 8).is_err());
        assert!(mem.read_byte(64).is_err());
        assert!(mem.write_u32_le(62, 1).is_err());
        assert!(mem.read_u32_le(u32::MAX).is_err());
        // Failed writes leave memory untouched.
        assert_eq!(&mem[60..64], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_length_access_at_end() {
        let mem = memory();
        assert_eq!(mem.read(64, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_error_display() {
        let err = MemoryError::OutOfBounds {
            address: 0x40,
            len: 4,
            size: 0x40,
        };
        assert_eq!(
            err.to_string(),
            "out of bounds access: 4 bytes at 0x40 (memory size 0x40)"
        );
    }
}
