//! Bytecode chunk: code bytes, a parallel line table and a constant pool.

use crate::error::ChunkError;
use crate::value::Value;

/// Constant pool capacity: indices are a single byte.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// A chunk of bytecode.
///
/// `lines` always has one entry per byte of `code`. Every read is bounds
/// checked and reports the offending offset together with the chunk size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<i32>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a byte produced by source line `line`. Returns its offset.
    pub fn write(&mut self, byte: u8, line: i32) -> Result<usize, ChunkError> {
        let offset = self.code.len();
        if line < 0 {
            return Err(ChunkError::InvalidLineNumber { line, offset });
        }
        self.code.push(byte);
        self.lines.push(line);
        Ok(offset)
    }

    /// Append a 16-bit value (little-endian). Returns the offset of its first byte.
    pub fn write_word(&mut self, word: u16, line: i32) -> Result<usize, ChunkError> {
        let [lo, hi] = word.to_le_bytes();
        let offset = self.write(lo, line)?;
        self.write(hi, line)?;
        Ok(offset)
    }

    pub fn read(&self, offset: usize) -> Result<u8, ChunkError> {
        self.code
            .get(offset)
            .copied()
            .ok_or(ChunkError::OutOfBounds {
                offset,
                size: self.code.len(),
            })
    }

    /// Read a 16-bit little-endian value from two consecutive bytes.
    pub fn read_word(&self, offset: usize) -> Result<u16, ChunkError> {
        match self.code.get(offset..offset.saturating_add(2)) {
            Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(self.insufficient(offset, 2)),
        }
    }

    /// Overwrite a previously written 16-bit value, e.g. a jump placeholder.
    pub fn patch_word(&mut self, offset: usize, word: u16) -> Result<(), ChunkError> {
        let size = self.code.len();
        match self.code.get_mut(offset..offset.saturating_add(2)) {
            Some(bytes) => {
                bytes.copy_from_slice(&word.to_le_bytes());
                Ok(())
            }
            None => Err(ChunkError::InsufficientBytes {
                offset,
                needed: 2,
                size,
            }),
        }
    }

    pub fn line_at(&self, offset: usize) -> Result<i32, ChunkError> {
        self.lines
            .get(offset)
            .copied()
            .ok_or(ChunkError::OutOfBounds {
                offset,
                size: self.lines.len(),
            })
    }

    /// Add a constant to the pool and return its index.
    ///
    /// Fails once the pool holds `MAX_CONSTANTS` values; the pool is left
    /// unchanged.
    pub fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        let index = u8::try_from(self.constants.len()).map_err(|_| ChunkError::TooManyConstants {
            limit: MAX_CONSTANTS,
        })?;
        self.constants.push(value);
        Ok(index)
    }

    pub fn read_constant(&self, index: usize) -> Result<&Value, ChunkError> {
        self.constants
            .get(index)
            .ok_or(ChunkError::InvalidConstantIndex {
                index,
                size: self.constants.len(),
            })
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn lines(&self) -> &[i32] {
        &self.lines
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    fn insufficient(&self, offset: usize, needed: usize) -> ChunkError {
        ChunkError::InsufficientBytes {
            offset,
            needed,
            size: self.code.len(),
        }
    }
}
