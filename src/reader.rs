// reader.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Code reader for LZW data split into sub-blocks
use crate::error::{Error, Result};

/// Reader for variable-width codes packed into GIF sub-blocks.
///
/// Each sub-block starts with a size byte (0-255), followed by that many
/// data bytes.  A zero-size sub-block ends the data.  Codes are packed
/// least-significant bit first, and one code can span up to three
/// sub-blocks.
#[derive(Debug)]
pub(crate) struct CodeReader<'a> {
    /// Input data (starting at the first sub-block size)
    data: &'a [u8],
    /// Offset to next sub-block size
    next_block: usize,
    /// Offset to current sub-block data
    block: usize,
    /// Current bit offset in sub-block
    bit: u32,
    /// Bit count in sub-block
    bit_count: u32,
    /// Zero-size sub-block has been reached
    end_of_data: bool,
}

/// Result of advancing to the next sub-block
#[derive(Debug, PartialEq)]
enum Advance {
    /// Sub-block with data
    Data,
    /// Zero-size sub-block
    EndOfData,
}

impl<'a> CodeReader<'a> {
    /// Create a new code reader
    pub fn new(data: &'a [u8]) -> Self {
        CodeReader {
            data,
            next_block: 0,
            block: 0,
            bit: 0,
            bit_count: 0,
            end_of_data: false,
        }
    }

    /// Get offset just past the last sub-block consumed
    pub fn consumed(&self) -> usize {
        self.next_block
    }

    /// Advance to the next sub-block
    fn advance(&mut self) -> Result<Advance> {
        let pos = self.next_block;
        let size = *self.data.get(pos).ok_or(Error::InsufficientFrameData)?;
        let size = usize::from(size);
        if pos + size >= self.data.len() {
            return Err(Error::InsufficientFrameData);
        }
        self.bit = 0;
        self.bit_count = (size as u32) * 8;
        if size == 0 {
            self.next_block += 1;
            self.end_of_data = true;
            return Ok(Advance::EndOfData);
        }
        self.block = pos + 1;
        self.next_block += size + 1;
        Ok(Advance::Data)
    }

    /// Read the next code.
    ///
    /// * `code_bits` Code width, in bits (1 - 12).
    ///
    /// Returns `None` when a zero-size sub-block is reached.
    pub fn read(&mut self, code_bits: u8) -> Result<Option<u16>> {
        debug_assert!(code_bits > 0 && code_bits <= 12);
        if self.end_of_data {
            return Ok(None);
        }
        let bits = u32::from(code_bits);
        if self.bit + bits <= self.bit_count {
            Ok(Some(self.read_fast(bits)))
        } else {
            self.read_slow(bits)
        }
    }

    /// Read a code contained within the current sub-block
    fn read_fast(&mut self, bits: u32) -> u16 {
        let start = self.block + (self.bit >> 3) as usize;
        let end = self.block + ((self.bit + bits + 7) >> 3) as usize;
        let mut code = 0;
        for (i, byte) in self.data[start..end].iter().enumerate() {
            code |= u32::from(*byte) << (i * 8);
        }
        let code = (code >> (self.bit & 0b111)) & ((1 << bits) - 1);
        self.bit += bits;
        code as u16
    }

    /// Read a code spanning sub-blocks
    fn read_slow(&mut self, bits: u32) -> Result<Option<u16>> {
        let mut code = 0;
        let mut n_bits = 0;
        while n_bits < bits {
            while self.bit >= self.bit_count {
                if self.advance()? == Advance::EndOfData {
                    return Ok(None);
                }
            }
            let byte = self.data[self.block + (self.bit >> 3) as usize];
            let offset = self.bit & 0b111;
            let take = (8 - offset).min(bits - n_bits);
            let part = (u32::from(byte) >> offset) & ((1 << take) - 1);
            code |= part << n_bits;
            n_bits += take;
            self.bit += take;
        }
        Ok(Some(code as u16))
    }
}
