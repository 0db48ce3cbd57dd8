// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF
use crate::error::{Error, Result};
use crate::reader::CodeReader;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Node for code dictionary
#[derive(Clone, Copy, Debug)]
struct Node {
    /// Prefix node code
    next: Option<Code>,
    /// Suffix byte value
    byte: u8,
}

/// Code dictionary
#[derive(Debug)]
struct Trie {
    /// Table of codes
    table: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
}

impl Trie {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Check if the dictionary is full
    fn is_full(&self) -> bool {
        self.next_code() >= Bits::MAX.entries()
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.push_node(None, byte as u8);
        }
        self.push_node(None, 0); // clear code
        self.push_node(None, 0); // end code
    }

    /// Push a node into the dictionary
    fn push_node(&mut self, next: Option<Code>, byte: u8) {
        self.table.push(Node { next, byte })
    }

    /// Decompress a code into a buffer (reversed)
    fn decompress_reversed(&self, code: Code, buffer: &mut Vec<u8>) {
        debug_assert!(code < self.next_code());
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            buffer.push(node.byte);
            node = self.table[code as usize];
        }
        buffer.push(node.byte);
    }
}

/// LZW Data Decompressor
#[derive(Debug)]
pub(crate) struct Decompressor {
    /// Code dictionary
    trie: Trie,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last code
    last: Option<Code>,
    /// Scratch buffer for one code's expansion
    scratch: Vec<u8>,
    /// End code has been reached
    done: bool,
}

impl Decompressor {
    /// Create a new decompressor
    ///
    /// * `min_code_bits` Root code size (2 - 8).
    pub fn new(min_code_bits: u8) -> Result<Self> {
        if !(2..=8).contains(&min_code_bits) {
            return Err(Error::InvalidCodeSize);
        }
        Ok(Decompressor {
            trie: Trie::new(min_code_bits),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
            scratch: Vec::with_capacity(Bits::MAX.entries().into()),
            done: false,
        })
    }

    /// Decompress codes from a reader until the end code is reached, or
    /// the buffer holds `limit` bytes.
    ///
    /// Running out of data first is `Error::InsufficientFrameData`; the
    /// bytes decoded until then are kept in the buffer.
    pub fn decompress(
        &mut self,
        reader: &mut CodeReader,
        buffer: &mut Vec<u8>,
        limit: usize,
    ) -> Result<()> {
        while !self.done && buffer.len() < limit {
            match reader.read(self.code_bits.into())? {
                Some(code) => self.decompress_code(code, buffer, limit)?,
                None => return Err(Error::InsufficientFrameData),
            }
        }
        Ok(())
    }

    /// Decompress one code
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
        limit: usize,
    ) -> Result<()> {
        if code == self.trie.clear_code() {
            self.trie.reset();
            self.code_bits = Bits::from(self.min_code_bits + 1);
            self.last = None;
        } else if code == self.trie.end_code() {
            self.done = true;
        } else {
            self.scratch.clear();
            self.decompress_reversed(code)?;
            let rem = limit.saturating_sub(buffer.len());
            buffer.extend(self.scratch.iter().rev().take(rem));
            self.last = Some(code);
        }
        Ok(())
    }

    /// Decompress one code into the scratch buffer (reversed)
    fn decompress_reversed(&mut self, code: Code) -> Result<()> {
        let next_code = self.trie.next_code();
        match self.last {
            None => {
                if code >= self.trie.clear_code() {
                    return Err(Error::InvalidLzwData);
                }
                self.scratch.push(code as u8);
                return Ok(());
            }
            Some(last) => {
                if code < next_code {
                    self.trie.decompress_reversed(code, &mut self.scratch);
                } else if code == next_code && !self.trie.is_full() {
                    self.trie.decompress_reversed(last, &mut self.scratch);
                    let first = self.scratch[self.scratch.len() - 1];
                    self.scratch.insert(0, first);
                } else {
                    return Err(Error::InvalidLzwData);
                }
                if !self.trie.is_full() {
                    let first = self.scratch[self.scratch.len() - 1];
                    self.trie.push_node(Some(last), first);
                    if next_code + 1 == self.code_bits.entries() {
                        self.code_bits += 1;
                    }
                }
            }
        }
        Ok(())
    }
}
