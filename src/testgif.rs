// testgif.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! GIF builder and bitmap host for tests
use crate::bitmap::{Bitmap, BitmapAllocator};
use std::cell::Cell;
use std::rc::Rc;
use weezl::{encode::Encoder, BitOrder};

/// Red / blue / green / white palette
pub(crate) const PALETTE: [[u8; 3]; 4] =
    [[255, 0, 0], [0, 0, 255], [0, 255, 0], [255, 255, 255]];

/// Builder for GIF byte streams
pub(crate) struct GifBuilder {
    bytes: Vec<u8>,
    block_sz: usize,
}

/// Get color table size bits for a number of entries
fn table_bits(len: usize) -> u8 {
    let mut bits = 0;
    while (2 << bits) < len {
        bits += 1;
    }
    bits
}

/// Push a color table, padded to a power of two
fn push_table(bytes: &mut Vec<u8>, colors: &[[u8; 3]]) {
    let len = 2 << table_bits(colors.len());
    for i in 0..len {
        bytes.extend_from_slice(colors.get(i).unwrap_or(&[0, 0, 0]));
    }
}

/// Reorder rows into interlaced order
fn interlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut v = Vec::with_capacity(indices.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            v.extend_from_slice(&indices[y * width..(y + 1) * width]);
        }
    }
    v
}

impl GifBuilder {
    /// Start a GIF without a global color table
    pub fn new(width: u16, height: u16) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        GifBuilder {
            bytes,
            block_sz: 255,
        }
    }

    /// Start a GIF with a global color table
    pub fn with_global(
        width: u16,
        height: u16,
        colors: &[[u8; 3]],
        bg: u8,
    ) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.push(0b1000_0000 | table_bits(colors.len()));
        bytes.push(bg);
        bytes.push(0);
        push_table(&mut bytes, colors);
        GifBuilder {
            bytes,
            block_sz: 255,
        }
    }

    /// Set the size of image data sub-blocks
    pub fn block_sz(mut self, block_sz: usize) -> Self {
        self.block_sz = block_sz.clamp(1, 255);
        self
    }

    /// Add a NETSCAPE2.0 loop count extension
    pub fn loop_count(mut self, count: u16) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1]);
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.push(0);
        self
    }

    /// Add a comment extension
    pub fn comment(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        for chunk in text.chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
        self
    }

    /// Add a graphic control extension
    pub fn control(
        mut self,
        disposal: u8,
        transparent: Option<u8>,
        delay_cs: u16,
    ) -> Self {
        let flags = (disposal << 2) | u8::from(transparent.is_some());
        self.bytes.extend_from_slice(&[0x21, 0xF9, 4, flags]);
        self.bytes.extend_from_slice(&delay_cs.to_le_bytes());
        self.bytes.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        self
    }

    /// Add an image using the global color table
    pub fn image(self, rect: (u16, u16, u16, u16), indices: &[u8]) -> Self {
        self.image_with(rect, None, false, indices)
    }

    /// Add an image (indices in row-major order)
    pub fn image_with(
        mut self,
        rect: (u16, u16, u16, u16),
        local: Option<&[[u8; 3]]>,
        interlaced: bool,
        indices: &[u8],
    ) -> Self {
        let (left, top, width, height) = rect;
        self.bytes.push(b',');
        for v in [left, top, width, height] {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut flags = if interlaced { 0b0100_0000 } else { 0 };
        let mut min_code_size = 2;
        if let Some(colors) = local {
            let bits = table_bits(colors.len());
            flags |= 0b1000_0000 | bits;
            min_code_size = (bits + 1).max(2);
        } else if let Some(max) = indices.iter().max() {
            min_code_size = table_bits(usize::from(*max) + 1).max(1) + 1;
        }
        self.bytes.push(flags);
        if let Some(colors) = local {
            push_table(&mut self.bytes, colors);
        }
        let data = if interlaced {
            interlace(indices, width.into(), height.into())
        } else {
            indices.to_vec()
        };
        let compressed = Encoder::new(BitOrder::Lsb, min_code_size)
            .encode(&data)
            .unwrap();
        self.bytes.push(min_code_size);
        for chunk in compressed.chunks(self.block_sz) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
        self
    }

    /// Add raw bytes
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Get bytes without a trailer
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Get bytes with a trailer
    pub fn trailer(mut self) -> Vec<u8> {
        self.bytes.push(b';');
        self.bytes
    }
}

/// Counters shared between a test allocator and its bitmaps
#[derive(Clone, Debug, Default)]
pub(crate) struct HostCounters {
    pub created: Rc<Cell<usize>>,
    pub destroyed: Rc<Cell<usize>>,
    pub modified: Rc<Cell<usize>>,
    pub opaque: Rc<Cell<bool>>,
}

/// Bitmap allocator which counts calls
#[derive(Default)]
pub(crate) struct TestAllocator {
    counters: HostCounters,
    fail: bool,
}

/// Bitmap for [TestAllocator]
struct TestBitmap {
    buf: Vec<u8>,
    counters: HostCounters,
}

impl TestAllocator {
    /// Create an allocator sharing counters
    pub fn new(counters: &HostCounters) -> Self {
        TestAllocator {
            counters: counters.clone(),
            fail: false,
        }
    }

    /// Create an allocator which always fails
    pub fn failing() -> Self {
        TestAllocator {
            counters: HostCounters::default(),
            fail: true,
        }
    }
}

impl BitmapAllocator for TestAllocator {
    fn create(&mut self, width: u32, height: u32) -> Option<Box<dyn Bitmap>> {
        if self.fail {
            return None;
        }
        let c = &self.counters.created;
        c.set(c.get() + 1);
        Some(Box::new(TestBitmap {
            buf: vec![0; width as usize * height as usize * 4],
            counters: self.counters.clone(),
        }))
    }

    fn destroy(&mut self, _bitmap: Box<dyn Bitmap>) {
        let d = &self.counters.destroyed;
        d.set(d.get() + 1);
    }
}

impl Bitmap for TestBitmap {
    fn buffer(&self) -> &[u8] {
        &self.buf
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn set_opaque(&mut self, opaque: bool) {
        self.counters.opaque.set(opaque);
    }

    fn test_opaque(&self) -> bool {
        self.buf.chunks_exact(4).all(|p| p[3] == 0xFF)
    }

    fn modified(&mut self) {
        let m = &self.counters.modified;
        m.set(m.get() + 1);
    }
}

/// Get RGBA pixels from a bitmap buffer
pub(crate) fn pixels(buf: &[u8]) -> Vec<[u8; 4]> {
    buf.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]]).collect()
}

pub(crate) const RED: [u8; 4] = [255, 0, 0, 255];
pub(crate) const BLUE: [u8; 4] = [0, 0, 255, 255];
pub(crate) const GREEN: [u8; 4] = [0, 255, 0, 255];
pub(crate) const WHITE: [u8; 4] = [255, 255, 255, 255];
pub(crate) const CLEAR: [u8; 4] = [0, 0, 0, 0];
