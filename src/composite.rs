// composite.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Frame compositing onto the output bitmap
use crate::bitmap::{Bitmap, BitmapAllocator};
use crate::block::{ColorTable, DisposalMethod};
use crate::error::{Error, Result};
use crate::frame::{Bounds, Frame, Rect};
use crate::lzw::Decompressor;
use crate::parse::Parser;
use crate::reader::CodeReader;
use std::borrow::Cow;

/// Result of decoding a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Frame was decoded completely
    Complete,
    /// Compressed data ran out; pixels drawn so far are kept
    Partial,
    /// Frame has nothing to display
    NoDisplay,
}

/// Compositor for frames onto a host bitmap
pub(crate) struct Compositor {
    /// Host bitmap allocator
    host: Box<dyn BitmapAllocator>,
    /// Output bitmap
    bitmap: Option<Box<dyn Bitmap>>,
    /// Bitmap width
    width: u32,
    /// Bitmap height
    height: u32,
    /// Last fully decoded frame
    decoded_frame: Option<usize>,
    /// Frame partially drawn on top of the bitmap
    dirty_frame: Option<usize>,
    /// Bitmap contents before a restore-to-previous frame was drawn
    snapshot: Option<(usize, Vec<u8>)>,
    /// Decompressed color indices
    indices: Vec<u8>,
}

/// Get the image row of an interlaced row
fn interlaced_row(row: u32, height: u32) -> u32 {
    let pass1 = (height + 7) / 8;
    if row < pass1 {
        return row * 8;
    }
    let row = row - pass1;
    let pass2 = (height + 3) / 8;
    if row < pass2 {
        return row * 8 + 4;
    }
    let row = row - pass2;
    let pass3 = (height + 1) / 4;
    if row < pass3 {
        return row * 4 + 2;
    }
    (row - pass3) * 2 + 1
}

/// Set one pixel, tracking changes
fn set_pixel(
    buf: &mut [u8],
    width: u32,
    x: u32,
    y: u32,
    rgba: [u8; 4],
    changed: &mut Bounds,
) {
    let pos = (y as usize * width as usize + x as usize) * 4;
    if let Some(px) = buf.get_mut(pos..pos + 4) {
        if *px != rgba {
            px.copy_from_slice(&rgba);
            changed.include(x, y);
        }
    }
}

/// Fill a rectangle with one color
fn fill_rect(
    buf: &mut [u8],
    width: u32,
    rect: Rect,
    rgba: [u8; 4],
    changed: &mut Bounds,
) {
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            set_pixel(buf, width, x, y, rgba, changed);
        }
    }
}

/// Restore a rectangle from a snapshot
fn restore_rect(
    buf: &mut [u8],
    snapshot: &[u8],
    width: u32,
    rect: Rect,
    changed: &mut Bounds,
) {
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let pos = (y as usize * width as usize + x as usize) * 4;
            if let Some(px) = snapshot.get(pos..pos + 4) {
                let rgba = [px[0], px[1], px[2], px[3]];
                set_pixel(buf, width, x, y, rgba, changed);
            }
        }
    }
}

/// Draw color indices for a frame.
///
/// Returns `true` if any transparent pixel was skipped.
fn draw_indices(
    buf: &mut [u8],
    width: u32,
    frame: &Frame,
    table: &ColorTable,
    indices: &[u8],
    changed: &mut Bounds,
) -> bool {
    let desc = frame.image_desc();
    let left = u32::from(desc.left());
    let top = u32::from(desc.top());
    let height = u32::from(desc.height());
    let visible = width.saturating_sub(left) as usize;
    let transparent = frame.transparent_color();
    let mut skipped = false;
    let mut out_of_range = false;
    for (row, line) in indices.chunks(desc.width().into()).enumerate() {
        let row = row as u32;
        let y = top
            + if desc.interlaced() {
                interlaced_row(row, height)
            } else {
                row
            };
        for (col, idx) in line.iter().take(visible).enumerate() {
            if Some(*idx) == transparent {
                skipped = true;
                continue;
            }
            out_of_range |= usize::from(*idx) >= table.entries();
            let x = left + col as u32;
            set_pixel(buf, width, x, y, table.rgba(*idx), changed);
        }
    }
    if out_of_range {
        warn!("color index past end of table ({} entries)", table.entries());
    }
    skipped
}

impl Compositor {
    /// Create a new compositor
    pub fn new(host: Box<dyn BitmapAllocator>) -> Self {
        Compositor {
            host,
            bitmap: None,
            width: 0,
            height: 0,
            decoded_frame: None,
            dirty_frame: None,
            snapshot: None,
            indices: vec![],
        }
    }

    pub fn bitmap(&self) -> Option<&dyn Bitmap> {
        self.bitmap.as_deref()
    }

    pub fn decoded_frame(&self) -> Option<usize> {
        self.decoded_frame
    }

    pub fn dirty_frame(&self) -> Option<usize> {
        self.dirty_frame
    }

    /// Decode a frame into the bitmap.
    ///
    /// Frames between the current bitmap contents and the requested frame
    /// are composited first.
    pub fn decode(
        &mut self,
        data: &[u8],
        parser: &mut Parser,
        idx: usize,
    ) -> Result<Decoded> {
        let frame = parser
            .frames()
            .get(idx)
            .ok_or(Error::FrameOutOfRange(idx))?;
        if !frame.display() {
            return Ok(Decoded::NoDisplay);
        }
        self.prepare_bitmap(parser.width(), parser.height())?;
        if self.decoded_frame == Some(idx) && self.dirty_frame.is_none() {
            return Ok(Decoded::Complete);
        }
        let start = match (self.dirty_frame, self.decoded_frame) {
            (Some(dirty), _) if dirty == idx => idx,
            (Some(dirty), _) if dirty < idx => {
                // redraw with the data that has arrived since
                self.catch_up(data, parser, dirty);
                dirty + 1
            }
            (None, Some(top)) if top < idx => top + 1,
            _ => {
                self.clear();
                0
            }
        };
        for i in start..idx {
            self.catch_up(data, parser, i);
        }
        self.composite(data, parser, idx)
    }

    /// Composite a frame below the requested one
    fn catch_up(&mut self, data: &[u8], parser: &mut Parser, idx: usize) {
        if let Err(e) = self.composite(data, parser, idx) {
            warn!("frame {} skipped: {}", idx, e);
        }
    }

    /// Make sure the bitmap matches the canvas size
    fn prepare_bitmap(&mut self, width: u32, height: u32) -> Result<()> {
        if self.bitmap.is_some() && self.width == width && self.height == height
        {
            return Ok(());
        }
        self.release();
        let bitmap = self
            .host
            .create(width, height)
            .ok_or(Error::InsufficientMemory)?;
        let sz = width as usize * height as usize * 4;
        if bitmap.buffer().len() < sz {
            let len = bitmap.buffer().len();
            warn!("bitmap buffer too small: {} < {}", len, sz);
            self.host.destroy(bitmap);
            return Err(Error::InsufficientMemory);
        }
        debug!("bitmap: {}x{}", width, height);
        self.bitmap = Some(bitmap);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Clear the bitmap to transparent
    fn clear(&mut self) {
        if let Some(bitmap) = self.bitmap.as_mut() {
            bitmap.buffer_mut().fill(0);
        }
        self.decoded_frame = None;
        self.dirty_frame = None;
        self.snapshot = None;
    }

    /// Give the bitmap back to the host
    fn release(&mut self) {
        if let Some(bitmap) = self.bitmap.take() {
            self.host.destroy(bitmap);
        }
        self.decoded_frame = None;
        self.dirty_frame = None;
        self.snapshot = None;
    }

    /// Release all resources
    pub fn finalise(&mut self) {
        self.release();
        self.indices = vec![];
    }

    /// Decompress color indices for a frame
    fn decompress(&mut self, data: &[u8], frame: &Frame) -> Result<()> {
        let image_sz = frame.image_desc().image_sz();
        self.indices.clear();
        self.indices
            .try_reserve(image_sz)
            .map_err(|_| Error::InsufficientMemory)?;
        let offset = frame.data_offset();
        let min_code_bits = *data.get(offset).ok_or(Error::InsufficientData)?;
        let mut reader = CodeReader::new(&data[offset + 1..]);
        let mut decompressor = Decompressor::new(min_code_bits)?;
        let res =
            decompressor.decompress(&mut reader, &mut self.indices, image_sz);
        debug!(
            "decompressed {} pixels from {} bytes",
            self.indices.len(),
            reader.consumed()
        );
        res
    }

    /// Composite one frame over the bitmap contents
    fn composite(
        &mut self,
        data: &[u8],
        parser: &mut Parser,
        idx: usize,
    ) -> Result<Decoded> {
        let frame = parser.frames()[idx].clone();
        if !frame.display() {
            return Ok(Decoded::NoDisplay);
        }
        let redecode = self.dirty_frame == Some(idx);
        let global = parser.global_color_table();
        let table = match frame.local_color_table {
            Some(offset) => {
                let sz = frame.image_desc().color_table_config().size_bytes();
                let buf = data
                    .get(offset..offset + sz)
                    .ok_or(Error::InsufficientData)?;
                Cow::Owned(ColorTable::from_buf(buf))
            }
            None => Cow::Borrowed(global.ok_or(Error::MissingColorTable)?),
        };
        let status = match self.decompress(data, &frame) {
            Ok(()) => None,
            Err(e @ (Error::InsufficientFrameData | Error::InvalidLzwData)) => {
                Some(e)
            }
            Err(e) => return Err(e),
        };
        let (width, height) = (self.width, self.height);
        let Some(bitmap) = self.bitmap.as_mut() else {
            return Err(Error::InsufficientMemory);
        };
        let mut changed = Bounds::default();
        if idx > 0 && !redecode {
            let prior = &parser.frames()[idx - 1];
            let rect = prior.bounds().clip(width, height);
            match prior.disposal_method() {
                DisposalMethod::Background => {
                    let rgba = match global {
                        Some(g) if prior.transparent_color().is_none() => {
                            g.rgba(parser.background_color_idx())
                        }
                        _ => [0; 4],
                    };
                    let buf = bitmap.buffer_mut();
                    fill_rect(buf, width, rect, rgba, &mut changed);
                }
                DisposalMethod::Previous => match self.snapshot.take() {
                    Some((n, snapshot)) if n + 1 == idx => restore_rect(
                        bitmap.buffer_mut(),
                        &snapshot,
                        width,
                        rect,
                        &mut changed,
                    ),
                    _ => debug!("frame {}: nothing to restore", idx - 1),
                },
                _ => (),
            }
        }
        let covers = frame.bounds() == Rect::new(0, 0, width, height);
        let opaque_below = covers || bitmap.test_opaque();
        if frame.disposal_method() == DisposalMethod::Previous && !redecode {
            let buf = bitmap.buffer();
            let mut snapshot = Vec::new();
            snapshot
                .try_reserve_exact(buf.len())
                .map_err(|_| Error::InsufficientMemory)?;
            snapshot.extend_from_slice(buf);
            self.snapshot = Some((idx, snapshot));
        }
        let skipped = draw_indices(
            bitmap.buffer_mut(),
            width,
            &frame,
            &table,
            &self.indices,
            &mut changed,
        );
        let fully = status.is_none()
            && self.indices.len() == frame.image_desc().image_sz();
        let opaque = fully && !skipped && opaque_below;
        let redraw = if idx == 0 || frame.redraw_required() {
            frame.bounds()
        } else {
            changed.rect()
        };
        bitmap.set_opaque(opaque);
        bitmap.modified();
        let f = &mut parser.frames_mut()[idx];
        f.virgin = false;
        f.opaque = opaque;
        f.redraw = redraw;
        match status {
            None => {
                debug!("frame {}: decoded, redraw {:?}", idx, redraw);
                self.decoded_frame = Some(idx);
                self.dirty_frame = None;
                Ok(Decoded::Complete)
            }
            Some(Error::InsufficientFrameData) => {
                warn!(
                    "frame {}: partial, {} of {} pixels",
                    idx,
                    self.indices.len(),
                    frame.image_desc().image_sz()
                );
                self.dirty_frame = Some(idx);
                Ok(Decoded::Partial)
            }
            Some(e) => {
                warn!("frame {}: {}", idx, e);
                self.dirty_frame = Some(idx);
                Err(e)
            }
        }
    }
}
