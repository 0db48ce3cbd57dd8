// raster.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Bitmaps backed by `pix` rasters
use crate::bitmap::{Bitmap, BitmapAllocator};
use pix::rgb::SRgba8;
use pix::Raster;

/// Allocator for [RasterBitmap]s
///
/// [RasterBitmap]: struct.RasterBitmap.html
#[derive(Debug, Default)]
pub struct RasterAllocator {
    /// Maximum bitmap size, in bytes
    max_sz: Option<usize>,
}

/// Bitmap using a `Raster<SRgba8>` for storage
pub struct RasterBitmap {
    /// Pixel storage
    raster: Raster<SRgba8>,
    /// Plot opaque flag
    opaque: bool,
}

impl RasterAllocator {
    /// Limit the size of allocated bitmaps (in bytes).
    pub fn with_max_sz(max_sz: usize) -> Self {
        RasterAllocator {
            max_sz: Some(max_sz),
        }
    }
}

impl BitmapAllocator for RasterAllocator {
    fn create(&mut self, width: u32, height: u32) -> Option<Box<dyn Bitmap>> {
        let sz = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if let Some(max_sz) = self.max_sz {
            if sz > max_sz {
                warn!("bitmap too large: {}x{}", width, height);
                return None;
            }
        }
        debug!("create bitmap: {}x{}", width, height);
        Some(Box::new(RasterBitmap::new(width, height)))
    }
}

impl RasterBitmap {
    /// Create a transparent raster bitmap
    pub fn new(width: u32, height: u32) -> Self {
        RasterBitmap {
            raster: Raster::with_clear(width, height),
            opaque: false,
        }
    }

    /// Get the raster
    pub fn raster(&self) -> &Raster<SRgba8> {
        &self.raster
    }

    /// Check the plot opaque flag
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }
}

impl Bitmap for RasterBitmap {
    fn buffer(&self) -> &[u8] {
        self.raster.as_u8_slice()
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        self.raster.as_u8_slice_mut()
    }

    fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }

    fn test_opaque(&self) -> bool {
        self.buffer().chunks_exact(4).all(|p| p[3] == 0xFF)
    }
}
