// bitmap.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Host bitmap capabilities

/// Output bitmap, owned by a [BitmapAllocator].
///
/// Pixels are row-major RGBA, 4 bytes per pixel, with no padding between
/// rows.
///
/// [BitmapAllocator]: trait.BitmapAllocator.html
pub trait Bitmap {
    /// Get the pixel buffer.
    fn buffer(&self) -> &[u8];

    /// Get the mutable pixel buffer.
    fn buffer_mut(&mut self) -> &mut [u8];

    /// Set whether the bitmap should be plotted opaque.
    fn set_opaque(&mut self, opaque: bool);

    /// Test whether the bitmap is fully opaque.
    fn test_opaque(&self) -> bool;

    /// Bitmap contents have changed; flush any cached copies.
    fn modified(&mut self) {}
}

/// Allocator for output bitmaps, supplied by the host.
pub trait BitmapAllocator {
    /// Create a bitmap, cleared to transparent.
    ///
    /// Returns `None` if allocation fails.
    fn create(&mut self, width: u32, height: u32) -> Option<Box<dyn Bitmap>>;

    /// Destroy a bitmap.
    fn destroy(&mut self, bitmap: Box<dyn Bitmap>) {
        drop(bitmap);
    }
}
