// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::bitmap::{Bitmap, BitmapAllocator};
use crate::block::{Header, LogicalScreenDesc};
use crate::composite::{Compositor, Decoded};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::parse::{Parser, Progress};

/// Progressive GIF decoder builder
///
/// Configures limits, then converts into an [Animation].
///
/// ## Example: Decode all frames of a GIF
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// use progif::{Bitmap, Decoded, Decoder, Progress, RasterAllocator};
///
/// let mut anim = Decoder::new(RasterAllocator::default()).into_animation();
/// // ... append bytes to "gif" until the trailer has been parsed
/// assert_eq!(anim.initialise(gif)?, Progress::Complete);
/// for i in 0..anim.frame_count() {
///     if anim.decode_frame(gif, i)? == Decoded::Complete {
///         let bitmap = anim.bitmap().unwrap();
///         // ... work with RGBA pixels in bitmap.buffer()
///         assert_eq!(bitmap.buffer()[..4], [0xFF, 0xFF, 0xFF, 0xFF]);
///     }
/// }
/// # Ok(())
/// # }
/// ```
///
/// [Animation]: struct.Animation.html
pub struct Decoder {
    /// Host bitmap allocator
    allocator: Box<dyn BitmapAllocator>,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
    /// Maximum number of frames
    max_frames: usize,
    /// Treat bogus screen sizes as 1x1
    screen_quirks: bool,
}

/// Animation decoding session
///
/// The GIF data is not owned; each call receives the buffer, which may
/// grow between calls but must keep its previous contents.
pub struct Animation {
    /// Container parser
    parser: Parser,
    /// Frame compositor
    compositor: Compositor,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
    /// Maximum number of frames
    max_frames: usize,
    /// Screen size quirks
    screen_quirks: bool,
    /// Error from the last call
    current_error: Option<Error>,
}

impl Decoder {
    /// Create a new decoder, with bitmaps created by an allocator.
    pub fn new<A: BitmapAllocator + 'static>(allocator: A) -> Self {
        Decoder {
            allocator: Box::new(allocator),
            max_image_sz: Some(1 << 25),
            max_frames: 4096,
            screen_quirks: true,
        }
    }

    /// Set the maximum image size (in bytes) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Set the maximum number of frames to allow.
    pub fn max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Enable or disable screen size quirks.
    ///
    /// When enabled, logical screens which are empty, larger than 2048
    /// pixels, or a common desktop size are treated as 1x1 and grown to
    /// fit the frames.
    pub fn screen_quirks(mut self, screen_quirks: bool) -> Self {
        self.screen_quirks = screen_quirks;
        self
    }

    /// Convert into an animation session.
    pub fn into_animation(self) -> Animation {
        Animation {
            parser: Parser::new(
                self.max_image_sz,
                self.max_frames,
                self.screen_quirks,
            ),
            compositor: Compositor::new(self.allocator),
            max_image_sz: self.max_image_sz,
            max_frames: self.max_frames,
            screen_quirks: self.screen_quirks,
            current_error: None,
        }
    }
}

impl Animation {
    /// Store the error of a call
    fn record<T>(&mut self, res: Result<T>) -> Result<T> {
        self.current_error = res.as_ref().err().cloned();
        res
    }

    /// Parse as much of the GIF data as is available.
    ///
    /// May be called again with more data appended.
    pub fn initialise(&mut self, data: &[u8]) -> Result<Progress> {
        let res = self.parser.parse(data);
        self.record(res)
    }

    /// Decode one frame into the bitmap.
    ///
    /// Frames are best decoded in order; other frames are composited as
    /// needed to reach the requested one.
    pub fn decode_frame(
        &mut self,
        data: &[u8],
        frame: usize,
    ) -> Result<Decoded> {
        let res = self.compositor.decode(data, &mut self.parser, frame);
        self.record(res)
    }

    /// Release the bitmap and forget all parsed frames.
    ///
    /// The session can be reused with `initialise` afterwards.
    pub fn finalise(&mut self) {
        self.compositor.finalise();
        self.parser =
            Parser::new(self.max_image_sz, self.max_frames, self.screen_quirks);
        self.current_error = None;
    }

    /// Get the header block
    pub fn header(&self) -> Option<&Header> {
        self.parser.header()
    }

    /// Get the logical screen descriptor
    pub fn screen_desc(&self) -> Option<&LogicalScreenDesc> {
        self.parser.screen_desc()
    }

    /// Get the canvas width
    pub fn width(&self) -> u32 {
        self.parser.width()
    }

    /// Get the canvas height
    pub fn height(&self) -> u32 {
        self.parser.height()
    }

    /// Get the number of frames with all data present
    pub fn frame_count(&self) -> usize {
        self.parser.frame_count()
    }

    /// Get the number of frames, including one still arriving
    pub fn frame_count_partial(&self) -> usize {
        self.parser.frame_count_partial()
    }

    /// Get all known frames
    pub fn frames(&self) -> &[Frame] {
        self.parser.frames()
    }

    /// Get one frame
    pub fn frame(&self, frame: usize) -> Option<&Frame> {
        self.parser.frames().get(frame)
    }

    /// Get the loop count (0 means forever)
    pub fn loop_count(&self) -> u16 {
        self.parser.loop_count()
    }

    /// Get the background color index of the global color table
    pub fn background_color_idx(&self) -> u8 {
        self.parser.background_color_idx()
    }

    /// Get the last fully decoded frame
    pub fn decoded_frame(&self) -> Option<usize> {
        self.compositor.decoded_frame()
    }

    /// Get the frame which is partially drawn in the bitmap
    pub fn dirty_frame(&self) -> Option<usize> {
        self.compositor.dirty_frame()
    }

    /// Get the output bitmap
    pub fn bitmap(&self) -> Option<&dyn Bitmap> {
        self.compositor.bitmap()
    }

    /// Get the position after the last completely parsed block
    pub fn buffer_position(&self) -> usize {
        self.parser.position()
    }

    /// Get the buffer size from the last `initialise` call
    pub fn buffer_size(&self) -> usize {
        self.parser.buffer_size()
    }

    /// Get the error from the last call, if any
    pub fn current_error(&self) -> Option<&Error> {
        self.current_error.as_ref()
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.compositor.finalise();
    }
}
