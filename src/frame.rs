// frame.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Frame directory records
use crate::block::{DisposalMethod, GraphicControl, ImageDesc};

/// Default delay between frames, in centiseconds
const DEFAULT_DELAY_CS: u16 = 100;

/// Rectangle on the canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if the rectangle is empty
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get the right edge (exclusive)
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Get the bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Clip to a canvas size
    pub fn clip(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Bounding box accumulator for changed pixels
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Bounds {
    extent: Option<(u32, u32, u32, u32)>,
}

impl Bounds {
    /// Extend to include a pixel
    pub fn include(&mut self, x: u32, y: u32) {
        self.extent = Some(match self.extent {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => {
                (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
            }
        });
    }

    /// Get bounding rectangle
    pub fn rect(&self) -> Rect {
        match self.extent {
            None => Rect::default(),
            Some((x0, y0, x1, y1)) => {
                Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
            }
        }
    }
}

/// One frame in the animation directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Offset of compressed data (LZW minimum code size)
    pub(crate) data_offset: usize,
    /// Image descriptor
    pub(crate) image_desc: ImageDesc,
    /// Offset of local color table
    pub(crate) local_color_table: Option<usize>,
    /// Delay before next frame, in centiseconds
    pub(crate) delay_time_cs: u16,
    /// Frame should be displayed
    pub(crate) display: bool,
    /// Frame has never been decoded
    pub(crate) virgin: bool,
    /// Frame is totally opaque
    pub(crate) opaque: bool,
    /// Full redraw required
    pub(crate) redraw_required: bool,
    /// Disposal method
    pub(crate) disposal_method: DisposalMethod,
    /// Transparent color index
    pub(crate) transparent_color: Option<u8>,
    /// Redraw rectangle
    pub(crate) redraw: Rect,
    /// All compressed data is present
    pub(crate) complete: bool,
}

impl Frame {
    /// Create a frame from an image descriptor
    pub(crate) fn new(
        graphic_control_ext: Option<GraphicControl>,
        image_desc: ImageDesc,
    ) -> Self {
        let disposal_method = graphic_control_ext
            .map(|gc| gc.disposal_method())
            .unwrap_or_default();
        let redraw_required = matches!(
            disposal_method,
            DisposalMethod::Background | DisposalMethod::Previous
        );
        Frame {
            data_offset: 0,
            image_desc,
            local_color_table: None,
            delay_time_cs: graphic_control_ext
                .map_or(DEFAULT_DELAY_CS, |gc| gc.delay_time_cs()),
            display: false,
            virgin: true,
            opaque: false,
            redraw_required,
            disposal_method,
            transparent_color: graphic_control_ext
                .and_then(|gc| gc.transparent_color()),
            redraw: image_desc.into(),
            complete: false,
        }
    }

    /// Get the offset of compressed data within the input
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Get the image descriptor
    pub fn image_desc(&self) -> &ImageDesc {
        &self.image_desc
    }

    /// Get the frame bounds
    pub fn bounds(&self) -> Rect {
        self.image_desc.into()
    }

    /// Check if a local color table is present
    pub fn has_local_color_table(&self) -> bool {
        self.local_color_table.is_some()
    }

    /// Get the delay before the next frame, in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Check whether the frame should be displayed
    pub fn display(&self) -> bool {
        self.display
    }

    /// Check whether the frame has never been decoded
    pub fn virgin(&self) -> bool {
        self.virgin
    }

    /// Check whether the frame was drawn totally opaque
    pub fn opaque(&self) -> bool {
        self.opaque
    }

    /// Check whether a full redraw is required
    pub fn redraw_required(&self) -> bool {
        self.redraw_required
    }

    pub fn disposal_method(&self) -> DisposalMethod {
        self.disposal_method
    }

    pub fn transparent_color(&self) -> Option<u8> {
        self.transparent_color
    }

    /// Get the redraw rectangle (area changed from the previous frame)
    pub fn redraw(&self) -> Rect {
        self.redraw
    }

    /// Check whether all compressed data for the frame is present
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

impl From<ImageDesc> for Rect {
    fn from(d: ImageDesc) -> Self {
        Rect::new(
            d.left().into(),
            d.top().into(),
            d.width().into(),
            d.height().into(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clip() {
        let r = Rect::new(2, 3, 10, 10).clip(8, 20);
        assert_eq!(r, Rect::new(2, 3, 6, 10));
        let r = Rect::new(9, 3, 10, 10).clip(8, 20);
        assert!(r.is_empty());
    }

    #[test]
    fn bounds() {
        let mut b = Bounds::default();
        assert!(b.rect().is_empty());
        b.include(4, 2);
        assert_eq!(b.rect(), Rect::new(4, 2, 1, 1));
        b.include(1, 5);
        assert_eq!(b.rect(), Rect::new(1, 2, 4, 4));
    }

    #[test]
    fn defaults() {
        let f = Frame::new(None, ImageDesc::default());
        assert_eq!(f.delay_time_cs(), 100);
        assert_eq!(f.disposal_method(), DisposalMethod::NoAction);
        assert!(!f.redraw_required());
        assert!(f.virgin());
        assert!(!f.display());
    }
}
