// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF block layouts
use crate::error::{Error, Result};

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

/// Number of entries in an expanded color table
const TABLE_ENTRIES: usize = 256;

/// Color table configuration, from a screen or image descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    present: bool,
    table_len: usize, // must be between 2...256
}

impl Default for ColorTableConfig {
    fn default() -> Self {
        ColorTableConfig {
            present: false,
            table_len: 2,
        }
    }
}

impl ColorTableConfig {
    /// Make a config from descriptor flag bits
    fn from_flags(present: bool, size_bits: u8) -> Self {
        let table_len = 2 << (size_bits & 0b0111);
        ColorTableConfig { present, table_len }
    }

    /// Get the number of entries (zero if absent)
    pub fn len(&self) -> usize {
        if self.present {
            self.table_len
        } else {
            0
        }
    }

    /// Check if there is no table
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of the table in bytes
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Frame disposal method
///
/// Determines what happens to a frame's area before the next frame is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Leave the frame in place
    Keep,
    /// Restore the frame area to the background color
    Background,
    /// Restore the frame area to what it was before the frame was drawn
    Previous,
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            // 4 is used by some old encoders for "previous"
            3 | 4 => Previous,
            r => {
                warn!("reserved disposal method: {}", r);
                NoAction
            }
        }
    }
}

/// Block codes (signature bytes and fixed sizes)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }

    /// Fixed size of block (including signature byte)
    pub fn size(&self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            ImageDesc_ => 10,
            Trailer_ => 1,
            Extension_ => 2, // +sub-blocks
        }
    }
}

/// Extension labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Header block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Header {
    /// Decode a Header block from a buffer
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len(), BlockCode::Header_.size());
        if &buf[..3] == b"GIF" {
            let version = [buf[3], buf[4], buf[5]];
            match &version {
                b"87a" | b"89a" => Ok(Header { version }),
                _ => Err(Error::UnsupportedVersion(version)),
            }
        } else {
            Err(Error::MalformedHeader)
        }
    }

    /// Get the version (`87a` or `89a`)
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical Screen Descriptor block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Decode a Logical Screen Descriptor block from a buffer
    pub(crate) fn from_buf(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), BlockCode::LogicalScreenDesc_.size());
        LogicalScreenDesc {
            screen_width: u16::from_le_bytes([buf[0], buf[1]]),
            screen_height: u16::from_le_bytes([buf[2], buf[3]]),
            flags: buf[4],
            background_color_idx: buf[5],
            pixel_aspect_ratio: buf[6],
        }
    }

    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    pub fn color_resolution(&self) -> u16 {
        2 << ((self.flags & Self::COLOR_RESOLUTION) >> 4)
    }

    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.flags & Self::COLOR_TABLE_PRESENT != 0,
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }

    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }

    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Graphic Control extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    /// Parse a Graphic Control extension sub-block
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self> {
        if buf.len() == 4 {
            Ok(GraphicControl {
                flags: buf[0],
                delay_time_cs: u16::from_le_bytes([buf[1], buf[2]]),
                transparent_color_idx: buf[3],
            })
        } else {
            Err(Error::MalformedGraphicControlExtension)
        }
    }

    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }

    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }

    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    pub fn transparent_color(&self) -> Option<u8> {
        if (self.flags & Self::TRANSPARENT_COLOR) != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
}

/// Application extension
pub(crate) struct Application;

impl Application {
    fn is_looping(app_id: &[u8]) -> bool {
        app_id == b"NETSCAPE2.0" || app_id == b"ANIMEXTS1.0"
    }

    /// Get loop count from an application ID and its first data sub-block
    pub fn loop_count(app_id: &[u8], data: &[u8]) -> Option<u16> {
        let exists = Self::is_looping(app_id) && // app ID / auth code
                     data.len() == 3 &&         // app data sub-block length
                     data[0] == 1; // sub-block ID
        if exists {
            // Number of times to loop animation (zero means loop forever)
            Some(u16::from_le_bytes([data[1], data[2]]))
        } else {
            None
        }
    }
}

/// Image Descriptor block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Decode an Image Descriptor block from a buffer
    pub(crate) fn from_buf(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), BlockCode::ImageDesc_.size());
        ImageDesc {
            left: u16::from_le_bytes([buf[1], buf[2]]),
            top: u16::from_le_bytes([buf[3], buf[4]]),
            width: u16::from_le_bytes([buf[5], buf[6]]),
            height: u16::from_le_bytes([buf[7], buf[8]]),
            flags: buf[9],
        }
    }

    pub fn left(&self) -> u16 {
        self.left
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Get the right edge (exclusive)
    pub fn right(&self) -> u32 {
        u32::from(self.left) + u32::from(self.width)
    }

    /// Get the bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        u32::from(self.top) + u32::from(self.height)
    }

    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }

    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.flags & Self::COLOR_TABLE_PRESENT != 0,
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }

    /// Get the number of pixels in the image
    pub fn image_sz(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Color table expanded to 256 RGBA entries
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ColorTable {
    colors: Vec<[u8; 4]>,
    entries: usize,
}

impl ColorTable {
    /// Decode a color table from RGB triples.
    ///
    /// Entries past the end of the table are opaque black.
    pub fn from_buf(buf: &[u8]) -> Self {
        let mut colors = Vec::with_capacity(TABLE_ENTRIES);
        for rgb in buf.chunks_exact(CHANNELS).take(TABLE_ENTRIES) {
            colors.push([rgb[0], rgb[1], rgb[2], 0xFF]);
        }
        let entries = colors.len();
        colors.resize(TABLE_ENTRIES, [0, 0, 0, 0xFF]);
        ColorTable { colors, entries }
    }

    /// Get the number of entries declared in the stream
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Get the RGBA value of an entry
    pub fn rgba(&self, idx: u8) -> [u8; 4] {
        self.colors[usize::from(idx)]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_len() {
        let t = ColorTableConfig::from_flags(true, 0);
        assert_eq!(t.len(), 2);
        assert_eq!(t.size_bytes(), 6);
        let t = ColorTableConfig::from_flags(true, 7);
        assert_eq!(t.len(), 256);
        assert_eq!(t.size_bytes(), 768);
        let t = ColorTableConfig::from_flags(false, 7);
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        let t = ColorTableConfig::default();
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn header() {
        assert_eq!(Header::from_buf(b"GIF89a").unwrap().version(), *b"89a");
        assert_eq!(Header::from_buf(b"GIF87a").unwrap().version(), *b"87a");
        assert_eq!(
            Header::from_buf(b"GIF88a"),
            Err(Error::UnsupportedVersion(*b"88a"))
        );
        assert_eq!(Header::from_buf(b"PNG89a"), Err(Error::MalformedHeader));
    }

    #[test]
    fn screen_desc() {
        let buf = [0x0A, 0x01, 0x05, 0x00, 0x91, 3, 0];
        let b = LogicalScreenDesc::from_buf(&buf);
        assert_eq!(b.screen_width(), 266);
        assert_eq!(b.screen_height(), 5);
        assert_eq!(b.color_table_config().len(), 4);
        assert_eq!(b.color_resolution(), 4);
        assert_eq!(b.background_color_idx(), 3);
    }

    #[test]
    fn graphic_control() {
        let gc = GraphicControl::from_buf(&[0b0000_1001, 10, 0, 7]).unwrap();
        assert_eq!(gc.disposal_method(), DisposalMethod::Background);
        assert_eq!(gc.delay_time_cs(), 10);
        assert_eq!(gc.transparent_color(), Some(7));
        assert!(!gc.user_input());
        let gc = GraphicControl::from_buf(&[0b0001_0000, 0, 1, 7]).unwrap();
        assert_eq!(gc.disposal_method(), DisposalMethod::Previous);
        assert_eq!(gc.delay_time_cs(), 256);
        assert_eq!(gc.transparent_color(), None);
        assert_eq!(
            GraphicControl::from_buf(&[0, 0, 0]),
            Err(Error::MalformedGraphicControlExtension)
        );
    }

    #[test]
    fn disposal_quirks() {
        assert_eq!(DisposalMethod::from(1), DisposalMethod::Keep);
        assert_eq!(DisposalMethod::from(4), DisposalMethod::Previous);
        assert_eq!(DisposalMethod::from(6), DisposalMethod::NoAction);
    }

    #[test]
    fn loop_count() {
        let count = Application::loop_count(b"NETSCAPE2.0", &[1, 0, 0]);
        assert_eq!(count, Some(0));
        let count = Application::loop_count(b"ANIMEXTS1.0", &[1, 4, 1]);
        assert_eq!(count, Some(260));
        assert_eq!(Application::loop_count(b"XMP DataXMP", &[1, 4, 0]), None);
        assert_eq!(Application::loop_count(b"NETSCAPE2.0", &[2, 4, 0]), None);
    }

    #[test]
    fn image_desc() {
        let b = ImageDesc::from_buf(&[b',', 1, 0, 2, 0, 3, 0, 4, 0, 0xC1]);
        assert_eq!((b.left(), b.top(), b.width(), b.height()), (1, 2, 3, 4));
        assert_eq!((b.right(), b.bottom()), (4, 6));
        assert!(b.interlaced());
        assert_eq!(b.color_table_config().len(), 4);
        assert_eq!(b.image_sz(), 12);
    }

    #[test]
    fn color_table() {
        let t = ColorTable::from_buf(&[255, 0, 0, 0, 0, 255]);
        assert_eq!(t.rgba(0), [255, 0, 0, 255]);
        assert_eq!(t.rgba(1), [0, 0, 255, 255]);
        assert_eq!(t.rgba(200), [0, 0, 0, 255]);
        assert_eq!(t.entries(), 2);
    }
}
