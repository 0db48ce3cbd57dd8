// parse.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Resumable GIF container parser
use crate::block::{
    Application, BlockCode, ColorTable, ExtensionCode, GraphicControl, Header,
    ImageDesc, LogicalScreenDesc,
};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Largest logical screen accepted before it is treated as bogus
const MAX_SCREEN_DIM: u16 = 2048;

/// Screen sizes commonly written by broken encoders
const QUIRK_SCREENS: [(u16, u16); 5] = [
    (640, 480),
    (800, 600),
    (1024, 768),
    (1280, 1024),
    (1600, 1200),
];

/// Progress of container parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Trailer reached; all frames are known
    Complete,
    /// More data is needed to parse further
    NeedData,
}

/// Result of scanning one frame
enum Scan {
    /// A frame was parsed completely
    Frame,
    /// Trailer block was found
    Trailer,
    /// Ran out of data
    NeedData,
}

/// Container parser state, kept between calls with a growing buffer
#[derive(Debug)]
pub(crate) struct Parser {
    /// Maximum canvas size, in bytes
    max_image_sz: Option<usize>,
    /// Maximum number of frames
    max_frames: usize,
    /// Treat bogus screen sizes as 1x1
    screen_quirks: bool,
    /// Header block
    header: Option<Header>,
    /// Logical screen descriptor
    screen_desc: Option<LogicalScreenDesc>,
    /// Global color table
    global_color_table: Option<ColorTable>,
    /// Canvas width
    width: u32,
    /// Canvas height
    height: u32,
    /// Frame directory
    frames: Vec<Frame>,
    /// Number of frames with all compressed data present
    frame_count: usize,
    /// Loop count (0 means forever)
    loop_count: u16,
    /// Position after the last complete block
    position: usize,
    /// Size of the buffer at the last call
    buffer_size: usize,
    /// Trailer has been reached
    done: bool,
}

impl Parser {
    /// Create a new parser
    pub fn new(
        max_image_sz: Option<usize>,
        max_frames: usize,
        screen_quirks: bool,
    ) -> Self {
        Parser {
            max_image_sz,
            max_frames,
            screen_quirks,
            header: None,
            screen_desc: None,
            global_color_table: None,
            width: 0,
            height: 0,
            frames: vec![],
            frame_count: 0,
            loop_count: 1,
            position: 0,
            buffer_size: 0,
            done: false,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn screen_desc(&self) -> Option<&LogicalScreenDesc> {
        self.screen_desc.as_ref()
    }

    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    pub fn background_color_idx(&self) -> u8 {
        self.screen_desc.map_or(0, |d| d.background_color_idx())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_count_partial(&self) -> usize {
        self.frames.len()
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Parse as far as possible into a buffer.
    ///
    /// The buffer must hold at least the bytes seen by the previous call.
    pub fn parse(&mut self, data: &[u8]) -> Result<Progress> {
        if data.len() < self.position {
            return Err(Error::InsufficientData);
        }
        self.buffer_size = data.len();
        if self.done {
            return Ok(Progress::Complete);
        }
        if self.header.is_none() && !self.parse_preamble(data)? {
            return Ok(Progress::NeedData);
        }
        loop {
            match self.parse_frame(data)? {
                Scan::Frame => (),
                Scan::Trailer => {
                    debug!("trailer: {} frames", self.frame_count);
                    self.done = true;
                    return Ok(Progress::Complete);
                }
                Scan::NeedData => return Ok(Progress::NeedData),
            }
        }
    }

    /// Parse header, logical screen descriptor and global color table
    fn parse_preamble(&mut self, data: &[u8]) -> Result<bool> {
        let header_sz = BlockCode::Header_.size();
        let desc_sz = BlockCode::LogicalScreenDesc_.size();
        if data.len() >= 3 && &data[..3] != b"GIF" {
            return Err(Error::MalformedHeader);
        }
        if data.len() < header_sz + desc_sz {
            return Ok(false);
        }
        let header = Header::from_buf(&data[..header_sz])?;
        let desc = LogicalScreenDesc::from_buf(&data[header_sz..][..desc_sz]);
        let mut pos = header_sz + desc_sz;
        let tbl = desc.color_table_config();
        let global_color_table = if tbl.is_empty() {
            None
        } else {
            let end = pos + tbl.size_bytes();
            if data.len() < end {
                return Ok(false);
            }
            let table = ColorTable::from_buf(&data[pos..end]);
            pos = end;
            Some(table)
        };
        let (width, height) = self.screen_size(&desc);
        self.check_canvas(width, height)?;
        debug!("header: {:?} {:?}", header, desc);
        self.header = Some(header);
        self.screen_desc = Some(desc);
        self.global_color_table = global_color_table;
        self.width = width;
        self.height = height;
        self.position = pos;
        Ok(true)
    }

    /// Get the initial canvas size from a screen descriptor
    fn screen_size(&self, desc: &LogicalScreenDesc) -> (u32, u32) {
        let w = desc.screen_width();
        let h = desc.screen_height();
        if self.screen_quirks
            && (w == 0
                || h == 0
                || w > MAX_SCREEN_DIM
                || h > MAX_SCREEN_DIM
                || QUIRK_SCREENS.contains(&(w, h)))
        {
            debug!("screen size quirk: {}x{}", w, h);
            (1, 1)
        } else {
            (w.into(), h.into())
        }
    }

    /// Check canvas size against the limit
    fn check_canvas(&self, width: u32, height: u32) -> Result<()> {
        if let Some(max_sz) = self.max_image_sz {
            let sz = (width as usize)
                .saturating_mul(height as usize)
                .saturating_mul(4);
            if sz > max_sz {
                return Err(Error::TooLargeImage);
            }
        }
        Ok(())
    }

    /// Widen the canvas to fit a frame
    fn widen(&mut self, image_desc: &ImageDesc) -> Result<()> {
        let width = self.width.max(image_desc.right());
        let height = self.height.max(image_desc.bottom());
        if width != self.width || height != self.height {
            self.check_canvas(width, height)?;
            debug!("canvas: {}x{}", width, height);
            self.width = width;
            self.height = height;
        }
        Ok(())
    }

    /// Parse one frame, with preceding extensions
    fn parse_frame(&mut self, data: &[u8]) -> Result<Scan> {
        let mut pos = self.position;
        let mut graphic_control = None;
        loop {
            let Some(code) = data.get(pos) else {
                return Ok(Scan::NeedData);
            };
            match BlockCode::from_u8(*code) {
                Some(BlockCode::Trailer_) => {
                    self.position = pos + 1;
                    return Ok(Scan::Trailer);
                }
                Some(BlockCode::Extension_) => {
                    let gc = &mut graphic_control;
                    match self.parse_extension(data, pos, gc)? {
                        Some(end) => pos = end,
                        None => return Ok(Scan::NeedData),
                    }
                }
                Some(BlockCode::ImageDesc_) => break,
                _ => {
                    warn!("invalid block code: {:02X} @ {}", code, pos);
                    return Err(Error::InvalidBlockCode);
                }
            }
        }
        let idx = self.frame_count;
        if idx >= self.max_frames {
            return Err(Error::TooManyFrames);
        }
        let desc_sz = BlockCode::ImageDesc_.size();
        if data.len() < pos + desc_sz {
            return Ok(Scan::NeedData);
        }
        let image_desc = ImageDesc::from_buf(&data[pos..pos + desc_sz]);
        self.widen(&image_desc)?;
        pos += desc_sz;
        let mut frame = Frame::new(graphic_control, image_desc);
        let tbl = image_desc.color_table_config();
        if !tbl.is_empty() {
            frame.local_color_table = Some(pos);
            pos += tbl.size_bytes();
        }
        frame.data_offset = pos;
        self.store_frame(idx, frame);
        let Some(min_code_size) = data.get(pos) else {
            return Ok(Scan::NeedData);
        };
        if !(2..=8).contains(min_code_size) {
            warn!("frame {}: invalid code size {}", idx, min_code_size);
            return Err(Error::InvalidCodeSize);
        }
        self.frames[idx].display = image_desc.image_sz() > 0;
        pos = match skip_sub_blocks(data, pos + 1) {
            Some(end) => end,
            None => return Ok(Scan::NeedData),
        };
        self.frames[idx].complete = true;
        self.frame_count = idx + 1;
        self.position = pos;
        debug!("frame {}: {:?}", idx, image_desc);
        Ok(Scan::Frame)
    }

    /// Store a new frame, or update a partially parsed one
    fn store_frame(&mut self, idx: usize, mut frame: Frame) {
        match self.frames.get_mut(idx) {
            Some(f) => {
                frame.virgin = f.virgin;
                frame.opaque = f.opaque;
                frame.redraw = f.redraw;
                *f = frame;
            }
            None => self.frames.push(frame),
        }
    }

    /// Parse an extension block.
    ///
    /// Returns the position after the block, or `None` if data ran out.
    fn parse_extension(
        &mut self,
        data: &[u8],
        pos: usize,
        graphic_control: &mut Option<GraphicControl>,
    ) -> Result<Option<usize>> {
        let Some(label) = data.get(pos + 1) else {
            return Ok(None);
        };
        let label = ExtensionCode::from(*label);
        let mut pos = pos + 2;
        let mut app_id: &[u8] = &[];
        for n in 0.. {
            let Some(size) = data.get(pos) else {
                return Ok(None);
            };
            let end = pos + 1 + usize::from(*size);
            if end > data.len() {
                return Ok(None);
            }
            if *size == 0 {
                return Ok(Some(end));
            }
            let sub_block = &data[pos + 1..end];
            match (label, n) {
                (ExtensionCode::GraphicControl_, 0) => {
                    let gc = GraphicControl::from_buf(sub_block)?;
                    *graphic_control = Some(gc);
                }
                (ExtensionCode::Application_, 0) => app_id = sub_block,
                (ExtensionCode::Application_, 1) => {
                    let count = Application::loop_count(app_id, sub_block);
                    if let Some(c) = count {
                        debug!("loop count: {}", c);
                        self.loop_count = c;
                    }
                }
                _ => (),
            }
            pos = end;
        }
        Ok(Some(pos))
    }
}

/// Skip data sub-blocks through the terminator.
///
/// Returns the position after the terminator, or `None` if data ran out.
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let size = usize::from(*data.get(pos)?);
        pos += 1 + size;
        if pos > data.len() {
            return None;
        }
        if size == 0 {
            return Some(pos);
        }
    }
}
