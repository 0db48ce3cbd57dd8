// lib.rs      progif crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Progressive, streaming decoder for animated GIF images.
//!
//! GIF data is supplied in a growing buffer.  The container is parsed as far
//! as the available bytes allow, and any frame seen so far can be composited
//! into a host-allocated RGBA bitmap, even if its data is still arriving.
//!
//! See [Decoder] for an example.
//!
//! [Decoder]: struct.Decoder.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod bitmap;
pub mod block;
mod composite;
mod error;
mod frame;
mod lzw;
mod parse;
mod private;
mod raster;
mod reader;
#[cfg(test)]
mod testgif;

pub use crate::bitmap::{Bitmap, BitmapAllocator};
pub use crate::composite::Decoded;
pub use crate::error::{Error, Result};
pub use crate::frame::{Frame, Rect};
pub use crate::parse::Progress;
pub use crate::private::{Animation, Decoder};
pub use crate::raster::{RasterAllocator, RasterBitmap};
