// error.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
use std::fmt;

/// Errors encountered while decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Not enough data to parse the GIF structure yet.
    InsufficientData,
    /// Not enough compressed data to complete a frame yet.
    InsufficientFrameData,
    /// Header block malformed or missing.
    MalformedHeader,
    /// GIF version not supported (87a or 89a only).
    UnsupportedVersion([u8; 3]),
    /// Invalid block code (signature).
    InvalidBlockCode,
    /// Graphic control extension has invalid length.
    MalformedGraphicControlExtension,
    /// LZW minimum code size out of range.
    InvalidCodeSize,
    /// Compressed LZW data invalid or corrupt.
    InvalidLzwData,
    /// Missing color table for a frame.
    MissingColorTable,
    /// More frames than allowed by
    /// [max_frames](struct.Decoder.html#method.max_frames).
    TooManyFrames,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
    /// Bitmap or buffer allocation failed.
    InsufficientMemory,
    /// Requested frame has not been found (yet).
    FrameOutOfRange(usize),
}

/// Progif result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if supplying more data could resolve the error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InsufficientData | Error::InsufficientFrameData)
    }

    /// Check if the error is caused by corrupt or inconsistent data.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedHeader
                | Error::UnsupportedVersion(_)
                | Error::InvalidBlockCode
                | Error::MalformedGraphicControlExtension
                | Error::InvalidCodeSize
                | Error::InvalidLzwData
                | Error::MissingColorTable
                | Error::TooManyFrames
                | Error::TooLargeImage
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedVersion(v) => {
                let v = String::from_utf8_lossy(v);
                write!(fmt, "UnsupportedVersion({})", v)
            }
            Error::FrameOutOfRange(n) => write!(fmt, "FrameOutOfRange({})", n),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify() {
        assert!(Error::InsufficientData.is_recoverable());
        assert!(Error::InsufficientFrameData.is_recoverable());
        assert!(!Error::InvalidLzwData.is_recoverable());
        assert!(Error::InvalidLzwData.is_data_error());
        assert!(Error::MissingColorTable.is_data_error());
        assert!(!Error::InsufficientMemory.is_data_error());
        assert!(!Error::FrameOutOfRange(3).is_data_error());
    }

    #[test]
    fn display() {
        let e = Error::UnsupportedVersion(*b"88a");
        assert_eq!(e.to_string(), "UnsupportedVersion(88a)");
        assert_eq!(Error::FrameOutOfRange(7).to_string(), "FrameOutOfRange(7)");
        assert_eq!(Error::InvalidLzwData.to_string(), "InvalidLzwData");
    }
}
