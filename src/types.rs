//! Data types shared by the imaging core, the async facade and the CLI.
//!
//! None of these outlive a single call: a [`SourceImage`] is borrowed for the
//! duration of a conversion, and the [`CompressedOutput`] it produces is handed
//! to the caller with no reference kept behind.

use bytes::Bytes;
use image::ImageFormat;
use serde::Serialize;
use std::path::Path;

/// Natural or computed pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The numerically larger of width and height.
    pub fn longer_side(self) -> u32 {
        self.width.max(self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raw bytes of an input image plus its implied MIME type.
///
/// Cloning is cheap: the bytes are reference counted, so a source can be
/// moved onto a blocking worker without copying the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Bytes,
    mime_type: Option<&'static str>,
}

impl SourceImage {
    /// Wrap raw bytes, sniffing the MIME type from the magic number.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let mime_type = image::guess_format(&bytes)
            .ok()
            .map(|fmt| fmt.to_mime_type());
        Self { bytes, mime_type }
    }

    /// Like [`from_bytes`](Self::from_bytes), falling back to the file
    /// extension of `path` when the content cannot be sniffed.
    pub fn from_bytes_with_path(bytes: impl Into<Bytes>, path: &Path) -> Self {
        let mut source = Self::from_bytes(bytes);
        if source.mime_type.is_none() {
            source.mime_type = ImageFormat::from_path(path)
                .ok()
                .map(|fmt| fmt.to_mime_type());
        }
        source
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// MIME type implied by the content (or the file name), if recognised.
    pub fn mime_type(&self) -> Option<&'static str> {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// JPEG-encoded result of a compression. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedOutput {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    /// Upright size of the source before scaling.
    pub original: Dimensions,
}

impl CompressedOutput {
    pub const MIME_TYPE: &'static str = "image/jpeg";

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    #[test]
    fn longer_side_picks_max() {
        assert_eq!(Dimensions::new(4000, 3000).longer_side(), 4000);
        assert_eq!(Dimensions::new(600, 800).longer_side(), 800);
    }

    #[test]
    fn zero_side_is_empty() {
        assert!(Dimensions::new(0, 10).is_empty());
        assert!(Dimensions::new(10, 0).is_empty());
        assert!(!Dimensions::new(1, 1).is_empty());
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(1920, 1440).to_string(), "1920x1440");
    }

    #[test]
    fn mime_sniffed_from_content() {
        assert_eq!(
            SourceImage::from_bytes(jpeg_bytes(8, 8)).mime_type(),
            Some("image/jpeg")
        );
        assert_eq!(
            SourceImage::from_bytes(png_bytes(8, 8)).mime_type(),
            Some("image/png")
        );
    }

    #[test]
    fn unknown_content_has_no_mime() {
        let source = SourceImage::from_bytes(b"definitely not an image".to_vec());
        assert_eq!(source.mime_type(), None);
    }

    #[test]
    fn mime_falls_back_to_extension() {
        let source =
            SourceImage::from_bytes_with_path(b"garbage".to_vec(), Path::new("/tmp/cat.webp"));
        assert_eq!(source.mime_type(), Some("image/webp"));
    }

    #[test]
    fn content_wins_over_extension() {
        let source = SourceImage::from_bytes_with_path(png_bytes(4, 4), Path::new("/tmp/x.jpg"));
        assert_eq!(source.mime_type(), Some("image/png"));
    }
}
