//! Shared test utilities for the downscale test suite.
//!
//! Generates small synthetic images in memory so tests never depend on
//! fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = SourceImage::from_bytes(jpeg_bytes(400, 300));
//! let dims = RustBackend::new().identify(&source).unwrap();
//! assert_eq!((dims.width, dims.height), (400, 300));
//! ```

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// Deterministic gradient, detailed enough that JPEG quality changes the size.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 13) % 256) as u8])
    })
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

// =========================================================================
// Encoded fixtures
// =========================================================================

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Bmp)
}

/// Solid red PNG with the given alpha on every pixel.
pub fn rgba_png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, alpha]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Left half white, right half black.
fn split(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([255, 255, 255])
        } else {
            image::Rgb([0, 0, 0])
        }
    })
}

/// JPEG of [`split`] whose stored raster is `width`x`height`, tagged with
/// the given EXIF Orientation (1-8).
pub fn oriented_jpeg_bytes(width: u32, height: u32, orientation: u8) -> Vec<u8> {
    let jpeg = encode(DynamicImage::ImageRgb8(split(width, height)), ImageFormat::Jpeg);

    // Big-endian TIFF header, one IFD entry: 0x0112 SHORT x1
    let mut app1 = b"Exif\0\0MM\0\x2a\0\0\0\x08\0\x01\x01\x12\0\x03\0\0\0\x01".to_vec();
    app1.extend_from_slice(&[0, orientation, 0, 0, 0, 0, 0, 0]);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}
