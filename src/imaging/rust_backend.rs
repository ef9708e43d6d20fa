//! Pure Rust raster codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `ImageReader::with_guessed_format` |
//! | Identify | `ImageDecoder::dimensions` + `ImageDecoder::orientation` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF) | `DynamicImage::from_decoder` |
//! | EXIF orientation | `DynamicImage::apply_orientation` |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Sizes are reported and produced in display orientation: an EXIF
//! Orientation tag is applied on decode, as a browser does when drawing the
//! image, and the re-encoded JPEG carries no EXIF.
//!
//! Every buffer created during a call is a local value, so it is dropped on
//! the success path and on every early return alike.

use super::backend::{DownscaleError, ImageBackend};
use super::params::ResizeParams;
use crate::types::{CompressedOutput, Dimensions, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, RgbImage,
};
use std::io::Cursor;

/// Extensions whose decoders are compiled in.
const DECODABLE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff",
];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    DECODABLE_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &SourceImage) -> Result<ImageReader<Cursor<&[u8]>>, DownscaleError> {
    ImageReader::new(Cursor::new(source.bytes().as_ref()))
        .with_guessed_format()
        .map_err(|e| DownscaleError::Decode(format!("Failed to read image data: {e}")))
}

fn decoder(source: &SourceImage) -> Result<impl ImageDecoder + '_, DownscaleError> {
    reader(source)?
        .into_decoder()
        .map_err(|e| DownscaleError::Decode(e.to_string()))
}

/// EXIF orientation of the image. Formats without EXIF, or with an
/// unreadable tag, are treated as upright.
fn orientation(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

/// Orientations 5-8 turn the stored raster by a quarter turn.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode the full raster, upright.
fn load_image(source: &SourceImage) -> Result<DynamicImage, DownscaleError> {
    let mut decoder = decoder(source)?;
    let orientation = orientation(&mut decoder);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| DownscaleError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Drop the alpha channel by compositing onto black, as a canvas does when
/// exporting to a format without transparency.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode an RGB raster as JPEG at the given `1..=100` quality.
fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, DownscaleError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| DownscaleError::Encode(format!("JPEG encode failed: {e}")))?;

    if bytes.is_empty() {
        return Err(DownscaleError::Encode(
            "JPEG encoder produced no output".into(),
        ));
    }
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, DownscaleError> {
        let mut decoder = decoder(source)?;
        let (width, height) = decoder.dimensions();
        if swaps_axes(orientation(&mut decoder)) {
            Ok(Dimensions::new(height, width))
        } else {
            Ok(Dimensions::new(width, height))
        }
    }

    fn resize(&self, params: &ResizeParams) -> Result<CompressedOutput, DownscaleError> {
        let img = load_image(&params.source)?;

        let target = params.target;
        if target.is_empty() {
            return Err(DownscaleError::Encode(format!(
                "target surface {target} has zero area"
            )));
        }

        let natural = Dimensions::new(img.width(), img.height());
        let surface = if natural == target {
            flatten_to_rgb(&img)
        } else {
            flatten_to_rgb(&img.resize_exact(target.width, target.height, FilterType::Lanczos3))
        };
        drop(img);

        let bytes = encode_jpeg(&surface, params.quality.encoder_quality())?;
        Ok(CompressedOutput {
            bytes,
            dimensions: Dimensions::new(surface.width(), surface.height()),
            original: natural,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::test_helpers::{bmp_bytes, jpeg_bytes, oriented_jpeg_bytes, png_bytes, rgba_png_bytes};

    fn resize(source: Vec<u8>, w: u32, h: u32, quality: f32) -> Result<CompressedOutput, DownscaleError> {
        let source = SourceImage::from_bytes(source);
        let natural = RustBackend::new().identify(&source).unwrap_or(Dimensions::new(0, 0));
        RustBackend::new().resize(&ResizeParams {
            source,
            natural,
            target: Dimensions::new(w, h),
            quality: Quality::new(quality),
        })
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn supported_extensions_cover_upload_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "gif", "webp", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend
            .identify(&SourceImage::from_bytes(jpeg_bytes(200, 150)))
            .unwrap();
        assert_eq!(dims, Dimensions::new(200, 150));
    }

    #[test]
    fn identify_synthetic_png_and_bmp() {
        let backend = RustBackend::new();
        let png = backend
            .identify(&SourceImage::from_bytes(png_bytes(31, 17)))
            .unwrap();
        assert_eq!(png, Dimensions::new(31, 17));
        let bmp = backend
            .identify(&SourceImage::from_bytes(bmp_bytes(12, 40)))
            .unwrap();
        assert_eq!(bmp, Dimensions::new(12, 40));
    }

    #[test]
    fn identify_applies_exif_quarter_turn() {
        let backend = RustBackend::new();
        let dims = backend
            .identify(&SourceImage::from_bytes(oriented_jpeg_bytes(400, 300, 6)))
            .unwrap();
        assert_eq!(dims, Dimensions::new(300, 400));
    }

    #[test]
    fn identify_keeps_axes_for_half_turn() {
        let backend = RustBackend::new();
        let dims = backend
            .identify(&SourceImage::from_bytes(oriented_jpeg_bytes(400, 300, 3)))
            .unwrap();
        assert_eq!(dims, Dimensions::new(400, 300));
    }

    #[test]
    fn identify_garbage_is_decode_error() {
        let backend = RustBackend::new();
        let err = backend
            .identify(&SourceImage::from_bytes(b"hello, world".to_vec()))
            .unwrap_err();
        assert!(err.is_decode(), "{err:?}");
    }

    #[test]
    fn identify_empty_is_decode_error() {
        let backend = RustBackend::new();
        let err = backend
            .identify(&SourceImage::from_bytes(Vec::new()))
            .unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn resize_produces_exact_dimensions() {
        let out = resize(jpeg_bytes(400, 300), 200, 150, 0.85).unwrap();
        assert_eq!(out.dimensions, Dimensions::new(200, 150));
        assert_eq!(decoded_dimensions(&out.bytes), (200, 150));
    }

    #[test]
    fn resize_renders_exif_rotated_source_upright() {
        // Stored 400x300, left half white; Orientation 6 turns it clockwise,
        // so the white half ends up on top of a 300x400 display.
        let out = resize(oriented_jpeg_bytes(400, 300, 6), 150, 200, 0.9).unwrap();
        assert_eq!(out.original, Dimensions::new(300, 400));
        assert_eq!(decoded_dimensions(&out.bytes), (150, 200));

        let img = image::load_from_memory(&out.bytes).unwrap().to_luma8();
        assert!(img.get_pixel(75, 30).0[0] > 200, "top should be white");
        assert!(img.get_pixel(75, 170).0[0] < 50, "bottom should be black");
    }

    #[test]
    fn resize_output_is_jpeg() {
        let out = resize(png_bytes(64, 64), 32, 32, 0.8).unwrap();
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn same_size_reencodes_png_as_jpeg() {
        let out = resize(png_bytes(50, 40), 50, 40, 0.8).unwrap();
        assert_eq!(decoded_dimensions(&out.bytes), (50, 40));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn transparent_pixels_flatten_to_black() {
        let out = resize(rgba_png_bytes(16, 16, 0), 16, 16, 1.0).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let px = img.get_pixel(8, 8).0;
        assert!(px.iter().all(|&c| c < 8), "expected near-black, got {px:?}");
    }

    #[test]
    fn opaque_alpha_keeps_colour() {
        let out = resize(rgba_png_bytes(16, 16, 255), 16, 16, 1.0).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let [r, _, _] = img.get_pixel(8, 8).0;
        assert!(r > 200, "expected red channel preserved, got {r}");
    }

    #[test]
    fn zero_area_target_is_encode_error() {
        let err = resize(jpeg_bytes(100, 100), 100, 0, 0.8).unwrap_err();
        assert!(err.is_encode(), "{err:?}");
    }

    #[test]
    fn garbage_resize_is_decode_error() {
        let err = resize(b"not an image at all".to_vec(), 10, 10, 0.8).unwrap_err();
        assert!(err.is_decode(), "{err:?}");
    }

    #[test]
    fn truncated_jpeg_is_decode_error() {
        let mut bytes = jpeg_bytes(64, 64);
        bytes.truncate(40);
        let err = resize(bytes, 32, 32, 0.8).unwrap_err();
        assert!(err.is_decode(), "{err:?}");
    }

    #[test]
    fn higher_quality_not_smaller() {
        let source = png_bytes(256, 256);
        let high = resize(source.clone(), 256, 256, 1.0).unwrap();
        let low = resize(source, 256, 256, 0.1).unwrap();
        assert!(high.len() >= low.len(), "{} < {}", high.len(), low.len());
    }
}
