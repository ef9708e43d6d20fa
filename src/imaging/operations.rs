//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take options, compute parameters, and call the backend.

use super::backend::{DownscaleError, ImageBackend};
use super::calculations::calculate_target_dimensions;
use super::params::{CompressOptions, ResizeParams};
use crate::types::{CompressedOutput, Dimensions, SourceImage};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, DownscaleError>;

/// Get the natural image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &SourceImage) -> Result<Dimensions> {
    backend.identify(source)
}

/// Plan a compression without executing it.
///
/// `natural` is the source's natural size as reported by the backend.
pub fn plan_compress(
    source: &SourceImage,
    natural: Dimensions,
    options: &CompressOptions,
) -> Result<ResizeParams> {
    if options.max_dimension == 0 {
        return Err(DownscaleError::Encode(
            "max dimension must be greater than zero".into(),
        ));
    }

    Ok(ResizeParams {
        source: source.clone(),
        natural,
        target: calculate_target_dimensions(natural, options.max_dimension),
        quality: options.quality,
    })
}

/// Downscale `source` to fit within `options.max_dimension` and re-encode it
/// as JPEG.
///
/// The header is probed first; the full decode only happens once the target
/// size is known. A failure at any step ends the call with no output.
pub fn compress(
    backend: &impl ImageBackend,
    source: &SourceImage,
    options: &CompressOptions,
) -> Result<CompressedOutput> {
    let natural = backend.identify(source)?;
    let params = plan_compress(source, natural, options)?;
    let output = backend.resize(&params)?;

    if output.is_empty() {
        return Err(DownscaleError::Encode(
            "encoder returned an empty result".into(),
        ));
    }
    Ok(output)
}
