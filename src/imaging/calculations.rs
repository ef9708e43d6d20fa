//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Dimensions;

/// Calculate the size an image is re-encoded at before upload.
///
/// Images whose sides both fit within `max_dimension` keep their natural
/// size; nothing is ever upscaled. Otherwise the longer side becomes
/// `max_dimension` and the shorter side is scaled proportionally,
/// `round(shorter * max_dimension / longer)`. A square image constrains on
/// width, which gives the same result as constraining on height.
///
/// The shorter side can round to zero for extreme aspect ratios; callers
/// treat a zero-area target as unencodable.
///
/// # Examples
/// ```
/// # use downscale::imaging::calculate_target_dimensions;
/// # use downscale::Dimensions;
/// let target = calculate_target_dimensions(Dimensions::new(4000, 3000), 1920);
/// assert_eq!(target, Dimensions::new(1920, 1440));
///
/// // Already small enough: unchanged
/// let target = calculate_target_dimensions(Dimensions::new(800, 600), 1920);
/// assert_eq!(target, Dimensions::new(800, 600));
/// ```
pub fn calculate_target_dimensions(natural: Dimensions, max_dimension: u32) -> Dimensions {
    let Dimensions { width, height } = natural;

    if width <= max_dimension && height <= max_dimension {
        return natural;
    }

    if width >= height {
        // Landscape or square: width is the constrained axis
        let h = scale_side(height, max_dimension, width);
        Dimensions::new(max_dimension, h)
    } else {
        // Portrait
        let w = scale_side(width, max_dimension, height);
        Dimensions::new(w, max_dimension)
    }
}

fn scale_side(shorter: u32, max_dimension: u32, longer: u32) -> u32 {
    (shorter as f64 * max_dimension as f64 / longer as f64).round() as u32
}

/// Whether `natural` has to be resampled to fit within `max_dimension`.
pub fn needs_downscale(natural: Dimensions, max_dimension: u32) -> bool {
    natural.longer_side() > max_dimension
}
