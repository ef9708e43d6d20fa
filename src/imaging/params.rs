//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the target size) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy JPEG quality as a fraction (default 0.8).
//! - [`CompressOptions`]: Caller-facing knobs: longest allowed side + quality.
//! - [`ResizeParams`]: Everything one re-encode needs: source, exact target size, quality.

use crate::types::{Dimensions, SourceImage};

/// JPEG quality as a fraction in `[0, 1]`.
///
/// The value is stored as given. Mapping to the encoder's integer scale
/// happens in [`encoder_quality`](Self::encoder_quality).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(pub f32);

impl Quality {
    pub const DEFAULT: f32 = 0.8;

    pub fn new(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_in_range(self) -> bool {
        (0.0..=1.0).contains(&self.0)
    }

    /// Quality on the JPEG encoder's `1..=100` scale.
    ///
    /// `round(value * 100)`, clamped to `1..=100`. Values below the range
    /// (including 0.0) encode at 1, values above encode at 100, NaN encodes
    /// at 1.
    pub fn encoder_quality(self) -> u8 {
        let scaled = (self.0 * 100.0).round();
        if scaled.is_nan() {
            return 1;
        }
        scaled.clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Caller-facing settings for one compression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Longest side allowed in the output, in pixels.
    pub max_dimension: u32,
    pub quality: Quality,
}

impl CompressOptions {
    pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

    pub fn new(max_dimension: u32, quality: f32) -> Self {
        Self {
            max_dimension,
            quality: Quality::new(quality),
        }
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            quality: Quality::default(),
        }
    }
}

/// Parameters for a single resample-and-encode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: SourceImage,
    /// Upright size of the source, as identified.
    pub natural: Dimensions,
    /// Exact output size.
    pub target: Dimensions,
    pub quality: Quality,
}
