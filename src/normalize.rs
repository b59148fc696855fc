//! Mapping raw network output to 8-bit image intensities.

use ndarray::{Array2, Array3, ArrayView3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How raw activations are mapped into `[0, 255]`.
///
/// The two policies are not interchangeable. `Signed` suits activations
/// centred on zero (tanh, sin); `Unsigned` suits activations that already
/// land in `[0, 1]` (sigmoid, softmax, sech, gaussian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationPolicy {
    /// `255 * (1 + x) / 2`, for values roughly in `[-1, 1]`.
    #[default]
    Signed,
    /// `255 * x`, for values already in `[0, 1]`.
    Unsigned,
}

impl NormalizationPolicy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Signed => "signed",
            Self::Unsigned => "unsigned",
        }
    }

    #[inline]
    fn to_intensity(self, x: f64) -> u8 {
        let unit = match self {
            Self::Signed => (1.0 + x) / 2.0,
            Self::Unsigned => x,
        };
        // Saturating cast; NaN becomes 0.
        (255.0 * unit).clamp(0.0, 255.0) as u8
    }
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NormalizationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signed" => Ok(Self::Signed),
            "unsigned" => Ok(Self::Unsigned),
            other => Err(format!("unknown normalization policy: {other:?}")),
        }
    }
}

/// Final raster: `(height, width, channels)` intensities, channels 1 or 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputImage {
    pixels: Array3<u8>,
}

impl OutputImage {
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Interleaved row-major bytes, as image encoders expect them.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }
}

/// Reshape `(height * width, channels)` raw output into raster order and
/// convert to intensities under `policy`.
///
/// `raw` must hold exactly `width * height` rows; the generator guarantees
/// this by building both from the same resolution.
pub fn normalize(
    raw: &Array2<f64>,
    width: u32,
    height: u32,
    policy: NormalizationPolicy,
) -> OutputImage {
    let (w, h) = (width as usize, height as usize);
    let channels = raw.ncols();
    debug_assert_eq!(raw.nrows(), w * h);

    let pixels = Array3::from_shape_fn((h, w, channels), |(row, col, channel)| {
        policy.to_intensity(raw[[row * w + col, channel]])
    });

    OutputImage { pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_signed_policy_endpoints() {
        let raw = array![[-1.0], [0.0], [1.0], [5.0]];
        let image = normalize(&raw, 4, 1, NormalizationPolicy::Signed);
        assert_eq!(image.as_bytes(), vec![0, 127, 255, 255]);
    }

    #[test]
    fn test_unsigned_policy_endpoints() {
        let raw = array![[-0.5], [0.0], [0.5], [1.0]];
        let image = normalize(&raw, 2, 2, NormalizationPolicy::Unsigned);
        assert_eq!(image.as_bytes(), vec![0, 0, 127, 255]);
    }

    #[test]
    fn test_nan_maps_to_zero() {
        let raw = array![[f64::NAN]];
        let image = normalize(&raw, 1, 1, NormalizationPolicy::Signed);
        assert_eq!(image.as_bytes(), vec![0]);
    }

    #[test]
    fn test_reshape_is_row_major() {
        // 3 wide, 2 high, 3 channels. Pixel p has channel values p/10.
        let raw = Array2::from_shape_fn((6, 3), |(p, _)| p as f64 / 10.0);
        let image = normalize(&raw, 3, 2, NormalizationPolicy::Unsigned);

        assert_eq!((image.height(), image.width(), image.channels()), (2, 3, 3));
        let pixels = image.pixels();
        // Row 1, col 2 is pixel 5.
        assert_eq!(pixels[[1, 2, 0]], (255.0 * 0.5) as u8);
        assert_eq!(pixels[[0, 1, 2]], (255.0 * 0.1) as u8);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("signed".parse::<NormalizationPolicy>(), Ok(NormalizationPolicy::Signed));
        assert_eq!("unsigned".parse::<NormalizationPolicy>(), Ok(NormalizationPolicy::Unsigned));
        assert!("clamp".parse::<NormalizationPolicy>().is_err());
        assert_eq!(NormalizationPolicy::default(), NormalizationPolicy::Signed);
    }
}
