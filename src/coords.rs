//! Per-pixel coordinate features fed into the network.
//!
//! Each pixel becomes one input row `(row, col, radius)`. Row and column
//! are centered on the canvas and scaled by half the shorter side, so the
//! largest inscribed circle spans `[-1, 1]`. The radius is taken from the
//! already centered coordinates.

use crate::error::{GenerationError, Result};
use ndarray::{Array2, ArrayView2};

/// Number of features per pixel.
pub const FEATURES: usize = 3;

/// Immutable `(width * height, 3)` feature matrix in row-major raster order.
///
/// Depends only on the resolution, so one tensor can serve any number of
/// runs at that resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTensor {
    width: u32,
    height: u32,
    features: Array2<f64>,
}

impl CoordinateTensor {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GenerationError::InvalidResolution { width, height });
        }

        let w = width as usize;
        let h = height as usize;
        let half_w = w as f64 / 2.0;
        let half_h = h as f64 / 2.0;
        let scale = w.min(h) as f64 / 2.0;

        let features = Array2::from_shape_fn((w * h, FEATURES), |(pixel, feature)| {
            let row = ((pixel / w) as f64 - half_h) / scale;
            let col = ((pixel % w) as f64 - half_w) / scale;
            match feature {
                0 => row,
                1 => col,
                _ => (row * row + col * col).sqrt(),
            }
        });

        Ok(Self {
            width,
            height,
            features,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.features.nrows()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_pixels_by_three() {
        let coords = CoordinateTensor::new(5, 3).unwrap();
        assert_eq!(coords.features().dim(), (15, 3));
        assert_eq!(coords.pixel_count(), 15);
    }

    #[test]
    fn test_square_canvas_values() {
        // 4x4: scale = 2, centre at 2.
        let coords = CoordinateTensor::new(4, 4).unwrap();
        let f = coords.features();

        // Top-left pixel.
        assert_eq!(f[[0, 0]], -1.0);
        assert_eq!(f[[0, 1]], -1.0);
        assert!((f[[0, 2]] - 2.0f64.sqrt()).abs() < 1e-12);

        // Pixel (row 2, col 2) sits on the centre.
        let centre = 2 * 4 + 2;
        assert_eq!(f[[centre, 0]], 0.0);
        assert_eq!(f[[centre, 1]], 0.0);
        assert_eq!(f[[centre, 2]], 0.0);

        // Pixel (row 1, col 3).
        let p = 4 + 3;
        assert_eq!(f[[p, 0]], -0.5);
        assert_eq!(f[[p, 1]], 0.5);
    }

    #[test]
    fn test_rectangular_canvas_scales_by_shorter_side() {
        // 6 wide, 2 high: scale = 1.
        let coords = CoordinateTensor::new(6, 2).unwrap();
        let f = coords.features();

        // Row-major: pixel 5 is row 0, col 5.
        assert_eq!(f[[5, 0]], -1.0);
        assert_eq!(f[[5, 1]], 2.0);
        // Pixel 6 starts row 1.
        assert_eq!(f[[6, 0]], 0.0);
        assert_eq!(f[[6, 1]], -3.0);
        assert_eq!(f[[6, 2]], 3.0);
    }

    #[test]
    fn test_same_resolution_same_tensor() {
        let a = CoordinateTensor::new(7, 9).unwrap();
        let b = CoordinateTensor::new(7, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let err = CoordinateTensor::new(0, 10).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidResolution {
                width: 0,
                height: 10
            }
        ));
    }
}
