// src/processing/indices/continuum.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Continuum removal: distance of a band below the straight line between
/// its two neighbours, interpolated at the band's wavelength.
pub struct ContinuumRemoval {
    target_index: usize,
    left_index: usize,
    right_index: usize,
    target_wavelength: f32,
    left_wavelength: f32,
    right_wavelength: f32,
    name: String,
}

impl ContinuumRemoval {
    pub fn new(
        (target_index, target_wavelength): (usize, f32),
        (left_index, left_wavelength): (usize, f32),
        (right_index, right_wavelength): (usize, f32),
        name: Option<String>,
    ) -> Self {
        Self {
            target_index,
            left_index,
            right_index,
            target_wavelength,
            left_wavelength,
            right_wavelength,
            name: name.unwrap_or_else(|| "CR".to_string()),
        }
    }
}

impl IndexCalculator for ContinuumRemoval {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let (w0, w1, w2) = (
            self.target_wavelength,
            self.left_wavelength,
            self.right_wavelength,
        );

        let continuum = (pixel.band(self.left_index) * (w2 - w0)
            + pixel.band(self.right_index) * (w0 - w1))
            / (w2 - w1);

        // equal neighbour wavelengths give a non-finite value -> nodata
        Some(pixel.band(self.target_index) - continuum)
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.target_index, self.left_index, self.right_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
