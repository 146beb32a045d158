// src/processing/indices/ndi.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Normalized Difference Index (NDI) calculator: (A-B)/(A+B), scaled by 10000
pub struct NDI {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl NDI {
    pub const SCALE: f32 = 10000.0;

    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }
}

impl IndexCalculator for NDI {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let a = pixel.band(self.band_a_index);
        let b = pixel.band(self.band_b_index);

        let sum = a + b;
        if sum == 0.0 {
            return None;
        }

        // negative reflectance can push the ratio outside [-1, 1]
        let ratio = (a - b) / sum;
        if !(-1.0..=1.0).contains(&ratio) {
            return None;
        }

        Some(ratio * Self::SCALE)
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.band_a_index, self.band_b_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
