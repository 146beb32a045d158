// src/processing/indices/band.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Copies one band into the output unchanged
pub struct BandCopy {
    band_index: usize,
    name: String,
}

impl BandCopy {
    pub fn new(band_index: usize, name: Option<String>) -> Self {
        Self {
            band_index,
            name: name.unwrap_or_else(|| format!("BAND{band_index}")),
        }
    }
}

impl IndexCalculator for BandCopy {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        Some(pixel.band(self.band_index))
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.band_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
