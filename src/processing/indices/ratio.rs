// src/processing/indices/ratio.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Simple ratio minus one, e.g. CIre: A/B - 1, scaled by 1000
pub struct RatioMinusOne {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl RatioMinusOne {
    pub const SCALE: f32 = 1000.0;

    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "RATIO".to_string()),
        }
    }
}

impl IndexCalculator for RatioMinusOne {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let b = pixel.band(self.band_b_index);
        if b == 0.0 {
            return None;
        }
        Some((pixel.band(self.band_a_index) / b - 1.0) * Self::SCALE)
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.band_a_index, self.band_b_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Modified simple ratio, e.g. MSRre: (A/B - 1) / sqrt(A/B + 1), scaled by 10000
pub struct NormalizedRatio {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl NormalizedRatio {
    pub const SCALE: f32 = 10000.0;

    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "MSR".to_string()),
        }
    }
}

impl IndexCalculator for NormalizedRatio {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let b = pixel.band(self.band_b_index);
        if b == 0.0 {
            return None;
        }

        let ratio = pixel.band(self.band_a_index) / b;
        let upper = ratio - 1.0;
        let lower = (ratio + 1.0).sqrt();

        // NaN for ratios below -1 fails this test as well
        if !(lower > 0.0) {
            return None;
        }

        Some(upper / lower * Self::SCALE)
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.band_a_index, self.band_b_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
