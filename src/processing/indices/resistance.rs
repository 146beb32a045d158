// src/processing/indices/resistance.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Coefficients of a resistance-weighted index:
/// `gain * (NIR - RED') / (NIR + red_weight * RED' - blue_weight * BLUE + offset * 10000)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistance {
    pub gain: f32,
    pub red_weight: f32,
    pub blue_weight: f32,
    pub offset: f32,
    /// Replace RED by RED - (BLUE - RED) before evaluating
    pub red_blue_correction: bool,
}

impl Resistance {
    /// Enhanced Vegetation Index, MODIS coefficients
    pub const EVI: Self = Self::new(2.5, 6.0, 7.5, 1.0, false);
    /// Atmospherically Resistant Vegetation Index
    pub const ARVI: Self = Self::new(1.0, 1.0, 0.0, 0.0, true);
    /// Soil Adjusted Vegetation Index, L = 0.5
    pub const SAVI: Self = Self::new(1.5, 1.0, 0.0, 0.5, false);
    /// Soil and Atmospherically Resistant Vegetation Index
    pub const SARVI: Self = Self::new(1.5, 1.0, 0.0, 0.5, true);
    /// Two-band EVI, evaluated with RED in place of BLUE
    pub const EVI2: Self = Self::new(2.4, 1.0, 0.0, 1.0, false);

    pub const fn new(
        gain: f32,
        red_weight: f32,
        blue_weight: f32,
        offset: f32,
        red_blue_correction: bool,
    ) -> Self {
        Self {
            gain,
            red_weight,
            blue_weight,
            offset,
            red_blue_correction,
        }
    }
}

/// Resistance-weighted vegetation index calculator (EVI, ARVI, SAVI, ...)
pub struct ResistanceIndex {
    nir_index: usize,
    red_index: usize,
    blue_index: usize,
    coefficients: Resistance,
    name: String,
}

impl ResistanceIndex {
    /// Reflectance scale; also the output scale
    pub const SCALE: f32 = 10000.0;

    pub fn new(
        nir_index: usize,
        red_index: usize,
        blue_index: usize,
        coefficients: Resistance,
        name: Option<String>,
    ) -> Self {
        Self {
            nir_index,
            red_index,
            blue_index,
            coefficients,
            name: name.unwrap_or_else(|| "EVI".to_string()),
        }
    }
}

impl IndexCalculator for ResistanceIndex {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let Resistance {
            gain,
            red_weight,
            blue_weight,
            offset,
            red_blue_correction,
        } = self.coefficients;

        let nir = pixel.band(self.nir_index);
        let blue = pixel.band(self.blue_index);
        let mut red = pixel.band(self.red_index);
        if red_blue_correction {
            red -= blue - red;
        }

        let denominator = nir + red_weight * red - blue_weight * blue + offset * Self::SCALE;
        if denominator == 0.0 {
            return None;
        }

        Some(gain * (nir - red) / denominator * Self::SCALE)
    }

    fn required_bands(&self) -> Vec<usize> {
        vec![self.nir_index, self.red_index, self.blue_index]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
