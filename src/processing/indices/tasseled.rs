// src/processing/indices/tasseled.rs
use crate::processing::parallel::{IndexCalculator, Pixel};

/// Reflectance-factor Tasseled Cap coefficients for
/// blue, green, red, nir, swir1, swir2.
pub const BRIGHTNESS: [f32; 6] = [0.2043, 0.4158, 0.5524, 0.5741, 0.3124, 0.2303];
pub const GREENNESS: [f32; 6] = [-0.1603, -0.2819, -0.4934, 0.7940, -0.0002, -0.1446];
pub const WETNESS: [f32; 6] = [0.0315, 0.2021, 0.3102, 0.1594, -0.6806, -0.6109];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasseledCapComponent {
    Brightness,
    Greenness,
    Wetness,
    /// Brightness - Greenness - Wetness
    Disturbance,
}

/// Tasseled Cap transformation calculator. Output keeps the input scale.
pub struct TasseledCap {
    component: TasseledCapComponent,
    /// blue, green, red, nir, swir1, swir2
    band_indices: [usize; 6],
    name: String,
}

impl TasseledCap {
    pub fn new(
        component: TasseledCapComponent,
        band_indices: [usize; 6],
        name: Option<String>,
    ) -> Self {
        let default_name = match component {
            TasseledCapComponent::Brightness => "TC-BRIGHT",
            TasseledCapComponent::Greenness => "TC-GREEN",
            TasseledCapComponent::Wetness => "TC-WET",
            TasseledCapComponent::Disturbance => "TC-DI",
        };
        Self {
            component,
            band_indices,
            name: name.unwrap_or_else(|| default_name.to_string()),
        }
    }

    #[inline]
    fn project(&self, pixel: &Pixel<'_>, coefficients: &[f32; 6]) -> f32 {
        coefficients
            .iter()
            .zip(self.band_indices)
            .map(|(c, b)| c * pixel.band(b))
            .sum()
    }
}

impl IndexCalculator for TasseledCap {
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32> {
        let value = match self.component {
            TasseledCapComponent::Brightness => self.project(pixel, &BRIGHTNESS),
            TasseledCapComponent::Greenness => self.project(pixel, &GREENNESS),
            TasseledCapComponent::Wetness => self.project(pixel, &WETNESS),
            TasseledCapComponent::Disturbance => {
                self.project(pixel, &BRIGHTNESS)
                    - self.project(pixel, &GREENNESS)
                    - self.project(pixel, &WETNESS)
            }
        };
        Some(value)
    }

    fn required_bands(&self) -> Vec<usize> {
        self.band_indices.to_vec()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
