// src/bands.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic band names a sensor can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Blue,
    Green,
    Red,
    Nir,
    Swir0,
    Swir1,
    Swir2,
    RedEdge1,
    RedEdge2,
    RedEdge3,
    BroadNir,
    Vv,
    Vh,
}

impl Band {
    pub const ALL: [Band; 13] = [
        Band::Blue,
        Band::Green,
        Band::Red,
        Band::Nir,
        Band::Swir0,
        Band::Swir1,
        Band::Swir2,
        Band::RedEdge1,
        Band::RedEdge2,
        Band::RedEdge3,
        Band::BroadNir,
        Band::Vv,
        Band::Vh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::Nir => "nir",
            Band::Swir0 => "swir0",
            Band::Swir1 => "swir1",
            Band::Swir2 => "swir2",
            Band::RedEdge1 => "rededge1",
            Band::RedEdge2 => "rededge2",
            Band::RedEdge3 => "rededge3",
            Band::BroadNir => "broad-nir",
            Band::Vv => "vv",
            Band::Vh => "vh",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from semantic band names to positions in the reflectance stack,
/// plus the center wavelengths (micrometers) used by continuum removal.
///
/// Every band is optional; indices that need a band the sensor lacks are
/// reported and skipped by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BandConfig {
    pub blue: Option<usize>,
    pub green: Option<usize>,
    pub red: Option<usize>,
    pub nir: Option<usize>,
    pub swir0: Option<usize>,
    pub swir1: Option<usize>,
    pub swir2: Option<usize>,
    pub rededge1: Option<usize>,
    pub rededge2: Option<usize>,
    pub rededge3: Option<usize>,
    #[serde(alias = "broad-nir")]
    pub broad_nir: Option<usize>,
    pub vv: Option<usize>,
    pub vh: Option<usize>,
    pub w_nir: f32,
    pub w_swir1: f32,
    pub w_swir2: f32,
}

impl BandConfig {
    /// Sentinel-2 bottom-of-atmosphere layout with 10 bands:
    /// blue, green, red, red edge 1-3, broad nir, nir, swir1, swir2.
    pub fn sentinel2() -> Self {
        Self {
            blue: Some(0),
            green: Some(1),
            red: Some(2),
            rededge1: Some(3),
            rededge2: Some(4),
            rededge3: Some(5),
            broad_nir: Some(6),
            nir: Some(7),
            swir1: Some(8),
            swir2: Some(9),
            w_nir: 0.865,
            w_swir1: 1.610,
            w_swir2: 2.190,
            ..Self::default()
        }
    }

    /// Landsat TM/ETM+/OLI layout with 6 bands:
    /// blue, green, red, nir, swir1, swir2.
    pub fn landsat() -> Self {
        Self {
            blue: Some(0),
            green: Some(1),
            red: Some(2),
            nir: Some(3),
            swir1: Some(4),
            swir2: Some(5),
            w_nir: 0.865,
            w_swir1: 1.609,
            w_swir2: 2.201,
            ..Self::default()
        }
    }

    /// Look up a preset by name ("sentinel2", "landsat").
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sentinel2" | "sentinel-2" | "sen2" => Some(Self::sentinel2()),
            "landsat" => Some(Self::landsat()),
            _ => None,
        }
    }

    pub fn get(&self, band: Band) -> Option<usize> {
        match band {
            Band::Blue => self.blue,
            Band::Green => self.green,
            Band::Red => self.red,
            Band::Nir => self.nir,
            Band::Swir0 => self.swir0,
            Band::Swir1 => self.swir1,
            Band::Swir2 => self.swir2,
            Band::RedEdge1 => self.rededge1,
            Band::RedEdge2 => self.rededge2,
            Band::RedEdge3 => self.rededge3,
            Band::BroadNir => self.broad_nir,
            Band::Vv => self.vv,
            Band::Vh => self.vh,
        }
    }

    pub fn with(mut self, band: Band, index: usize) -> Self {
        let slot = match band {
            Band::Blue => &mut self.blue,
            Band::Green => &mut self.green,
            Band::Red => &mut self.red,
            Band::Nir => &mut self.nir,
            Band::Swir0 => &mut self.swir0,
            Band::Swir1 => &mut self.swir1,
            Band::Swir2 => &mut self.swir2,
            Band::RedEdge1 => &mut self.rededge1,
            Band::RedEdge2 => &mut self.rededge2,
            Band::RedEdge3 => &mut self.rededge3,
            Band::BroadNir => &mut self.broad_nir,
            Band::Vv => &mut self.vv,
            Band::Vh => &mut self.vh,
        };
        *slot = Some(index);
        self
    }
}
