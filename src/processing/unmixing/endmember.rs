// src/processing/unmixing/endmember.rs
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Reference spectra of pure materials: `n_bands x n_materials`, reflectance
/// in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct EndmemberTable {
    n_bands: usize,
    n_materials: usize,
    values: Vec<f64>,
}

impl EndmemberTable {
    /// Build from a row-major `n_bands x n_materials` buffer.
    pub fn new(n_bands: usize, n_materials: usize, values: Vec<f64>) -> Result<Self> {
        if n_bands == 0 || n_materials == 0 {
            return Err(IndexError::InvalidEndmember(format!(
                "table is empty ({n_bands} bands x {n_materials} materials)"
            )));
        }
        if values.len() != n_bands * n_materials {
            return Err(IndexError::InvalidEndmember(format!(
                "expected {} values for {} bands x {} materials, got {}",
                n_bands * n_materials,
                n_bands,
                n_materials,
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(IndexError::InvalidEndmember(format!(
                "value at band {}, material {} is not finite",
                i / n_materials,
                i % n_materials
            )));
        }

        Ok(Self {
            n_bands,
            n_materials,
            values,
        })
    }

    /// Build from one row per band, one column per material.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_bands = rows.len();
        let n_materials = rows.first().map_or(0, Vec::len);
        if let Some(b) = rows.iter().position(|r| r.len() != n_materials) {
            return Err(IndexError::InvalidEndmember(format!(
                "band {} has {} materials, expected {}",
                b,
                rows[b].len(),
                n_materials
            )));
        }
        Self::new(n_bands, n_materials, rows.into_iter().flatten().collect())
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn n_materials(&self) -> usize {
        self.n_materials
    }

    #[inline]
    pub fn get(&self, band: usize, material: usize) -> f64 {
        self.values[band * self.n_materials + material]
    }

    /// Spectrum of one material, in band order.
    pub fn spectrum(&self, material: usize) -> Vec<f64> {
        (0..self.n_bands).map(|b| self.get(b, material)).collect()
    }
}

/// Spectral mixture analysis options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaParams {
    /// Non-negative fractions (active-set solver) instead of plain least squares
    pub positive: bool,
    /// Regress towards fractions that sum to one
    pub sum_to_one: bool,
    /// Treat the last endmember as shade and normalize it away
    pub shade_normalize: bool,
    /// Also write the root mean squared reconstruction error
    pub emit_rms: bool,
    /// 1-based index of the fraction to keep
    pub endmember: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self {
            positive: true,
            sum_to_one: true,
            shade_normalize: true,
            emit_rms: false,
            endmember: 1,
        }
    }
}
