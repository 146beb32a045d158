// src/error.rs
use thiserror::Error;

use crate::stack::Band;

/// Errors raised while setting up or running an index computation.
///
/// Per-cell problems (zero denominators, values out of range) never surface
/// here; they become nodata in the output instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("number of bands in endmember table ({endmember}) and reflectance stack ({stack}) is different")]
    EndmemberBandMismatch { endmember: usize, stack: usize },

    #[error("spectral mixture analysis requested, but no endmember table was given")]
    MissingEndmember,

    #[error("selected endmember {selected} is outside 1..={n_materials}")]
    EndmemberOutOfRange { selected: usize, n_materials: usize },

    #[error("endmember matrix is singular, unconstrained unmixing is impossible")]
    SingularEndmember,

    #[error("invalid endmember table: {0}")]
    InvalidEndmember(String),

    #[error("inconsistent reflectance stack: {0}")]
    InvalidStack(String),

    #[error("output has shape {found:?} (dates, cells), expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("unknown index: {0}")]
    UnknownIndex(String),

    #[error("index {index} needs the {band} band, which is not part of the band configuration")]
    MissingBand { index: &'static str, band: Band },

    #[error("index {index} needs distinct, positive nir, swir1 and swir2 wavelengths in the band configuration")]
    MissingWavelength { index: &'static str },

    #[error("index {index} reads band {band}, but the stack only has {n_bands} bands")]
    BandOutOfRange {
        index: String,
        band: usize,
        n_bands: usize,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

impl IndexError {
    /// Fatal errors abort the whole request list. The others only affect the
    /// index they were raised for, which is then left as nodata.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            IndexError::UnknownIndex(_)
                | IndexError::MissingBand { .. }
                | IndexError::MissingWavelength { .. }
                | IndexError::BandOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
