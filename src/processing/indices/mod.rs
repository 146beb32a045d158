// src/processing/indices/mod.rs
pub mod band;
pub mod continuum;
pub mod kernelized;
pub mod ndi;
pub mod ratio;
pub mod resistance;
pub mod tasseled;

// Re-export indices
pub use band::BandCopy;
pub use continuum::ContinuumRemoval;
pub use kernelized::KernelizedNDI;
pub use ndi::NDI;
pub use ratio::{NormalizedRatio, RatioMinusOne};
pub use resistance::{Resistance, ResistanceIndex};
pub use tasseled::{TasseledCap, TasseledCapComponent};
