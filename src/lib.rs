// src/lib.rs
pub mod bands;
pub mod batch;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod stack;
pub mod utils;

pub use error::IndexError;
pub use processing::{
    EndmemberTable, IndexDispatcher, IndexKind, IndexRequest, ParallelProcessor, SmaParams,
    Unmixer,
};
pub use stack::{Band, BandConfig, Frame, ReflectanceStack, TimeSeries};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
