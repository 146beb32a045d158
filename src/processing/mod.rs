// src/processing/mod.rs
pub mod dispatch;
pub mod indices;
pub mod parallel;
pub mod unmixing;

// Re-export main components
pub use dispatch::{IndexDispatcher, IndexKind, IndexOutput, IndexRequest, OutputStatus, CATALOG};
pub use parallel::{IndexCalculator, ParallelProcessor, Pixel};
pub use unmixing::{EndmemberTable, SmaParams, Unmixer};
