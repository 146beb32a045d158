// src/utils/mod.rs
pub mod citation;
pub mod fixed_point;

pub use citation::{Citation, CitationLog};
pub use fixed_point::{to_fixed_point, to_fixed_point_f64};
