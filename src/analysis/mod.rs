//! Canonical analysis records and parser adapter traits.
//!
//! This module defines the shape every parser adapter produces
//! (`FileAnalysis` and its parts) and the traits the coordinator routes
//! through (`ParserAdapter`, `StructuralParser`).

mod records;
mod traits;

pub use records::{method_name, BasicMetrics, ClassInfo, FileAnalysis, FunctionInfo};
pub use traits::{ParserAdapter, StructuralParser};
