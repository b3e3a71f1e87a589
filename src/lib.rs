//! Codescope - structured code intelligence core.
//!
//! Codescope ingests parsed representations of source files and turns them
//! into structured intelligence: which frameworks are in use, what API
//! surface exists, how state is mutated, what events are wired up, and how
//! files depend on one another.
//!
//! # Architecture
//!
//! Three subsystems over a shared canonical record:
//!
//! - `coordinator`: language-based parser routing with multi-level fallback
//! - `detect`: framework / API / state / event detection engines
//! - `aggregate`: finding fusion, folder structure, dependency graph and
//!   circular-dependency detection
//!
//! Supporting modules: `analysis` (the canonical `FileAnalysis` record and
//! the parser adapter traits), `language` (the fixed language enumeration),
//! `config` (scoring tunables).
//!
//! The core never touches a filesystem or network: files arrive as an
//! already-read path -> content map, parsers are opaque adapters registered
//! behind traits, and results are in-memory serializable records.

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod coordinator;
pub mod detect;
pub mod language;

pub use aggregate::{
    aggregate_results, build_dependency_graph, detect_circular_dependencies, AnalysisResult,
    EnrichedFile, ResultMetadata, Summary,
};
pub use analysis::{BasicMetrics, ClassInfo, FileAnalysis, FunctionInfo, ParserAdapter, StructuralParser};
pub use config::ScoringConfig;
pub use coordinator::{
    AnalysisCoordinator, BatchOptions, CancelFlag, CoordinatorError, CoordinatorResult,
    CoordinatorStats, ParserTier,
};
pub use detect::{
    ApiDetector, ApiEndpoint, EventDetector, EventHandlerRecord, FrameworkDetection,
    FrameworkDetector, FrameworkReport, StateChangePattern, StateDetector,
};
pub use language::Language;
