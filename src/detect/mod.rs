//! Pattern detection engines.
//!
//! Four independent detectors scan the full corpus of `FileAnalysis`
//! records: framework detection by weighted evidence scoring, and API /
//! state / event detection by tagged signal classification. All detectors
//! are pure, deterministic, and skip files carrying a parse error.

mod api;
mod events;
mod framework;
mod signatures;
mod state;
mod stats;
mod types;

pub use api::ApiDetector;
pub use events::EventDetector;
pub use framework::{FrameworkDetector, FrameworkReport};
pub use signatures::{
    builtin_signatures, content_proxy, FrameworkSignature, PatternKind, SignaturePattern,
};
pub use state::StateDetector;
pub use stats::{detection_report, detection_stats, DetectionReport, DetectionStats, NameCount};
pub use types::{
    sort_findings, ApiEndpoint, ApiKind, EventHandlerRecord, EventKind, Finding,
    FrameworkDetection, SignalOrigin, StateChangePattern, StateKind,
};
