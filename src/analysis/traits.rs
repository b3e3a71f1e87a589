//! Adapter traits for the parser tiers.
//!
//! The coordinator never parses anything itself. Per-language parsers are
//! opaque adapters registered behind these traits; each produces the
//! canonical `FileAnalysis` record or fails, and the coordinator handles
//! routing and fallback.

use crate::analysis::FileAnalysis;
use crate::language::Language;

/// A dedicated parser for a single language.
///
/// Used for both the AST-capable tier and the lightweight/regex tier; the
/// tier an adapter belongs to is decided at registration, not by the
/// adapter itself.
pub trait ParserAdapter: Send + Sync {
    /// The language this adapter handles.
    fn language(&self) -> Language;

    /// Parse content into the canonical record. May fail; the coordinator
    /// falls through the tier chain on failure.
    fn parse(&self, content: &str, path: &str) -> anyhow::Result<FileAnalysis>;
}

/// The structural-parser subsystem: one adapter claiming multiple languages.
///
/// Sits between the dedicated tiers and basic metrics in the fallback chain.
/// Loading this subsystem may fail entirely, in which case the coordinator
/// runs with reduced capability.
pub trait StructuralParser: Send + Sync {
    /// Capability query: can this subsystem handle the given language?
    fn has_parser(&self, language: Language) -> bool;

    /// Parse content for a language `has_parser` returned true for.
    fn parse(&self, content: &str, path: &str, language: Language) -> anyhow::Result<FileAnalysis>;

    /// All languages the subsystem claims, for statistics reporting.
    fn supported_languages(&self) -> Vec<Language>;
}
