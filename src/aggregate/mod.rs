//! Results aggregation: fuse coordinator output and detector findings into
//! one JSON-serializable `AnalysisResult`.
//!
//! Aggregation is a pure function of its inputs. Source records are never
//! mutated; enrichment attaches findings onto copies.

mod graph;

pub use graph::{build_dependency_graph, detect_circular_dependencies};

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::FileAnalysis;
use crate::detect::{ApiEndpoint, EventHandlerRecord, FrameworkDetection, StateChangePattern};
use crate::language::extension_of;

/// A file's analysis with its findings attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedFile {
    #[serde(flatten)]
    pub analysis: FileAnalysis,
    #[serde(default)]
    pub api_endpoints: Vec<ApiEndpoint>,
    #[serde(default)]
    pub state_patterns: Vec<StateChangePattern>,
    #[serde(default)]
    pub event_handlers: Vec<EventHandlerRecord>,
}

/// Corpus-wide counts and histograms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_files: usize,
    pub total_lines: usize,
    pub languages: BTreeMap<String, usize>,
    pub extensions: BTreeMap<String, usize>,
    /// Framework name -> detection confidence.
    #[serde(default)]
    pub frameworks: BTreeMap<String, f64>,
}

/// Run metadata attached to every result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub engine_version: String,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The aggregated analysis of a repository. Structurally complete even on
/// total upstream failure; callers never need to null-check top-level
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Parent directory -> files within it, sorted by path.
    pub folder_structure: BTreeMap<String, Vec<EnrichedFile>>,
    pub summary: Summary,
    /// File -> deduplicated dependency strings, self-edge-free.
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub circular_dependencies: Vec<Vec<String>>,
    pub metadata: ResultMetadata,
}

impl AnalysisResult {
    /// A structurally complete, empty result recording a total upstream
    /// failure.
    pub fn failed(repository: &str, error: &str, started: Instant) -> Self {
        aggregate_results(
            &BTreeMap::new(),
            &[],
            &[],
            &[],
            &[],
            started,
            repository,
            Some(error.to_string()),
        )
    }
}

/// Fuse per-file analyses and detector findings into one result.
#[allow(clippy::too_many_arguments)]
pub fn aggregate_results(
    file_analyses: &BTreeMap<String, FileAnalysis>,
    frameworks: &[FrameworkDetection],
    api_endpoints: &[ApiEndpoint],
    state_patterns: &[StateChangePattern],
    event_handlers: &[EventHandlerRecord],
    started: Instant,
    repository: &str,
    pipeline_error: Option<String>,
) -> AnalysisResult {
    // Enrich copies and fold them into the folder structure. Corpus
    // iteration is path-ordered, so each folder's file list stays sorted.
    let mut folder_structure: BTreeMap<String, Vec<EnrichedFile>> = BTreeMap::new();
    for (path, analysis) in file_analyses {
        let enriched = EnrichedFile {
            analysis: analysis.clone(),
            api_endpoints: findings_for(api_endpoints, path, |f| f.file.as_str()),
            state_patterns: findings_for(state_patterns, path, |f| f.file.as_str()),
            event_handlers: findings_for(event_handlers, path, |f| f.file.as_str()),
        };
        folder_structure
            .entry(parent_directory(path))
            .or_default()
            .push(enriched);
    }

    let summary = summarize(file_analyses, frameworks);
    let dependencies = build_dependency_graph(file_analyses);
    let circular_dependencies = detect_circular_dependencies(&dependencies);

    AnalysisResult {
        folder_structure,
        summary,
        dependencies,
        circular_dependencies,
        metadata: ResultMetadata {
            generated_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            repository: repository.to_string(),
            error: pipeline_error,
        },
    }
}

fn findings_for<F: Clone>(findings: &[F], path: &str, file_of: impl Fn(&F) -> &str) -> Vec<F> {
    findings
        .iter()
        .filter(|f| file_of(f) == path)
        .cloned()
        .collect()
}

/// Group key: string prefix up to the last path separator; files without a
/// separator group under ".".
fn parent_directory(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => ".".to_string(),
    }
}

fn summarize(
    file_analyses: &BTreeMap<String, FileAnalysis>,
    frameworks: &[FrameworkDetection],
) -> Summary {
    let mut summary = Summary {
        total_files: file_analyses.len(),
        ..Default::default()
    };
    for (path, analysis) in file_analyses {
        summary.total_lines += analysis.line_count();
        *summary
            .languages
            .entry(analysis.language.as_str().to_string())
            .or_insert(0) += 1;
        let ext = extension_of(path).unwrap_or_else(|| "none".to_string());
        *summary.extensions.entry(ext).or_insert(0) += 1;
    }
    for detection in frameworks {
        summary
            .frameworks
            .insert(detection.name.clone(), detection.confidence);
    }
    summary
}
