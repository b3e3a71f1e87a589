//! Analysis coordinator: language-based parser routing with fallback.
//!
//! For each file the coordinator detects the language, picks a parser chain,
//! and walks it until a tier succeeds. Basic metrics are pure string
//! arithmetic and cannot fail, so every file yields exactly one result and
//! `analyze_file` never propagates a failure.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::{BasicMetrics, FileAnalysis, ParserAdapter, StructuralParser};
use crate::language::{self, Language};

/// Which parser tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserTier {
    Ast,
    Lightweight,
    Structural,
    BasicMetrics,
    Error,
}

impl ParserTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserTier::Ast => "ast",
            ParserTier::Lightweight => "lightweight",
            ParserTier::Structural => "structural",
            ParserTier::BasicMetrics => "basic_metrics",
            ParserTier::Error => "error",
        }
    }
}

impl std::fmt::Display for ParserTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `FileAnalysis` wrapped with routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    pub analysis: FileAnalysis,
    pub parser_tier: ParserTier,
    pub detected_language: Language,
    pub used_fallback: bool,
    pub processing_time_ms: u64,
}

/// Errors raised by the coordinator. Per-file failures never surface here;
/// cancellation is the one case that aborts a batch.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("analysis cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },
}

/// Cooperative cancellation flag, checked at file boundaries only.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a batch run: an optional cancellation flag and an optional
/// progress callback invoked after each file with
/// (completed, total, current path).
#[derive(Default)]
pub struct BatchOptions<'a> {
    pub cancel: Option<&'a CancelFlag>,
    pub progress: Option<&'a dyn Fn(usize, usize, &str)>,
}

/// Coordinator capability snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStats {
    pub initialized: bool,
    pub structural_parser_available: bool,
    pub ast_languages: Vec<Language>,
    pub lightweight_languages: Vec<Language>,
    pub structural_languages: Vec<Language>,
}

/// Routes files to parser adapters and guarantees a result per file.
#[derive(Default)]
pub struct AnalysisCoordinator {
    ast: BTreeMap<Language, Box<dyn ParserAdapter>>,
    lightweight: BTreeMap<Language, Box<dyn ParserAdapter>>,
    structural: Option<Box<dyn StructuralParser>>,
    initialized: bool,
}

impl AnalysisCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dedicated AST-capable adapter for its language.
    pub fn register_ast(&mut self, adapter: Box<dyn ParserAdapter>) {
        self.ast.insert(adapter.language(), adapter);
    }

    /// Register a dedicated lightweight/regex adapter for its language.
    pub fn register_lightweight(&mut self, adapter: Box<dyn ParserAdapter>) {
        self.lightweight.insert(adapter.language(), adapter);
    }

    /// Load the structural-parser subsystem. Idempotent: repeat calls are
    /// no-ops. A failing provider leaves the coordinator initialized with
    /// reduced capability; the dedicated tiers stay fully available.
    pub fn initialize<F>(&mut self, provider: F)
    where
        F: FnOnce() -> anyhow::Result<Box<dyn StructuralParser>>,
    {
        if self.initialized {
            return;
        }
        match provider() {
            Ok(structural) => self.structural = Some(structural),
            Err(err) => warn!(
                error = %err,
                "structural parser subsystem unavailable, running with reduced capability"
            ),
        }
        self.initialized = true;
    }

    /// Analyze one file. Never fails: worst case is an `Error`-tier result
    /// with the message recorded in the analysis.
    pub fn analyze_file(&self, path: &str, content: &str) -> CoordinatorResult {
        let started = Instant::now();
        let detected = language::detect(path, content);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.route(path, content, detected)));
        let (mut analysis, parser_tier, used_fallback, detected_language) = match outcome {
            Ok((analysis, tier, fallback)) => (analysis, tier, fallback, detected),
            Err(payload) => {
                let message = panic_message(payload);
                warn!(path, error = %message, "analysis failed on every tier");
                (
                    FileAnalysis::with_error(path, &message),
                    ParserTier::Error,
                    false,
                    Language::Unknown,
                )
            }
        };

        // The result must always be addressable by the input path, whatever
        // the adapter wrote.
        analysis.path = path.to_string();
        if parser_tier != ParserTier::Error {
            analysis.language = detected_language;
            if analysis.metrics.is_none() {
                analysis.metrics = Some(BasicMetrics::compute(content));
            }
        }

        CoordinatorResult {
            analysis,
            parser_tier,
            detected_language,
            used_fallback,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Analyze a batch strictly sequentially.
    ///
    /// The cancellation flag is checked before each entry; an already-set
    /// flag aborts the whole call before any file is processed. Per-file
    /// failures never abort the batch.
    pub fn analyze_files(
        &self,
        files: &BTreeMap<String, String>,
        options: &BatchOptions<'_>,
    ) -> Result<BTreeMap<String, CoordinatorResult>, CoordinatorError> {
        let total = files.len();
        if cancelled(options) {
            return Err(CoordinatorError::Cancelled {
                completed: 0,
                total,
            });
        }

        let mut results = BTreeMap::new();
        for (completed, (path, content)) in files.iter().enumerate() {
            if cancelled(options) {
                return Err(CoordinatorError::Cancelled { completed, total });
            }
            let result = self.analyze_file(path, content);
            debug!(path, tier = %result.parser_tier, "file analyzed");
            results.insert(path.clone(), result);
            if let Some(progress) = options.progress {
                progress(completed + 1, total, path);
            }
        }
        Ok(results)
    }

    /// Capability snapshot: which tiers cover which languages.
    pub fn statistics(&self) -> CoordinatorStats {
        CoordinatorStats {
            initialized: self.initialized,
            structural_parser_available: self.structural.is_some(),
            ast_languages: self.ast.keys().copied().collect(),
            lightweight_languages: self.lightweight.keys().copied().collect(),
            structural_languages: self
                .structural
                .as_ref()
                .map(|s| s.supported_languages())
                .unwrap_or_default(),
        }
    }

    /// Walk the decision table for a detected language.
    fn route(
        &self,
        path: &str,
        content: &str,
        detected: Language,
    ) -> (FileAnalysis, ParserTier, bool) {
        if let Some(adapter) = self.ast.get(&detected) {
            match run_adapter(|| adapter.parse(content, path)) {
                Ok(analysis) => return (analysis, ParserTier::Ast, false),
                Err(err) => {
                    warn!(path, language = %detected, error = %err, "ast parser failed, falling back");
                }
            }
            return self.structural_or_metrics(path, content, detected);
        }

        if let Some(adapter) = self.lightweight.get(&detected) {
            match run_adapter(|| adapter.parse(content, path)) {
                Ok(analysis) => return (analysis, ParserTier::Lightweight, false),
                Err(err) => {
                    warn!(path, language = %detected, error = %err, "lightweight parser failed, falling back");
                }
            }
            return self.structural_or_metrics(path, content, detected);
        }

        if let Some(structural) = &self.structural {
            if structural.has_parser(detected) {
                match run_adapter(|| structural.parse(content, path, detected)) {
                    Ok(analysis) => return (analysis, ParserTier::Structural, false),
                    Err(err) => {
                        warn!(path, language = %detected, error = %err, "structural parser failed, falling back");
                    }
                }
                return (
                    self.basic(path, content, detected),
                    ParserTier::BasicMetrics,
                    true,
                );
            }
        }

        (
            self.basic(path, content, detected),
            ParserTier::BasicMetrics,
            false,
        )
    }

    /// Secondary chain after a dedicated tier failed: structural parser if
    /// it claims the language, basic metrics otherwise. Always a fallback.
    fn structural_or_metrics(
        &self,
        path: &str,
        content: &str,
        detected: Language,
    ) -> (FileAnalysis, ParserTier, bool) {
        if let Some(structural) = &self.structural {
            if structural.has_parser(detected) {
                match run_adapter(|| structural.parse(content, path, detected)) {
                    Ok(analysis) => return (analysis, ParserTier::Structural, true),
                    Err(err) => {
                        warn!(path, language = %detected, error = %err, "structural parser failed, falling back");
                    }
                }
            }
        }
        (
            self.basic(path, content, detected),
            ParserTier::BasicMetrics,
            true,
        )
    }

    fn basic(&self, path: &str, content: &str, detected: Language) -> FileAnalysis {
        let mut analysis = FileAnalysis::empty(path, detected);
        analysis.metrics = Some(BasicMetrics::compute(content));
        analysis
    }
}

fn cancelled(options: &BatchOptions<'_>) -> bool {
    options.cancel.map(|c| c.is_cancelled()).unwrap_or(false)
}

/// Run an adapter call, converting a panic into an ordinary error so one
/// misbehaving adapter cannot take down the batch.
fn run_adapter<F>(call: F) -> anyhow::Result<FileAnalysis>
where
    F: FnOnce() -> anyhow::Result<FileAnalysis>,
{
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("parser panicked: {}", panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
