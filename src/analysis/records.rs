//! Canonical per-file parse records.
//!
//! Every parser adapter, whatever its source language, produces the same
//! `FileAnalysis` shape. Downstream detectors and the aggregator consume
//! only this record; they never see raw source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Canonical parse result for a single file.
///
/// Ordered maps keep every derivation over a corpus deterministic.
/// A `FileAnalysis` is never mutated once produced; enrichment downstream
/// works on copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: String,
    #[serde(default)]
    pub language: Language,
    /// Imported module -> list of imported names (empty for bare imports).
    #[serde(default)]
    pub imports: BTreeMap<String, Vec<String>>,
    /// Function signature -> function info.
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionInfo>,
    /// Class name -> class info.
    #[serde(default)]
    pub classes: BTreeMap<String, ClassInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BasicMetrics>,
    /// Parse error recorded by the coordinator. Files carrying an error are
    /// skipped by every detector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileAnalysis {
    /// Create an empty analysis for a file.
    pub fn empty(path: &str, language: Language) -> Self {
        Self {
            path: path.to_string(),
            language,
            ..Default::default()
        }
    }

    /// Create an error-tagged analysis with no structure.
    pub fn with_error(path: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            language: Language::Unknown,
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Line count from basic metrics, 0 when metrics were not computed.
    pub fn line_count(&self) -> usize {
        self.metrics.as_ref().map(|m| m.lines).unwrap_or(0)
    }

    /// Iterate all functions in the file: top-level functions plus class
    /// methods, with the container label the detectors report
    /// (signature for functions, `Class.method` for methods).
    pub fn all_functions(&self) -> impl Iterator<Item = (String, &FunctionInfo)> {
        let top = self
            .functions
            .iter()
            .map(|(sig, info)| (sig.clone(), info));
        let methods = self.classes.iter().flat_map(|(class_name, class)| {
            class
                .methods
                .iter()
                .map(move |(sig, info)| (format!("{}.{}", class_name, method_name(sig)), info))
        });
        top.chain(methods)
    }
}

/// Strip a signature like `save(self, force)` down to its bare name.
pub fn method_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature).trim()
}

/// Per-function facts produced by the parser adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// Raw state-change signals, e.g. `"useState:count"`, `"session.add"`.
    #[serde(default)]
    pub state_changes: Vec<String>,
    /// Raw event-handler signals, e.g. `"onClick:handleClick"`,
    /// `"ipcMain.on:save-file"`.
    #[serde(default)]
    pub event_handlers: Vec<String>,
    /// Raw API-endpoint signals, e.g. `"GET /users"`.
    #[serde(default)]
    pub api_endpoints: Vec<String>,
    /// Decorator strings as written, without the leading `@`.
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub is_component: bool,
    #[serde(default)]
    pub is_hook: bool,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub params: Vec<String>,
    /// 1-indexed line of the definition.
    #[serde(default)]
    pub line: usize,
}

/// Per-class facts produced by the parser adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// Method signature -> function info.
    #[serde(default)]
    pub methods: BTreeMap<String, FunctionInfo>,
    /// Base class names as written.
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    /// 1-indexed line of the definition.
    #[serde(default)]
    pub line: usize,
}

/// Line and character counts for a file.
///
/// Pure string arithmetic; computing these cannot fail, which makes them the
/// guaranteed terminal tier of the parser fallback chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub lines: usize,
    pub characters: usize,
    pub non_empty_lines: usize,
    pub avg_line_length: f64,
}

impl BasicMetrics {
    /// Compute metrics for a file's content.
    pub fn compute(content: &str) -> Self {
        let lines = content.lines().count();
        let characters = content.chars().count();
        let non_empty_lines = content.lines().filter(|l| !l.trim().is_empty()).count();
        let avg_line_length = if lines == 0 {
            0.0
        } else {
            let line_chars: usize = content.lines().map(|l| l.chars().count()).sum();
            line_chars as f64 / lines as f64
        };
        Self {
            lines,
            characters,
            non_empty_lines,
            avg_line_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_metrics() {
        let m = BasicMetrics::compute("abc\n\n  \ndefgh\n");
        assert_eq!(m.lines, 4);
        assert_eq!(m.non_empty_lines, 2);
        assert_eq!(m.characters, 15);
        // 3 + 0 + 3 + 5 line chars over 4 lines
        assert!((m.avg_line_length - 2.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_basic_metrics_empty() {
        let m = BasicMetrics::compute("");
        assert_eq!(m.lines, 0);
        assert_eq!(m.characters, 0);
        assert_eq!(m.avg_line_length, 0.0);
    }

    #[test]
    fn test_all_functions_includes_methods() {
        let mut analysis = FileAnalysis::empty("models.py", Language::Python);
        analysis
            .functions
            .insert("main()".to_string(), FunctionInfo::default());
        let mut class = ClassInfo::default();
        class
            .methods
            .insert("save(self)".to_string(), FunctionInfo::default());
        analysis.classes.insert("User".to_string(), class);

        let containers: Vec<String> = analysis.all_functions().map(|(c, _)| c).collect();
        assert!(containers.contains(&"main()".to_string()));
        assert!(containers.contains(&"User.save".to_string()));
    }

    #[test]
    fn test_with_error() {
        let analysis = FileAnalysis::with_error("broken.py", "parser exploded");
        assert!(analysis.has_error());
        assert_eq!(analysis.language, Language::Unknown);
        assert_eq!(analysis.line_count(), 0);
    }

    #[test]
    fn test_method_name() {
        assert_eq!(method_name("save(self, force)"), "save");
        assert_eq!(method_name("plain"), "plain");
    }
}
