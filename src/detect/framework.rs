//! Framework detection by evidence-weighted confidence scoring.
//!
//! Raw summed weights are incomparable across frameworks with different
//! pattern counts, so each score is normalized against an achievable
//! ceiling: the summed weight of patterns whose language restriction is
//! satisfied by at least one corpus file, damped and floored. That keeps
//! per-framework thresholds meaningful regardless of which files happen to
//! exist.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::FileAnalysis;
use crate::config::ScoringConfig;
use crate::language::Language;

use serde::Serialize;

use super::signatures::{builtin_signatures, content_proxy, FrameworkSignature};
use super::types::FrameworkDetection;

/// Diagnostic report for a framework detection run.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkReport {
    /// Framework name -> confidence.
    pub summary: BTreeMap<String, f64>,
    pub detections: Vec<FrameworkDetection>,
    /// Framework name -> evidence file count.
    pub breakdown: BTreeMap<String, usize>,
}

/// Per-framework running score. Constructed fresh inside each `detect`
/// call; concurrent detection runs over different corpora never share
/// state.
#[derive(Default)]
struct Accumulator {
    score: f64,
    evidence: BTreeSet<String>,
    patterns: BTreeSet<String>,
}

/// Detects frameworks across a corpus of parsed files.
pub struct FrameworkDetector {
    signatures: Vec<FrameworkSignature>,
    config: ScoringConfig,
}

impl Default for FrameworkDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameworkDetector {
    /// Detector over the built-in signature set with default scoring.
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self {
            signatures: builtin_signatures(),
            config,
        }
    }

    /// Detector over a custom signature set.
    pub fn with_signatures(signatures: Vec<FrameworkSignature>, config: ScoringConfig) -> Self {
        Self { signatures, config }
    }

    /// Scan the corpus and emit frameworks whose normalized confidence
    /// meets their own threshold, sorted by confidence descending.
    ///
    /// Files carrying a parse error are skipped entirely.
    pub fn detect(&self, corpus: &BTreeMap<String, FileAnalysis>) -> Vec<FrameworkDetection> {
        let mut accumulators: BTreeMap<&str, Accumulator> = BTreeMap::new();
        let mut languages_present: BTreeSet<Language> = BTreeSet::new();

        for (path, analysis) in corpus {
            if analysis.has_error() {
                continue;
            }
            languages_present.insert(analysis.language);
            let proxy = content_proxy(analysis);
            for signature in &self.signatures {
                for pattern in &signature.patterns {
                    if pattern.matches(path, analysis, &proxy) {
                        let acc = accumulators.entry(signature.name.as_str()).or_default();
                        acc.score += pattern.weight;
                        acc.evidence.insert(path.clone());
                        acc.patterns.insert(pattern.id.clone());
                    }
                }
            }
        }

        let mut detections = Vec::new();
        for signature in &self.signatures {
            let acc = match accumulators.get(signature.name.as_str()) {
                Some(acc) if !acc.patterns.is_empty() => acc,
                _ => continue,
            };
            let confidence = self.confidence(acc.score, signature, &languages_present);
            if confidence >= signature.min_confidence {
                detections.push(FrameworkDetection {
                    name: signature.name.clone(),
                    confidence,
                    evidence: acc.evidence.iter().cloned().collect(),
                    matched_patterns: acc.patterns.iter().cloned().collect(),
                });
            }
        }

        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        detections
    }

    /// Diagnostic report: detections plus name -> confidence and
    /// name -> evidence-count views.
    pub fn detection_report(&self, corpus: &BTreeMap<String, FileAnalysis>) -> FrameworkReport {
        let detections = self.detect(corpus);
        let summary = detections
            .iter()
            .map(|d| (d.name.clone(), d.confidence))
            .collect();
        let breakdown = detections
            .iter()
            .map(|d| (d.name.clone(), d.evidence.len()))
            .collect();
        FrameworkReport {
            summary,
            detections,
            breakdown,
        }
    }

    /// Normalize a raw score into [0, 1] against the achievable ceiling.
    fn confidence(
        &self,
        score: f64,
        signature: &FrameworkSignature,
        languages_present: &BTreeSet<Language>,
    ) -> f64 {
        let achievable: f64 = signature
            .patterns
            .iter()
            .filter(|p| {
                p.language
                    .map(|l| languages_present.contains(&l))
                    .unwrap_or(true)
            })
            .map(|p| p.weight)
            .sum();
        let max_possible =
            (achievable * self.config.damping_factor).max(self.config.normalization_floor);
        (score / max_possible).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FunctionInfo;

    fn react_corpus() -> BTreeMap<String, FileAnalysis> {
        let mut corpus = BTreeMap::new();
        let mut analysis = FileAnalysis::empty("src/App.jsx", Language::JavaScript);
        analysis
            .imports
            .insert("react".to_string(), vec!["useState".to_string()]);
        let mut func = FunctionInfo {
            is_component: true,
            line: 3,
            ..Default::default()
        };
        func.state_changes.push("useState:count".to_string());
        analysis.functions.insert("App()".to_string(), func);
        corpus.insert("src/App.jsx".to_string(), analysis);
        corpus
    }

    #[test]
    fn test_detects_react() {
        let detector = FrameworkDetector::new();
        let detections = detector.detect(&react_corpus());

        let react = detections
            .iter()
            .find(|d| d.name == "react")
            .expect("react detected");
        assert!(react.confidence >= 0.25);
        assert!(react.confidence <= 1.0);
        assert_eq!(react.evidence, vec!["src/App.jsx".to_string()]);
        assert!(react
            .matched_patterns
            .contains(&"react-import".to_string()));
    }

    #[test]
    fn test_empty_corpus() {
        let detector = FrameworkDetector::new();
        assert!(detector.detect(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_zero_match_framework_absent() {
        let detector = FrameworkDetector::new();
        let detections = detector.detect(&react_corpus());
        assert!(detections.iter().all(|d| d.name != "django"));
    }

    #[test]
    fn test_error_files_skipped() {
        let detector = FrameworkDetector::new();
        let mut corpus = BTreeMap::new();
        let mut analysis = FileAnalysis::empty("src/App.jsx", Language::JavaScript);
        analysis
            .imports
            .insert("react".to_string(), vec![]);
        analysis.error = Some("parse failed".to_string());
        corpus.insert("src/App.jsx".to_string(), analysis);

        assert!(detector.detect(&corpus).is_empty());
    }

    #[test]
    fn test_more_evidence_never_lowers_confidence() {
        let detector = FrameworkDetector::new();
        let single = detector.detect(&react_corpus());
        let base = single.iter().find(|d| d.name == "react").unwrap().confidence;

        let mut corpus = react_corpus();
        let mut second = FileAnalysis::empty("src/Nav.jsx", Language::JavaScript);
        second.imports.insert("react".to_string(), vec![]);
        corpus.insert("src/Nav.jsx".to_string(), second);

        let doubled = detector.detect(&corpus);
        let grown = doubled.iter().find(|d| d.name == "react").unwrap().confidence;
        assert!(grown >= base);
    }

    #[test]
    fn test_sorted_by_confidence_descending() {
        let detector = FrameworkDetector::new();
        let mut corpus = react_corpus();
        let mut electron = FileAnalysis::empty("main.js", Language::JavaScript);
        electron.imports.insert("electron".to_string(), vec![]);
        corpus.insert("main.js".to_string(), electron);

        let detections = detector.detect(&corpus);
        assert!(detections.len() >= 2);
        for pair in detections.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        let detector = FrameworkDetector::with_config(ScoringConfig {
            damping_factor: 0.01,
            normalization_floor: 0.01,
            ..Default::default()
        });
        let detections = detector.detect(&react_corpus());
        let react = detections.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.confidence, 1.0);
    }

    #[test]
    fn test_detection_report() {
        let detector = FrameworkDetector::new();
        let report = detector.detection_report(&react_corpus());
        assert!(report.summary.contains_key("react"));
        assert_eq!(report.breakdown.get("react"), Some(&1));
        assert_eq!(report.detections.len(), report.summary.len());
    }

    #[test]
    fn test_evidence_deduplicated() {
        // One file matching several patterns appears once in evidence.
        let detector = FrameworkDetector::new();
        let detections = detector.detect(&react_corpus());
        let react = detections.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.evidence.len(), 1);
        assert!(react.matched_patterns.len() > 1);
    }
}
