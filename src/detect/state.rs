//! State-mutation detection.
//!
//! Classifies the raw state-change signals parser adapters attach to
//! functions. Each signal is classified exactly once: the first
//! framework-specific matcher to claim it wins, and the generic assignment
//! matcher only ever sees unclaimed signals.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::{FileAnalysis, FunctionInfo};
use crate::config::ScoringConfig;

use super::stats::{detection_report, detection_stats, DetectionReport, DetectionStats};
use super::types::{sort_findings, StateChangePattern, StateKind};

lazy_static! {
    // useState:count, useReducer:cart, setCount
    static ref HOOK_RE: Regex =
        Regex::new(r"^use(?:State|Reducer|Ref|Context)(?::(\w+))?").unwrap();
    static ref SETTER_RE: Regex = Regex::new(r"^set([A-Z]\w*)$").unwrap();
    // dispatch:INCREMENT, store.dispatch, commit:SET_USER, store.subscribe
    static ref DISPATCH_RE: Regex =
        Regex::new(r"^(?:store\.)?dispatch(?::(\w+))?|^store\.subscribe").unwrap();
    static ref COMMIT_RE: Regex = Regex::new(r"^commit:(\w+)").unwrap();
    // session.add, user.save(), Model.objects.create
    static ref ORM_SESSION_RE: Regex =
        Regex::new(r"^session\.(add|delete|commit|flush|merge)").unwrap();
    static ref ORM_MANAGER_RE: Regex =
        Regex::new(r"objects\.(create|update|delete|get_or_create|bulk_create)").unwrap();
    static ref ORM_CALL_RE: Regex = Regex::new(r"\.(save|create|update|delete)\(").unwrap();
    // this.count = ..., self.total = ...
    static ref INSTANCE_RE: Regex = Regex::new(r"^(?:this|self)\.(\w+)\s*=").unwrap();
    // assign:total, global:counter
    static ref ASSIGN_RE: Regex = Regex::new(r"^(?:assign|global):(\w+)").unwrap();
}

/// Detects state mutations across a corpus.
#[derive(Default)]
pub struct StateDetector {
    config: ScoringConfig,
}

impl StateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scan the corpus, sorted by (file, line). Files with a recorded parse
    /// error are skipped entirely.
    pub fn detect(&self, corpus: &BTreeMap<String, FileAnalysis>) -> Vec<StateChangePattern> {
        let mut findings = Vec::new();
        for (path, analysis) in corpus {
            if analysis.has_error() {
                continue;
            }
            for (container, info) in analysis.all_functions() {
                scan_function(path, &container, info, &mut findings);
            }
        }
        sort_findings(&mut findings);
        findings
    }

    pub fn detection_stats(&self, findings: &[StateChangePattern]) -> DetectionStats {
        detection_stats(findings, self.config.top_name_count)
    }

    pub fn detection_report(
        &self,
        corpus: &BTreeMap<String, FileAnalysis>,
    ) -> DetectionReport<StateChangePattern> {
        detection_report(self.detect(corpus), self.config.top_name_count)
    }
}

fn scan_function(
    path: &str,
    container: &str,
    info: &FunctionInfo,
    findings: &mut Vec<StateChangePattern>,
) {
    for signal in &info.state_changes {
        if let Some((kind, framework, name)) = classify_signal(signal) {
            let mut detail = BTreeMap::new();
            detail.insert("signal".to_string(), signal.clone());
            if let Some(name) = name {
                detail.insert("name".to_string(), name);
            }
            findings.push(StateChangePattern {
                kind,
                framework: framework.to_string(),
                file: path.to_string(),
                line: info.line,
                container: container.to_string(),
                detail,
            });
        }
    }
}

/// Classify one raw signal. Matchers are ordered; the first claim wins and
/// the generic assignment matcher runs last. Unmatched signals produce no
/// finding; absent evidence is not an error.
fn classify_signal(signal: &str) -> Option<(StateKind, &'static str, Option<String>)> {
    if let Some(caps) = HOOK_RE.captures(signal) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        return Some((StateKind::HookState, "react", name));
    }
    if let Some(caps) = SETTER_RE.captures(signal) {
        let mut chars = caps[1].chars();
        let name = chars
            .next()
            .map(|first| first.to_ascii_lowercase().to_string() + chars.as_str());
        return Some((StateKind::HookState, "react", name));
    }
    if let Some(caps) = COMMIT_RE.captures(signal) {
        return Some((StateKind::StoreDispatch, "vuex", Some(caps[1].to_string())));
    }
    if let Some(caps) = DISPATCH_RE.captures(signal) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        return Some((StateKind::StoreDispatch, "redux", name));
    }
    if let Some(caps) = ORM_SESSION_RE.captures(signal) {
        return Some((
            StateKind::OrmMutation,
            "sqlalchemy",
            Some(caps[1].to_string()),
        ));
    }
    if let Some(caps) = ORM_MANAGER_RE.captures(signal) {
        return Some((StateKind::OrmMutation, "django", Some(caps[1].to_string())));
    }
    if let Some(caps) = ORM_CALL_RE.captures(signal) {
        return Some((StateKind::OrmMutation, "orm", Some(caps[1].to_string())));
    }
    if let Some(caps) = INSTANCE_RE.captures(signal) {
        return Some((
            StateKind::InstanceState,
            "generic",
            Some(caps[1].to_string()),
        ));
    }
    if let Some(caps) = ASSIGN_RE.captures(signal) {
        return Some((
            StateKind::GenericAssignment,
            "generic",
            Some(caps[1].to_string()),
        ));
    }
    None
}
