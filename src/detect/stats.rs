//! Read-only derivations over detector findings.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::Finding;

/// Histograms over a set of findings.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub by_framework: BTreeMap<String, usize>,
    /// Most frequent concrete names (event, channel, state variable),
    /// descending; ties broken by name.
    pub top_names: Vec<NameCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Compute histograms for findings. Pure derivation; the findings are not
/// modified or filtered.
pub fn detection_stats<F: Finding>(findings: &[F], top_n: usize) -> DetectionStats {
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_framework: BTreeMap<String, usize> = BTreeMap::new();
    let mut names: BTreeMap<String, usize> = BTreeMap::new();

    for finding in findings {
        *by_kind.entry(finding.kind_tag().to_string()).or_insert(0) += 1;
        *by_framework
            .entry(finding.framework().to_string())
            .or_insert(0) += 1;
        if let Some(name) = finding.name() {
            *names.entry(name.to_string()).or_insert(0) += 1;
        }
    }

    let mut top_names: Vec<NameCount> = names
        .into_iter()
        .map(|(name, count)| NameCount { name, count })
        .collect();
    top_names.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    top_names.truncate(top_n);

    DetectionStats {
        total: findings.len(),
        by_kind,
        by_framework,
        top_names,
    }
}

/// Diagnostic report: findings plus their histograms and a per
/// framework/kind breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport<F> {
    pub summary: DetectionStats,
    pub findings: Vec<F>,
    /// Keyed `framework/kind`.
    pub breakdown: BTreeMap<String, usize>,
}

pub fn detection_report<F: Finding>(findings: Vec<F>, top_n: usize) -> DetectionReport<F> {
    let summary = detection_stats(&findings, top_n);
    let mut breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for finding in &findings {
        *breakdown
            .entry(format!("{}/{}", finding.framework(), finding.kind_tag()))
            .or_insert(0) += 1;
    }
    DetectionReport {
        summary,
        findings,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::types::{EventHandlerRecord, EventKind};
    use std::collections::BTreeMap as Map;

    fn record(file: &str, line: usize, name: &str) -> EventHandlerRecord {
        let mut detail = Map::new();
        detail.insert("name".to_string(), name.to_string());
        EventHandlerRecord {
            kind: EventKind::IpcChannel,
            framework: "electron".to_string(),
            file: file.to_string(),
            line,
            container: "main()".to_string(),
            detail,
        }
    }

    #[test]
    fn test_detection_stats() {
        let findings = vec![
            record("main.js", 1, "save-file"),
            record("main.js", 5, "save-file"),
            record("main.js", 9, "open-file"),
        ];
        let stats = detection_stats(&findings, 5);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_kind.get("ipc_channel"), Some(&3));
        assert_eq!(stats.by_framework.get("electron"), Some(&3));
        assert_eq!(
            stats.top_names[0],
            NameCount {
                name: "save-file".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_top_names_truncated() {
        let findings = vec![
            record("a.js", 1, "a"),
            record("a.js", 2, "b"),
            record("a.js", 3, "c"),
        ];
        let stats = detection_stats(&findings, 2);
        assert_eq!(stats.top_names.len(), 2);
    }

    #[test]
    fn test_detection_report_breakdown() {
        let report = detection_report(vec![record("a.js", 1, "x")], 5);
        assert_eq!(report.breakdown.get("electron/ipc_channel"), Some(&1));
        assert_eq!(report.findings.len(), 1);
    }
}
