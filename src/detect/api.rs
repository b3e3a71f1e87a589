//! API-surface detection.
//!
//! Framework-specific matchers classify route decorators and router-call
//! signals; a generic naming-convention matcher runs last and only for
//! functions none of whose signals were claimed by a specific matcher.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::{method_name, FileAnalysis, FunctionInfo};
use crate::config::ScoringConfig;
use crate::language::Language;

use super::stats::{detection_report, detection_stats, DetectionReport, DetectionStats};
use super::types::{sort_findings, ApiEndpoint, ApiKind, SignalOrigin};

lazy_static! {
    // @app.route('/users', methods=['GET', 'POST'])
    static ref FLASK_ROUTE_RE: Regex =
        Regex::new(r#"(?:^|\.)route\s*\(\s*['"]([^'"]+)['"]"#).unwrap();
    static ref FLASK_METHODS_RE: Regex = Regex::new(r#"methods\s*=\s*\[([^\]]+)\]"#).unwrap();
    // @app.get('/items') / @router.post("/users")
    static ref METHOD_DECORATOR_RE: Regex = Regex::new(
        r#"^(?:app|router|api|blueprint|bp)\.(get|post|put|delete|patch|head|options)\s*\(\s*['"]([^'"]+)['"]"#
    )
    .unwrap();
    // @api_view(['GET'])
    static ref API_VIEW_RE: Regex =
        Regex::new(r#"^api_view\s*\(\s*\[([^\]]+)\]"#).unwrap();
    // "GET /users" endpoint signals
    static ref ROUTER_CALL_RE: Regex =
        Regex::new(r"^(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s+(\S+)$").unwrap();
    // get_users, fetchOrders, users_endpoint; handle*/on_* belongs to the
    // event detector's generic matcher
    static ref GENERIC_HANDLER_RE: Regex = Regex::new(
        r"^(?:get|post|put|delete|patch|fetch)(?:_\w+|[A-Z]\w*)$|_(?:endpoint|handler|view)$"
    )
    .unwrap();
}

/// Detects exposed API surface across a corpus.
#[derive(Default)]
pub struct ApiDetector {
    config: ScoringConfig,
}

impl ApiDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scan the corpus, sorted by (file, line). Files with a recorded parse
    /// error are skipped entirely.
    pub fn detect(&self, corpus: &BTreeMap<String, FileAnalysis>) -> Vec<ApiEndpoint> {
        let mut findings = Vec::new();
        for (path, analysis) in corpus {
            if analysis.has_error() {
                continue;
            }
            for (container, info) in analysis.all_functions() {
                scan_function(path, analysis.language, &container, info, &mut findings);
            }
        }
        sort_findings(&mut findings);
        findings
    }

    pub fn detection_stats(&self, findings: &[ApiEndpoint]) -> DetectionStats {
        detection_stats(findings, self.config.top_name_count)
    }

    pub fn detection_report(
        &self,
        corpus: &BTreeMap<String, FileAnalysis>,
    ) -> DetectionReport<ApiEndpoint> {
        detection_report(self.detect(corpus), self.config.top_name_count)
    }
}

fn scan_function(
    path: &str,
    language: Language,
    container: &str,
    info: &FunctionInfo,
    findings: &mut Vec<ApiEndpoint>,
) {
    let mut origin = SignalOrigin::Unclaimed;

    for decorator in &info.decorators {
        if let Some(finding) = classify_decorator(path, language, container, info, decorator) {
            origin = SignalOrigin::Specific("decorator");
            findings.push(finding);
        }
    }

    for signal in &info.api_endpoints {
        if let Some(caps) = ROUTER_CALL_RE.captures(signal) {
            origin = SignalOrigin::Specific("router");
            let framework = if language.is_javascript_family() {
                "express"
            } else {
                "generic"
            };
            let mut detail = BTreeMap::new();
            detail.insert("method".to_string(), caps[1].to_string());
            detail.insert("route".to_string(), caps[2].to_string());
            detail.insert("name".to_string(), caps[2].to_string());
            findings.push(ApiEndpoint {
                kind: ApiKind::RouterCall,
                framework: framework.to_string(),
                file: path.to_string(),
                line: info.line,
                container: container.to_string(),
                detail,
            });
        }
    }

    // Generic naming-convention matcher: last, and never re-matching a
    // function whose signals were already claimed above.
    if !origin.is_claimed() {
        let bare = method_name(container.rsplit('.').next().unwrap_or(container));
        if GENERIC_HANDLER_RE.is_match(bare) {
            let mut detail = BTreeMap::new();
            detail.insert("name".to_string(), bare.to_string());
            findings.push(ApiEndpoint {
                kind: ApiKind::GenericHandler,
                framework: "generic".to_string(),
                file: path.to_string(),
                line: info.line,
                container: container.to_string(),
                detail,
            });
        }
    }
}

fn classify_decorator(
    path: &str,
    language: Language,
    container: &str,
    info: &FunctionInfo,
    decorator: &str,
) -> Option<ApiEndpoint> {
    if let Some(caps) = METHOD_DECORATOR_RE.captures(decorator) {
        let framework = if language == Language::Python {
            "fastapi"
        } else {
            "express"
        };
        let mut detail = BTreeMap::new();
        detail.insert("method".to_string(), caps[1].to_ascii_uppercase());
        detail.insert("route".to_string(), caps[2].to_string());
        detail.insert("name".to_string(), caps[2].to_string());
        return Some(ApiEndpoint {
            kind: ApiKind::RouteDecorator,
            framework: framework.to_string(),
            file: path.to_string(),
            line: info.line,
            container: container.to_string(),
            detail,
        });
    }

    if let Some(caps) = FLASK_ROUTE_RE.captures(decorator) {
        let methods = FLASK_METHODS_RE
            .captures(decorator)
            .map(|m| m[1].replace(['\'', '"', ' '], ""))
            .unwrap_or_else(|| "GET".to_string());
        let mut detail = BTreeMap::new();
        detail.insert("route".to_string(), caps[1].to_string());
        detail.insert("methods".to_string(), methods);
        detail.insert("name".to_string(), caps[1].to_string());
        return Some(ApiEndpoint {
            kind: ApiKind::RouteDecorator,
            framework: "flask".to_string(),
            file: path.to_string(),
            line: info.line,
            container: container.to_string(),
            detail,
        });
    }

    if let Some(caps) = API_VIEW_RE.captures(decorator) {
        let mut detail = BTreeMap::new();
        detail.insert(
            "methods".to_string(),
            caps[1].replace(['\'', '"', ' '], ""),
        );
        detail.insert("name".to_string(), container.to_string());
        return Some(ApiEndpoint {
            kind: ApiKind::RouteDecorator,
            framework: "django".to_string(),
            file: path.to_string(),
            line: info.line,
            container: container.to_string(),
            detail,
        });
    }

    None
}
