//! Event-wiring detection.
//!
//! Classifies the raw event-handler signals parser adapters attach to
//! functions: IPC channels, DOM listeners, lifecycle hooks and UI handler
//! props. The generic naming-convention matcher runs last, only for
//! functions none of whose signals were claimed by a specific matcher.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::{method_name, FileAnalysis, FunctionInfo};
use crate::config::ScoringConfig;
use crate::language::Language;

use super::stats::{detection_report, detection_stats, DetectionReport, DetectionStats};
use super::types::{sort_findings, EventHandlerRecord, EventKind, SignalOrigin};

lazy_static! {
    // ipcMain.on:save-file, ipcRenderer.invoke:read-config
    static ref IPC_RE: Regex =
        Regex::new(r"^ipc(?:Main|Renderer)\.(?:on|once|handle|send|invoke):(.+)$").unwrap();
    // addEventListener:click
    static ref LISTENER_RE: Regex = Regex::new(r"^addEventListener:(\w+)").unwrap();
    // onClick:handleClick, onSubmit:submitForm
    static ref UI_PROP_RE: Regex = Regex::new(r"^(on[A-Z]\w*)").unwrap();
    // handleSubmit, handle_submit, on_message
    static ref GENERIC_HANDLER_RE: Regex =
        Regex::new(r"^handle(?:_\w+|[A-Z]\w*)$|^on_[a-z]\w*$").unwrap();
}

/// Lifecycle hook name -> owning framework.
fn lifecycle_framework(name: &str) -> Option<&'static str> {
    match name {
        "componentDidMount" | "componentDidUpdate" | "componentWillUnmount" | "useEffect"
        | "useLayoutEffect" => Some("react"),
        "mounted" | "created" | "updated" | "beforeDestroy" | "destroyed" | "onMounted"
        | "onUnmounted" => Some("vue"),
        "ngOnInit" | "ngOnDestroy" | "ngOnChanges" => Some("angular"),
        _ => None,
    }
}

/// Detects event wiring across a corpus.
#[derive(Default)]
pub struct EventDetector {
    config: ScoringConfig,
}

impl EventDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scan the corpus, sorted by (file, line). Files with a recorded parse
    /// error are skipped entirely.
    pub fn detect(&self, corpus: &BTreeMap<String, FileAnalysis>) -> Vec<EventHandlerRecord> {
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

    pub fn detection_stats(&self, findings: &[EventHandlerRecord]) -> DetectionStats {
        detection_stats(findings, self.config.top_name_count)
    }

    pub fn detection_report(
        &self,
        corpus: &BTreeMap<String, FileAnalysis>,
    ) -> DetectionReport<EventHandlerRecord> {
        detection_report(self.detect(corpus), self.config.top_name_count)
    }
}

fn scan_function(
    path: &str,
    language: Language,
    container: &str,
    info: &FunctionInfo,
    findings: &mut Vec<EventHandlerRecord>,
) {
    let mut origin = SignalOrigin::Unclaimed;
    let mut push = |kind: EventKind, framework: &str, name: Option<String>, signal: &str| {
        let mut detail = BTreeMap::new();
        detail.insert("signal".to_string(), signal.to_string());
        if let Some(name) = name {
            detail.insert("name".to_string(), name);
        }
        findings.push(EventHandlerRecord {
            kind,
            framework: framework.to_string(),
            file: path.to_string(),
            line: info.line,
            container: container.to_string(),
            detail,
        });
    };

    for signal in &info.event_handlers {
        if let Some(caps) = IPC_RE.captures(signal) {
            origin = SignalOrigin::Specific("electron");
            push(
                EventKind::IpcChannel,
                "electron",
                Some(caps[1].to_string()),
                signal,
            );
            continue;
        }
        if let Some(caps) = LISTENER_RE.captures(signal) {
            origin = SignalOrigin::Specific("dom");
            push(
                EventKind::DomListener,
                "dom",
                Some(caps[1].to_string()),
                signal,
            );
            continue;
        }
        // Lifecycle before UI props: "onMounted" is a lifecycle hook, not a
        // handler prop.
        let head = signal.split(':').next().unwrap_or(signal);
        if let Some(framework) = lifecycle_framework(head) {
            origin = SignalOrigin::Specific(framework);
            push(
                EventKind::Lifecycle,
                framework,
                Some(head.to_string()),
                signal,
            );
            continue;
        }
        if let Some(caps) = UI_PROP_RE.captures(signal) {
            origin = SignalOrigin::Specific("ui");
            let framework = if language.is_javascript_family() {
                "react"
            } else {
                "ui"
            };
            push(
                EventKind::UiHandler,
                framework,
                Some(caps[1].to_string()),
                signal,
            );
        }
    }

    // Generic naming-convention matcher: last, and never re-matching a
    // function whose signals were already claimed above.
    if !origin.is_claimed() {
        let bare = method_name(container.rsplit('.').next().unwrap_or(container));
        if GENERIC_HANDLER_RE.is_match(bare) {
            push(
                EventKind::GenericHandler,
                "generic",
                Some(bare.to_string()),
                bare,
            );
        }
    }
}
