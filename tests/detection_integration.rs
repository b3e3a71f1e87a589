//! Integration tests for the detection engines.
//!
//! A small in-memory corpus shaped like a real app (a React component, a
//! Flask API module, an Electron main process) is run through all four
//! detectors.

use std::collections::BTreeMap;

use codescope::detect::{ApiKind, EventKind, StateKind};
use codescope::{
    ApiDetector, ClassInfo, EventDetector, FileAnalysis, FrameworkDetector, FunctionInfo,
    Language, StateDetector,
};

fn react_component() -> FileAnalysis {
    let mut analysis = FileAnalysis::empty("src/Form.jsx", Language::JavaScript);
    analysis
        .imports
        .insert("react".to_string(), vec!["useState".to_string()]);
    let func = FunctionInfo {
        state_changes: vec!["useState:draft".to_string()],
        event_handlers: vec!["onSubmit:handleSubmit".to_string()],
        is_component: true,
        line: 4,
        ..Default::default()
    };
    analysis.functions.insert("Form()".to_string(), func);
    analysis
}

fn flask_api() -> FileAnalysis {
    let mut analysis = FileAnalysis::empty("server/app.py", Language::Python);
    analysis
        .imports
        .insert("flask".to_string(), vec!["Flask".to_string()]);
    analysis.functions.insert(
        "list_users()".to_string(),
        FunctionInfo {
            decorators: vec!["app.route('/users', methods=['GET'])".to_string()],
            line: 12,
            ..Default::default()
        },
    );
    analysis.functions.insert(
        "create_user()".to_string(),
        FunctionInfo {
            decorators: vec!["app.route('/users', methods=['POST'])".to_string()],
            state_changes: vec!["session.add".to_string()],
            line: 20,
            ..Default::default()
        },
    );
    analysis
}

fn electron_main() -> FileAnalysis {
    let mut analysis = FileAnalysis::empty("electron/main.js", Language::JavaScript);
    analysis.imports.insert(
        "electron".to_string(),
        vec!["ipcMain".to_string(), "BrowserWindow".to_string()],
    );
    analysis.functions.insert(
        "registerHandlers()".to_string(),
        FunctionInfo {
            event_handlers: vec![
                "ipcMain.on:save-file".to_string(),
                "ipcMain.handle:read-config".to_string(),
            ],
            line: 8,
            ..Default::default()
        },
    );
    analysis
}

fn corpus() -> BTreeMap<String, FileAnalysis> {
    let mut corpus = BTreeMap::new();
    for analysis in [react_component(), flask_api(), electron_main()] {
        corpus.insert(analysis.path.clone(), analysis);
    }
    corpus
}

#[test]
fn test_frameworks_detected_with_confidence_in_range() {
    let detections = FrameworkDetector::new().detect(&corpus());

    let names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"react"));
    assert!(names.contains(&"flask"));
    assert!(names.contains(&"electron"));

    for detection in &detections {
        assert!(detection.confidence >= 0.0 && detection.confidence <= 1.0);
        assert!(!detection.evidence.is_empty());
        assert!(!detection.matched_patterns.is_empty());
    }
    // Sorted by confidence descending.
    for pair in detections.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn test_component_file_scenario() {
    // One function carrying a component-library import, a state-update tag
    // and a submit-event tag yields: the library at or above threshold,
    // exactly one state finding, exactly one submit-event finding.
    let mut corpus = BTreeMap::new();
    corpus.insert("src/Form.jsx".to_string(), react_component());

    let frameworks = FrameworkDetector::new().detect(&corpus);
    assert!(frameworks.iter().any(|d| d.name == "react"));

    let states = StateDetector::new().detect(&corpus);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].kind, StateKind::HookState);
    assert_eq!(states[0].container, "Form()");

    let events = EventDetector::new().detect(&corpus);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::UiHandler);
    assert_eq!(events[0].detail.get("name").unwrap(), "onSubmit");
    assert_eq!(events[0].container, "Form()");
}

#[test]
fn test_api_surface() {
    let endpoints = ApiDetector::new().detect(&corpus());

    let flask: Vec<_> = endpoints.iter().filter(|e| e.framework == "flask").collect();
    assert_eq!(flask.len(), 2);
    assert!(flask.iter().all(|e| e.kind == ApiKind::RouteDecorator));
    assert!(flask.iter().all(|e| e.file == "server/app.py"));
    assert_eq!(flask[0].line, 12);
    assert_eq!(flask[1].line, 20);
}

#[test]
fn test_findings_sorted_and_traceable() {
    let corpus = corpus();
    let endpoints = ApiDetector::new().detect(&corpus);
    let states = StateDetector::new().detect(&corpus);
    let events = EventDetector::new().detect(&corpus);

    for (file, line) in endpoints
        .iter()
        .map(|f| (&f.file, f.line))
        .chain(states.iter().map(|f| (&f.file, f.line)))
        .chain(events.iter().map(|f| (&f.file, f.line)))
    {
        // Every finding points at a (file, line) that exists in its record.
        let analysis = corpus.get(file).expect("finding references corpus file");
        assert!(analysis
            .all_functions()
            .any(|(_, info)| info.line == line));
    }

    for pair in events.windows(2) {
        assert!((&pair[0].file, pair[0].line) <= (&pair[1].file, pair[1].line));
    }
}

#[test]
fn test_event_stats_top_channels() {
    let detector = EventDetector::new();
    let events = detector.detect(&corpus());
    let stats = detector.detection_stats(&events);

    assert_eq!(stats.by_kind.get("ipc_channel"), Some(&2));
    assert_eq!(stats.by_framework.get("electron"), Some(&2));
    assert!(stats
        .top_names
        .iter()
        .any(|n| n.name == "save-file" && n.count == 1));
}

#[test]
fn test_detection_report_shape() {
    let detector = ApiDetector::new();
    let report = detector.detection_report(&corpus());

    assert_eq!(report.summary.total, report.findings.len());
    assert_eq!(report.breakdown.get("flask/route_decorator"), Some(&2));
}

#[test]
fn test_error_files_produce_no_findings() {
    let mut corpus = corpus();
    for analysis in corpus.values_mut() {
        analysis.error = Some("parse failed".to_string());
    }

    assert!(FrameworkDetector::new().detect(&corpus).is_empty());
    assert!(ApiDetector::new().detect(&corpus).is_empty());
    assert!(StateDetector::new().detect(&corpus).is_empty());
    assert!(EventDetector::new().detect(&corpus).is_empty());
}

#[test]
fn test_detectors_are_deterministic() {
    let corpus = corpus();
    let first = serde_json::to_value(EventDetector::new().detect(&corpus)).unwrap();
    let second = serde_json::to_value(EventDetector::new().detect(&corpus)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_django_model_class_evidence() {
    let mut corpus = BTreeMap::new();
    let mut analysis = FileAnalysis::empty("shop/models.py", Language::Python);
    analysis
        .imports
        .insert("django.db".to_string(), vec!["models".to_string()]);
    let mut class = ClassInfo {
        bases: vec!["models.Model".to_string()],
        line: 5,
        ..Default::default()
    };
    class.methods.insert(
        "save(self)".to_string(),
        FunctionInfo {
            state_changes: vec!["objects.create".to_string()],
            line: 9,
            ..Default::default()
        },
    );
    analysis.classes.insert("Order".to_string(), class);
    corpus.insert("shop/models.py".to_string(), analysis);

    let frameworks = FrameworkDetector::new().detect(&corpus);
    assert!(frameworks.iter().any(|d| d.name == "django"));

    let states = StateDetector::new().detect(&corpus);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].kind, StateKind::OrmMutation);
    assert_eq!(states[0].container, "Order.save");
}
