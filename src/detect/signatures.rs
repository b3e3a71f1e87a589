//! Framework signatures: weighted, language-restricted evidence patterns.
//!
//! A signature declares how a framework shows up in parsed files. Pattern
//! matching across the heterogeneous kinds is a tagged-variant dispatch,
//! one pure predicate per kind.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis::FileAnalysis;
use crate::language::Language;

/// What part of a `FileAnalysis` a pattern inspects.
#[derive(Debug, Clone)]
pub enum PatternKind {
    /// Match against the file path.
    FilePath(Regex),
    /// Match against imported module names.
    Import(Regex),
    /// Match against function signatures and state-change signals.
    Function(Regex),
    /// Match against class names and base-class names.
    ClassName(Regex),
    /// Match against decorator strings.
    Decorator(Regex),
    /// Coarse content proxy: matched against a synthesized haystack of the
    /// file's imports, signatures, decorators and raw signals. The detector
    /// never sees raw source.
    Content(Regex),
}

/// One weighted evidence pattern within a framework signature.
#[derive(Debug, Clone)]
pub struct SignaturePattern {
    pub id: String,
    pub kind: PatternKind,
    pub weight: f64,
    /// Restrict the pattern to files of one language; `None` applies to all.
    pub language: Option<Language>,
}

impl SignaturePattern {
    pub fn new(id: &str, kind: PatternKind, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            kind,
            weight,
            language: None,
        }
    }

    pub fn for_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Whether the pattern's language restriction is satisfied by a file.
    pub fn language_allows(&self, language: Language) -> bool {
        self.language.map(|l| l == language).unwrap_or(true)
    }

    /// Attempt the match appropriate to this pattern's kind.
    pub fn matches(&self, path: &str, analysis: &FileAnalysis, proxy: &str) -> bool {
        if !self.language_allows(analysis.language) {
            return false;
        }
        match &self.kind {
            PatternKind::FilePath(re) => re.is_match(path),
            PatternKind::Import(re) => analysis.imports.keys().any(|m| re.is_match(m)),
            PatternKind::Function(re) => analysis.all_functions().any(|(container, info)| {
                re.is_match(&container) || info.state_changes.iter().any(|t| re.is_match(t))
            }),
            PatternKind::ClassName(re) => analysis.classes.iter().any(|(name, class)| {
                re.is_match(name) || class.bases.iter().any(|b| re.is_match(b))
            }),
            PatternKind::Decorator(re) => decorators(analysis).any(|d| re.is_match(d)),
            PatternKind::Content(re) => re.is_match(proxy),
        }
    }
}

fn decorators(analysis: &FileAnalysis) -> impl Iterator<Item = &str> {
    let from_functions = analysis
        .functions
        .values()
        .flat_map(|f| f.decorators.iter());
    let from_classes = analysis.classes.values().flat_map(|c| {
        c.decorators
            .iter()
            .chain(c.methods.values().flat_map(|m| m.decorators.iter()))
    });
    from_functions.chain(from_classes).map(|s| s.as_str())
}

/// Build the coarse content proxy for a file: every string the record
/// carries, newline-joined.
pub fn content_proxy(analysis: &FileAnalysis) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (module, names) in &analysis.imports {
        parts.push(module.clone());
        parts.extend(names.iter().cloned());
    }
    for (signature, info) in &analysis.functions {
        parts.push(signature.clone());
        push_function_parts(&mut parts, info);
    }
    for (name, class) in &analysis.classes {
        parts.push(name.clone());
        parts.extend(class.bases.iter().cloned());
        parts.extend(class.decorators.iter().cloned());
        for (signature, info) in &class.methods {
            parts.push(signature.clone());
            push_function_parts(&mut parts, info);
        }
    }
    parts.join("\n")
}

fn push_function_parts(parts: &mut Vec<String>, info: &crate::analysis::FunctionInfo) {
    parts.extend(info.decorators.iter().cloned());
    parts.extend(info.state_changes.iter().cloned());
    parts.extend(info.event_handlers.iter().cloned());
    parts.extend(info.api_endpoints.iter().cloned());
}

/// A framework's full evidence declaration.
#[derive(Debug, Clone)]
pub struct FrameworkSignature {
    pub name: String,
    /// Minimum normalized confidence for this framework to surface.
    pub min_confidence: f64,
    pub patterns: Vec<SignaturePattern>,
}

impl FrameworkSignature {
    pub fn new(name: &str, min_confidence: f64, patterns: Vec<SignaturePattern>) -> Self {
        Self {
            name: name.to_string(),
            min_confidence,
            patterns,
        }
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("builtin signature regex")
}

static BUILTIN_SIGNATURES: Lazy<Vec<FrameworkSignature>> = Lazy::new(|| {
    use PatternKind::*;
    vec![
        FrameworkSignature::new(
            "react",
            0.25,
            vec![
                SignaturePattern::new("react-import", Import(re(r"^react(-dom)?$")), 3.0),
                SignaturePattern::new("react-jsx-file", FilePath(re(r"\.(jsx|tsx)$")), 1.5),
                SignaturePattern::new(
                    "react-hooks",
                    Function(re(r"\buse(State|Effect|Context|Reducer|Memo|Callback|Ref)\b")),
                    2.0,
                ),
                SignaturePattern::new(
                    "react-render",
                    Content(re(r"ReactDOM|createRoot|JSX\.Element")),
                    1.0,
                ),
            ],
        ),
        FrameworkSignature::new(
            "vue",
            0.25,
            vec![
                SignaturePattern::new("vue-import", Import(re(r"^vue(-router|x)?$")), 3.0),
                SignaturePattern::new("vue-sfc-file", FilePath(re(r"\.vue$")), 2.0),
                SignaturePattern::new(
                    "vue-composition",
                    Function(re(r"\b(defineComponent|defineProps|onMounted|onUnmounted)\b")),
                    1.5,
                ),
            ],
        ),
        FrameworkSignature::new(
            "angular",
            0.3,
            vec![
                SignaturePattern::new("angular-import", Import(re(r"^@angular/")), 3.0),
                SignaturePattern::new(
                    "angular-decorator",
                    Decorator(re(r"^(Component|Injectable|NgModule|Directive)\b")),
                    2.0,
                ),
            ],
        ),
        FrameworkSignature::new(
            "express",
            0.25,
            vec![
                SignaturePattern::new("express-import", Import(re(r"^express$")), 3.0),
                SignaturePattern::new(
                    "express-routes",
                    Content(re(r"\b(GET|POST|PUT|DELETE|PATCH)\s+/")),
                    1.5,
                ),
                SignaturePattern::new(
                    "express-middleware",
                    Content(re(r"app\.use|express\.Router")),
                    1.0,
                ),
            ],
        ),
        FrameworkSignature::new(
            "electron",
            0.25,
            vec![
                SignaturePattern::new("electron-import", Import(re(r"^electron$")), 3.0),
                SignaturePattern::new("electron-ipc", Content(re(r"ipc(Main|Renderer)\.")), 2.0),
                SignaturePattern::new("electron-window", Content(re(r"BrowserWindow")), 1.0),
            ],
        ),
        FrameworkSignature::new(
            "django",
            0.25,
            vec![
                SignaturePattern::new("django-import", Import(re(r"^django")), 3.0)
                    .for_language(Language::Python),
                SignaturePattern::new(
                    "django-model",
                    ClassName(re(r"models\.Model|^Model$")),
                    2.0,
                )
                .for_language(Language::Python),
                SignaturePattern::new(
                    "django-view-decorator",
                    Decorator(re(r"^(login_required|csrf_exempt|api_view)")),
                    1.0,
                )
                .for_language(Language::Python),
            ],
        ),
        FrameworkSignature::new(
            "flask",
            0.25,
            vec![
                SignaturePattern::new("flask-import", Import(re(r"^flask$")), 3.0)
                    .for_language(Language::Python),
                SignaturePattern::new("flask-route-decorator", Decorator(re(r"\.route\(")), 2.5)
                    .for_language(Language::Python),
            ],
        ),
        FrameworkSignature::new(
            "fastapi",
            0.25,
            vec![
                SignaturePattern::new("fastapi-import", Import(re(r"^fastapi$")), 3.0)
                    .for_language(Language::Python),
                SignaturePattern::new(
                    "fastapi-method-decorator",
                    Decorator(re(r"^(app|router)\.(get|post|put|delete|patch)\(")),
                    2.5,
                )
                .for_language(Language::Python),
            ],
        ),
        FrameworkSignature::new(
            "sqlalchemy",
            0.25,
            vec![
                SignaturePattern::new("sqlalchemy-import", Import(re(r"^sqlalchemy")), 3.0)
                    .for_language(Language::Python),
                SignaturePattern::new(
                    "sqlalchemy-session",
                    Content(re(r"session\.(add|commit|query|delete)|declarative_base")),
                    1.5,
                )
                .for_language(Language::Python),
            ],
        ),
    ]
});

/// The built-in framework signature set. Cloned so callers can extend or
/// replace entries without touching the shared table.
pub fn builtin_signatures() -> Vec<FrameworkSignature> {
    BUILTIN_SIGNATURES.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ClassInfo, FunctionInfo};
    use std::collections::HashSet;

    #[test]
    fn test_builtin_sanity() {
        let signatures = builtin_signatures();
        assert!(!signatures.is_empty());

        let mut ids = HashSet::new();
        for sig in &signatures {
            assert!(
                (0.0..=1.0).contains(&sig.min_confidence),
                "{} threshold out of range",
                sig.name
            );
            assert!(!sig.patterns.is_empty(), "{} has no patterns", sig.name);
            for pattern in &sig.patterns {
                assert!(pattern.weight > 0.0, "{} weight not positive", pattern.id);
                assert!(ids.insert(pattern.id.clone()), "duplicate id {}", pattern.id);
            }
        }
    }

    fn react_file() -> FileAnalysis {
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
        analysis
    }

    #[test]
    fn test_import_pattern() {
        let analysis = react_file();
        let proxy = content_proxy(&analysis);
        let pattern = SignaturePattern::new("p", PatternKind::Import(re(r"^react$")), 1.0);
        assert!(pattern.matches(&analysis.path, &analysis, &proxy));
    }

    #[test]
    fn test_function_pattern_sees_state_tags() {
        let analysis = react_file();
        let proxy = content_proxy(&analysis);
        let pattern =
            SignaturePattern::new("p", PatternKind::Function(re(r"\buseState\b")), 1.0);
        assert!(pattern.matches(&analysis.path, &analysis, &proxy));
    }

    #[test]
    fn test_language_restriction() {
        let analysis = react_file();
        let proxy = content_proxy(&analysis);
        let pattern = SignaturePattern::new("p", PatternKind::Import(re(r"^react$")), 1.0)
            .for_language(Language::Python);
        assert!(!pattern.matches(&analysis.path, &analysis, &proxy));
    }

    #[test]
    fn test_class_pattern_sees_bases() {
        let mut analysis = FileAnalysis::empty("models.py", Language::Python);
        let class = ClassInfo {
            bases: vec!["models.Model".to_string()],
            line: 1,
            ..Default::default()
        };
        analysis.classes.insert("User".to_string(), class);
        let proxy = content_proxy(&analysis);

        let pattern =
            SignaturePattern::new("p", PatternKind::ClassName(re(r"models\.Model")), 1.0);
        assert!(pattern.matches(&analysis.path, &analysis, &proxy));
    }

    #[test]
    fn test_content_proxy_includes_signals() {
        let mut analysis = FileAnalysis::empty("main.js", Language::JavaScript);
        let mut func = FunctionInfo::default();
        func.api_endpoints.push("GET /users".to_string());
        analysis.functions.insert("listUsers()".to_string(), func);

        let proxy = content_proxy(&analysis);
        assert!(proxy.contains("GET /users"));
        assert!(proxy.contains("listUsers()"));
    }
}
