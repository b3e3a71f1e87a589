//! Language detection from file paths and content.
//!
//! Maps a (path, content) pair to one tag from a fixed language enumeration.
//! Detection is extension-first with a shebang sniff for extensionless files.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// The fixed set of languages the pipeline routes on.
///
/// `Unknown` is a valid tag: files that don't resolve to a known language
/// still flow through the pipeline on the basic-metrics tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Vue,
    Rust,
    Go,
    Java,
    Ruby,
    Html,
    Css,
    Json,
    Yaml,
    Markdown,
    #[default]
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Vue => "vue",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Ruby => "ruby",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::Unknown => "unknown",
        }
    }

    /// Whether this is a JavaScript-family language (plain JS, TS, or Vue SFC).
    pub fn is_javascript_family(&self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Vue
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extension -> language table. Extensions are lowercase, without the dot.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "py" => Language::Python,
    "pyw" => Language::Python,
    "pyi" => Language::Python,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "ts" => Language::TypeScript,
    "tsx" => Language::TypeScript,
    "mts" => Language::TypeScript,
    "vue" => Language::Vue,
    "rs" => Language::Rust,
    "go" => Language::Go,
    "java" => Language::Java,
    "rb" => Language::Ruby,
    "html" => Language::Html,
    "htm" => Language::Html,
    "css" => Language::Css,
    "scss" => Language::Css,
    "less" => Language::Css,
    "json" => Language::Json,
    "yaml" => Language::Yaml,
    "yml" => Language::Yaml,
    "md" => Language::Markdown,
    "markdown" => Language::Markdown,
};

/// Extract the extension of a path, lowercase, without the dot.
///
/// Dotfiles like `.gitignore` have no extension. Returns None for paths
/// without a `.` in their final component.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let dot = file_name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(file_name[dot + 1..].to_ascii_lowercase())
}

/// Look up a language by file extension (without the dot).
pub fn from_extension(ext: &str) -> Language {
    EXTENSIONS
        .get(ext.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(Language::Unknown)
}

/// Detect the language of a file from its path and content.
///
/// Extension wins when present; extensionless files fall back to a shebang
/// sniff of the first line.
pub fn detect(path: &str, content: &str) -> Language {
    if let Some(ext) = extension_of(path) {
        let lang = from_extension(&ext);
        if lang != Language::Unknown {
            return lang;
        }
    }
    detect_from_shebang(content)
}

fn detect_from_shebang(content: &str) -> Language {
    let first_line = content.lines().next().unwrap_or("");
    if !first_line.starts_with("#!") {
        return Language::Unknown;
    }
    if first_line.contains("python") {
        Language::Python
    } else if first_line.contains("node") {
        Language::JavaScript
    } else if first_line.contains("ruby") {
        Language::Ruby
    } else {
        Language::Unknown
    }
}
