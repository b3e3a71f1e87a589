//! Dependency-graph construction and circular-dependency detection.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::FileAnalysis;
use crate::language::extension_of;

/// Build the file -> dependency adjacency map for a corpus.
///
/// Relative import specifiers (leading `.` or `..`) are resolved against
/// the importing file's directory into a repository-relative path; a
/// specifier that climbs past the repository root keeps its raw form.
/// External specifiers are kept as written. The adjacency is deduplicated
/// and self-edge-free: a file importing itself is silently excluded rather
/// than reported as a one-node cycle.
pub fn build_dependency_graph(
    corpus: &BTreeMap<String, FileAnalysis>,
) -> BTreeMap<String, Vec<String>> {
    let extensions: BTreeSet<String> = corpus.keys().filter_map(|p| extension_of(p)).collect();

    let mut graph = BTreeMap::new();
    for (path, analysis) in corpus {
        let mut deps: BTreeSet<String> = BTreeSet::new();
        for specifier in analysis.imports.keys() {
            let dep = if specifier.starts_with('.') {
                match resolve_relative(path, specifier) {
                    Some(resolved) => probe_corpus(resolved, corpus, &extensions),
                    None => specifier.clone(),
                }
            } else {
                specifier.clone()
            };
            if dep != *path {
                deps.insert(dep);
            }
        }
        graph.insert(path.clone(), deps.into_iter().collect());
    }
    graph
}

/// Lexically resolve a relative specifier against the importer's directory.
/// Returns None when the specifier escapes the repository root.
fn resolve_relative(importer: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = match importer.rfind('/') {
        Some(idx) => importer[..idx].split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Map a resolved path onto an actual corpus file when possible: exact key
/// first, then the corpus's known extensions (`b` -> `b.js`), then an index
/// file in a directory of that name. Falls back to the resolved string.
fn probe_corpus(
    resolved: String,
    corpus: &BTreeMap<String, FileAnalysis>,
    extensions: &BTreeSet<String>,
) -> String {
    if corpus.contains_key(&resolved) {
        return resolved;
    }
    for ext in extensions {
        let with_ext = format!("{}.{}", resolved, ext);
        if corpus.contains_key(&with_ext) {
            return with_ext;
        }
        let index = format!("{}/index.{}", resolved, ext);
        if corpus.contains_key(&index) {
            return index;
        }
    }
    resolved
}

/// Find all distinct cycles in an adjacency map.
///
/// Depth-first search tracking an on-stack set; a back-edge into the stack
/// yields the stack suffix from the revisited node to the current one.
/// Cycles are canonicalized by rotating to their lexicographically smallest
/// member so equivalent rotations collapse to one entry. Terminates on any
/// finite graph, including disconnected components and self-loops.
pub fn detect_circular_dependencies(
    graph: &BTreeMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut on_stack: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut cycles: BTreeSet<Vec<String>> = BTreeSet::new();

    for start in graph.keys() {
        if !visited.contains(start.as_str()) {
            dfs(
                start,
                graph,
                &mut stack,
                &mut on_stack,
                &mut visited,
                &mut cycles,
            );
        }
    }
    cycles.into_iter().collect()
}

fn dfs<'a>(
    node: &'a str,
    graph: &'a BTreeMap<String, Vec<String>>,
    stack: &mut Vec<&'a str>,
    on_stack: &mut BTreeSet<&'a str>,
    visited: &mut BTreeSet<&'a str>,
    cycles: &mut BTreeSet<Vec<String>>,
) {
    stack.push(node);
    on_stack.insert(node);

    if let Some(deps) = graph.get(node) {
        for dep in deps {
            if on_stack.contains(dep.as_str()) {
                if let Some(pos) = stack.iter().position(|n| *n == dep.as_str()) {
                    let cycle = stack[pos..].iter().map(|s| s.to_string()).collect();
                    cycles.insert(canonicalize(cycle));
                }
            } else if !visited.contains(dep.as_str()) {
                dfs(dep, graph, stack, on_stack, visited, cycles);
            }
        }
    }

    stack.pop();
    on_stack.remove(node);
    visited.insert(node);
}

/// Rotate a cycle so its lexicographically smallest member comes first.
fn canonicalize(mut cycle: Vec<String>) -> Vec<String> {
    if let Some((min_idx, _)) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
    {
        cycle.rotate_left(min_idx);
    }
    cycle
}
