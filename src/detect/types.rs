//! Core types for detector findings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kinds of API-surface findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    RouteDecorator,
    RouterCall,
    GenericHandler,
}

impl ApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::RouteDecorator => "route_decorator",
            ApiKind::RouterCall => "router_call",
            ApiKind::GenericHandler => "generic_handler",
        }
    }
}

/// Kinds of state-mutation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    HookState,
    InstanceState,
    StoreDispatch,
    OrmMutation,
    GenericAssignment,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::HookState => "hook_state",
            StateKind::InstanceState => "instance_state",
            StateKind::StoreDispatch => "store_dispatch",
            StateKind::OrmMutation => "orm_mutation",
            StateKind::GenericAssignment => "generic_assignment",
        }
    }
}

/// Kinds of event-wiring findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UiHandler,
    DomListener,
    IpcChannel,
    Lifecycle,
    GenericHandler,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UiHandler => "ui_handler",
            EventKind::DomListener => "dom_listener",
            EventKind::IpcChannel => "ipc_channel",
            EventKind::Lifecycle => "lifecycle",
            EventKind::GenericHandler => "generic_handler",
        }
    }
}

/// An API-surface finding: a route or handler exposed by a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub kind: ApiKind,
    pub framework: String,
    pub file: String,
    pub line: usize,
    /// Enclosing function signature or `Class.method`.
    pub container: String,
    #[serde(default)]
    pub detail: BTreeMap<String, String>,
}

/// A state-mutation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangePattern {
    pub kind: StateKind,
    pub framework: String,
    pub file: String,
    pub line: usize,
    pub container: String,
    #[serde(default)]
    pub detail: BTreeMap<String, String>,
}

/// An event-wiring finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHandlerRecord {
    pub kind: EventKind,
    pub framework: String,
    pub file: String,
    pub line: usize,
    pub container: String,
    #[serde(default)]
    pub detail: BTreeMap<String, String>,
}

/// Common view over the three finding types, for sorting and stats.
pub trait Finding {
    fn file(&self) -> &str;
    fn line(&self) -> usize;
    fn framework(&self) -> &str;
    fn kind_tag(&self) -> &'static str;
    /// The concrete name behind the finding (state variable, event or
    /// channel name), when one was extracted.
    fn name(&self) -> Option<&str>;
}

macro_rules! impl_finding {
    ($ty:ty) => {
        impl Finding for $ty {
            fn file(&self) -> &str {
                &self.file
            }

            fn line(&self) -> usize {
                self.line
            }

            fn framework(&self) -> &str {
                &self.framework
            }

            fn kind_tag(&self) -> &'static str {
                self.kind.as_str()
            }

            fn name(&self) -> Option<&str> {
                self.detail.get("name").map(|s| s.as_str())
            }
        }
    };
}

impl_finding!(ApiEndpoint);
impl_finding!(StateChangePattern);
impl_finding!(EventHandlerRecord);

/// Sort findings into the deterministic (file, line, kind) order every
/// detector emits.
pub fn sort_findings<F: Finding>(findings: &mut [F]) {
    findings.sort_by(|a, b| {
        a.file()
            .cmp(b.file())
            .then_with(|| a.line().cmp(&b.line()))
            .then_with(|| a.kind_tag().cmp(b.kind_tag()))
    });
}

/// Who claimed a raw signal during classification. A signal claimed by a
/// framework-specific matcher is never re-matched by the generic pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOrigin {
    Specific(&'static str),
    Unclaimed,
}

impl SignalOrigin {
    pub fn is_claimed(&self) -> bool {
        matches!(self, SignalOrigin::Specific(_))
    }
}

/// A framework surfaced by evidence scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkDetection {
    pub name: String,
    /// Normalized confidence in [0, 1].
    pub confidence: f64,
    /// Deduplicated, sorted list of files contributing evidence.
    pub evidence: Vec<String>,
    /// Ids of the patterns that matched.
    pub matched_patterns: Vec<String>,
}
