//! Step graph. The immutable dialogue script and its integrity checks.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::model::{Step, StepId};
use crate::error::GraphError;

/// A content-authoring defect found by [`StepGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    MissingEntry(StepId),
    /// Two steps share an id; the later one replaced the earlier.
    DuplicateStep(StepId),
    KeyMismatch { key: StepId, id: StepId },
    DanglingChoice { step: StepId, target: StepId },
    DanglingFreeText { step: StepId, target: StepId },
    ConflictingInput(StepId),
    FreeTextWithoutHandler(StepId),
}

impl std::fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntry(id) => write!(f, "entry step {id} is missing"),
            Self::DuplicateStep(id) => write!(f, "step {id} is defined more than once"),
            Self::KeyMismatch { key, id } => write!(f, "step keyed {key} declares id {id}"),
            Self::DanglingChoice { step, target } => {
                write!(f, "choice in {step} targets missing step {target}")
            }
            Self::DanglingFreeText { step, target } => {
                write!(f, "free-text handler in {step} targets missing step {target}")
            }
            Self::ConflictingInput(id) => {
                write!(f, "step {id} offers both choices and free text")
            }
            Self::FreeTextWithoutHandler(id) => {
                write!(f, "step {id} requires free text but has no handler")
            }
        }
    }
}

/// Mapping from step id to step, plus the designated entry step.
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepGraph {
    entry: StepId,
    steps: HashMap<StepId, Step>,
    /// Ids that appeared more than once when the graph was built.
    #[serde(skip)]
    duplicates: BTreeSet<StepId>,
}

/// On-disk form: steps as a list, which reads better in hand-written JSON.
#[derive(Deserialize)]
struct GraphFile {
    entry: StepId,
    steps: Vec<Step>,
}

impl StepGraph {
    /// Build a graph from steps, keyed by their own ids.
    ///
    /// A repeated id keeps the last step and is reported by [`validate`].
    ///
    /// [`validate`]: StepGraph::validate
    pub fn new(entry: impl Into<StepId>, steps: impl IntoIterator<Item = Step>) -> Self {
        let mut map = HashMap::new();
        let mut duplicates = BTreeSet::new();
        for step in steps {
            if let Some(previous) = map.insert(step.id.clone(), step) {
                warn!(step = %previous.id, "Duplicate step id replaces earlier step");
                duplicates.insert(previous.id);
            }
        }
        Self {
            entry: entry.into(),
            steps: map,
            duplicates,
        }
    }

    /// Parse a graph from JSON.
    ///
    /// Accepts either `{"entry", "steps": [..]}` or the map form produced by
    /// serializing a `StepGraph`.
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("steps").is_some_and(|s| s.is_array()) {
            let file: GraphFile = serde_json::from_value(value)?;
            Ok(Self::new(file.entry, file.steps))
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Load a graph from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let json = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let graph = Self::from_json_str(&json)?;
        debug!(path = %path.display(), steps = graph.len(), "Loaded step graph");
        Ok(graph)
    }

    pub fn entry(&self) -> &StepId {
        &self.entry
    }

    pub fn get(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.steps.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in sorted order.
    pub fn ids(&self) -> Vec<&StepId> {
        let mut ids: Vec<_> = self.steps.keys().collect();
        ids.sort();
        ids
    }

    /// Collect every integrity issue, sorted by step id.
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();
        if !self.contains(&self.entry) {
            issues.push(GraphIssue::MissingEntry(self.entry.clone()));
        }
        issues.extend(self.duplicates.iter().cloned().map(GraphIssue::DuplicateStep));

        for key in self.ids() {
            let step = &self.steps[key];
            if &step.id != key {
                issues.push(GraphIssue::KeyMismatch {
                    key: key.clone(),
                    id: step.id.clone(),
                });
            }
            if step.requires_free_text && !step.choices.is_empty() {
                issues.push(GraphIssue::ConflictingInput(key.clone()));
            }
            if step.requires_free_text && step.on_free_text.is_none() {
                issues.push(GraphIssue::FreeTextWithoutHandler(key.clone()));
            }
            for choice in &step.choices {
                if !self.contains(&choice.target) {
                    issues.push(GraphIssue::DanglingChoice {
                        step: key.clone(),
                        target: choice.target.clone(),
                    });
                }
            }
            if let Some(handler) = &step.on_free_text {
                for target in handler.targets() {
                    if !self.contains(target) {
                        issues.push(GraphIssue::DanglingFreeText {
                            step: key.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        issues
    }

    /// Validate and turn any issue into an error.
    pub fn ensure_valid(&self) -> Result<(), GraphError> {
        let issues = self.validate();
        if issues.is_empty() {
            return Ok(());
        }
        Err(GraphError::Invalid(
            issues.iter().map(ToString::to_string).collect(),
        ))
    }

    /// Log every integrity issue without failing.
    pub fn warn_issues(&self) -> usize {
        let issues = self.validate();
        for issue in &issues {
            warn!(%issue, "Step graph integrity issue");
        }
        issues.len()
    }

    /// Steps reachable from the entry through choices and free-text targets.
    ///
    /// Targets missing from the graph are not included.
    pub fn reachable(&self) -> BTreeSet<StepId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        if self.contains(&self.entry) {
            queue.push_back(self.entry.clone());
        }

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(step) = self.get(&id) else {
                continue;
            };
            let next = step
                .choices
                .iter()
                .map(|c| &c.target)
                .chain(step.on_free_text.iter().flat_map(|h| h.targets()));
            for target in next {
                if self.contains(target) && !seen.contains(target) {
                    queue.push_back(target.clone());
                }
            }
        }
        seen
    }
}
