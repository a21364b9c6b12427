//! Scripted editing sessions.
//!
//! A scenario declares components, appends starting blocks and then replays
//! quick-entry steps against an [`EditorSession`]:
//!
//! ```json
//! {
//!   "components": { "Button1": "Button" },
//!   "blocks": [ { "type": "controls_if", "alias": "cond" } ],
//!   "steps": [ { "select": "cond" }, { "type": "true" }, "undo" ]
//! }
//! ```
//!
//! Nodes are referred to by block alias or by id (`"#3"` or `"3"`).

use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::editor::{EditorSession, InsertOutcome};
use crate::error::EditorError;
use crate::model::{BlockState, Node, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Component instance → component type.
    #[serde(default)]
    pub components: IndexMap<String, String>,
    #[serde(default)]
    pub blocks: Vec<BlockState>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Select a node by reference, or clear the selection with `null`.
    Select(Option<String>),
    /// Record the ranked options for a query without confirming.
    Query(String),
    /// Query and confirm the best match.
    Type(String),
    Escape,
    Undo,
    Redo,
    /// Delete a node by reference.
    Delete(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub matches: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<InsertOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceReport {
    pub components: IndexMap<String, String>,
    pub nodes: Vec<Node>,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub queries: Vec<QueryReport>,
    pub workspace: WorkspaceReport,
    pub selected: Option<NodeId>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Parse scenario")
    }

    pub fn from_json_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Read scenario {}", path))?;
        Self::from_json(&text).with_context(|| format!("Load scenario {}", path))
    }

    /// Set up `session` and replay the steps.
    ///
    /// Steps that reference unknown nodes are skipped with a warning; graph
    /// errors abort the run.
    pub fn run(&self, session: &mut EditorSession) -> Result<Report, EditorError> {
        for (instance, component_type) in &self.components {
            session.add_component(instance, component_type);
        }
        let mut aliases = IndexMap::new();
        for block in &self.blocks {
            session.workspace_mut().append_with_aliases(block, &mut aliases)?;
        }

        let mut queries = Vec::new();
        for step in &self.steps {
            match step {
                Step::Select(None) => session.select(None)?,
                Step::Select(Some(reference)) => match lookup(&aliases, reference) {
                    Some(id) if session.workspace().contains(id) => session.select(Some(id))?,
                    _ => warn!(reference = %reference, "select: unknown node"),
                },
                Step::Query(query) => {
                    let matches = session.on_query_changed(query);
                    queries.push(QueryReport {
                        query: query.clone(),
                        matches: matches.into_iter().map(|o| o.display_text).collect(),
                        inserted: None,
                    });
                }
                Step::Type(query) => {
                    let matches = session.on_query_changed(query);
                    let inserted = match matches.first() {
                        Some(option) => Some(session.on_confirm(option)?),
                        None => {
                            warn!(query = %query, "no option matches");
                            session.on_escape();
                            None
                        }
                    };
                    queries.push(QueryReport {
                        query: query.clone(),
                        matches: matches.into_iter().map(|o| o.display_text).collect(),
                        inserted,
                    });
                }
                Step::Escape => session.on_escape(),
                Step::Undo => {
                    if !session.undo()? {
                        info!("nothing to undo");
                    }
                }
                Step::Redo => {
                    if !session.redo()? {
                        info!("nothing to redo");
                    }
                }
                Step::Delete(reference) => match lookup(&aliases, reference) {
                    Some(id) if session.workspace().contains(id) => session.delete_node(id)?,
                    _ => warn!(reference = %reference, "delete: unknown node"),
                },
            }
        }

        let workspace = session.workspace();
        Ok(Report {
            queries,
            workspace: WorkspaceReport {
                components: workspace
                    .components()
                    .map(|(i, t)| (i.to_string(), t.to_string()))
                    .collect(),
                nodes: workspace.snapshot(),
            },
            selected: session.selection(),
        })
    }
}

/// Resolve an alias or a `#n` / `n` node id.
fn lookup(aliases: &IndexMap<String, NodeId>, reference: &str) -> Option<NodeId> {
    aliases.get(reference).copied().or_else(|| {
        reference
            .strip_prefix('#')
            .unwrap_or(reference)
            .parse()
            .ok()
            .map(NodeId)
    })
}
