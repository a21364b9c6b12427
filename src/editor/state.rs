//! Editor session.
//!
//! [`EditorSession`] is the entry point a host UI talks to. It owns the
//! workspace, the selection, the undo history and the option catalog, and
//! turns query-box events into graph edits:
//!
//! ```rust,ignore
//! let mut session = EditorSession::new(EditorConfig::default());
//! let options = session.on_query_changed("if");
//! let outcome = session.on_confirm(&options[0])?;
//! session.undo()?;
//! ```

use serde::Serialize;
use tracing::debug;

use super::adapter::BlockOption;
use super::catalog::{Catalog, Declarations};
use super::connect::{Attachment, resolve};
use super::matcher::match_options_limited;
use super::operations::EditHistory;
use super::selection::Selection;
use super::transaction::EditTransaction;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::model::NodeId;
use crate::workspace::Workspace;

/// Result of confirming an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// The created node, now selected.
    pub node: NodeId,
    /// Where it was attached; `None` when it was left standalone.
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    workspace: Workspace,
    selection: Selection,
    history: EditHistory,
    config: EditorConfig,
    /// Built lazily for the current declarations.
    catalog: Option<Catalog>,
    query: String,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_workspace(Workspace::default(), config)
    }

    pub fn with_workspace(workspace: Workspace, config: EditorConfig) -> Self {
        Self {
            workspace,
            selection: Selection::new(),
            history: EditHistory::new(config.history_depth),
            config,
            catalog: None,
            query: String::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Direct access to the graph, bypassing the undo history.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection.resolve(&self.workspace)
    }

    /// Select a node (or clear with `None`). Not recorded in the history.
    pub fn select(&mut self, node: Option<NodeId>) -> Result<(), EditorError> {
        if let Some(id) = node {
            if !self.workspace.contains(id) {
                return Err(EditorError::UnknownNode(id));
            }
        }
        self.selection.set(node);
        Ok(())
    }

    pub fn add_component(&mut self, instance: &str, component_type: &str) {
        self.workspace.add_component(instance, component_type);
    }

    /// The catalog for the current declarations, rebuilt if they changed.
    pub fn catalog(&mut self) -> &Catalog {
        let decls = Declarations::collect(&self.workspace, self.selection.resolve(&self.workspace));
        match self.catalog.take() {
            Some(catalog) if catalog.is_current(&decls) => self.catalog.insert(catalog),
            _ => {
                debug!("rebuilding option catalog");
                self.catalog
                    .insert(Catalog::build(decls, self.workspace.component_db()))
            }
        }
    }

    /// The text currently in the query box.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Rank the catalog against `query`.
    pub fn on_query_changed(&mut self, query: &str) -> Vec<BlockOption> {
        let limit = self.config.max_matches;
        let found = match_options_limited(self.catalog().options(), query, limit);
        self.query = query.to_string();
        found
    }

    /// Abandon the current query. The graph is not touched.
    pub fn on_escape(&mut self) {
        self.query.clear();
    }

    /// Create the block for `option`, connect it near the selection and select
    /// it, as one undo step.
    pub fn on_confirm(&mut self, option: &BlockOption) -> Result<InsertOutcome, EditorError> {
        let selected = self.selection.resolve(&self.workspace);
        let mut tx = EditTransaction::new(&mut self.workspace, &mut self.selection);
        let node = tx.instantiate(option)?;
        let attachment = resolve(tx.workspace(), node, selected, &self.config.connect);
        match &attachment {
            Some(a) => {
                debug!(node = %node, link = %a.link, rule = ?a.rule, "connecting new block");
                tx.attach(node, a.link.clone())?;
            }
            None => debug!(node = %node, "new block left standalone"),
        }
        tx.select(Some(node));
        tx.commit(&mut self.history);
        self.query.clear();
        Ok(InsertOutcome { node, attachment })
    }

    /// Query and confirm the best match in one go. `Ok(None)` when nothing
    /// matches.
    pub fn quick_insert(&mut self, query: &str) -> Result<Option<InsertOutcome>, EditorError> {
        match self.on_query_changed(query).into_iter().next() {
            Some(option) => self.on_confirm(&option).map(Some),
            None => {
                self.on_escape();
                Ok(None)
            }
        }
    }

    /// Delete a node and its socket subtree as one undo step.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), EditorError> {
        let mut tx = EditTransaction::new(&mut self.workspace, &mut self.selection);
        tx.delete_subtree(id)?;
        tx.commit(&mut self.history);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.history.undo(&mut self.workspace, &mut self.selection)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.history.redo(&mut self.workspace, &mut self.selection)
    }

    /// Clear the graph, selection, history and catalog. Declared components
    /// are kept.
    pub fn reset(&mut self) {
        self.workspace.clear();
        self.selection.clear();
        self.history.clear();
        self.catalog = None;
        self.query.clear();
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockState;

    #[test]
    fn catalog_is_cached_until_declarations_change() {
        let mut session = EditorSession::default();
        let before = session.catalog().len();
        assert_eq!(session.catalog().len(), before);

        session
            .workspace_mut()
            .append(&BlockState::new("global_declaration").with_field("NAME", "count"))
            .expect("append");
        assert_eq!(session.catalog().len(), before + 2);
        assert!(session.catalog().get("get global count").is_some());
    }

    #[test]
    fn escape_leaves_graph_alone() {
        let mut session = EditorSession::default();
        assert!(!session.on_query_changed("if").is_empty());
        assert_eq!(session.query(), "if");
        session.on_escape();
        assert_eq!(session.query(), "");
        assert!(session.workspace().is_empty());
    }

    #[test]
    fn confirm_selects_new_node_and_is_one_step() {
        let mut session = EditorSession::default();
        let outcome = session.quick_insert("if").expect("insert").expect("match");
        assert_eq!(session.selection(), Some(outcome.node));
        assert_eq!(outcome.attachment, None);
        assert_eq!(session.history().undo_len(), 1);
        assert!(session.undo().expect("undo"));
        assert!(session.workspace().is_empty());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn select_rejects_unknown_node() {
        let mut session = EditorSession::default();
        assert!(matches!(
            session.select(Some(NodeId(77))),
            Err(EditorError::UnknownNode(_))
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = EditorSession::default();
        session.quick_insert("while").expect("insert");
        session.reset();
        assert!(session.workspace().is_empty());
        assert_eq!(session.selection(), None);
        assert!(!session.history().can_undo());
        assert!(session.quick_insert("zzzzqqq").expect("insert").is_none());
    }
}
