//! The editor's single-node selection.

use serde::Serialize;

use crate::model::NodeId;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    selected: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<NodeId> {
        self.selected
    }

    /// Replace the selection, returning the previous one.
    pub fn set(&mut self, node: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.selected, node)
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// The selected node, if it still exists in `workspace`.
    pub fn resolve(&self, workspace: &Workspace) -> Option<NodeId> {
        self.selected.filter(|id| workspace.contains(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_returns_previous() {
        let mut sel = Selection::new();
        assert_eq!(sel.set(Some(NodeId(3))), None);
        assert!(sel.is_selected(NodeId(3)));
        assert_eq!(sel.set(None), Some(NodeId(3)));
        assert_eq!(sel.get(), None);
    }

    #[test]
    fn resolve_drops_missing_nodes() {
        let ws = Workspace::default();
        let mut sel = Selection::new();
        sel.set(Some(NodeId(9)));
        assert_eq!(sel.resolve(&ws), None);
    }
}
