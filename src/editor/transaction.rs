//! Grouping of primitive edits into one undo step.
//!
//! An [`EditTransaction`] borrows the workspace and the selection, records
//! every primitive it performs, and on [`commit`](EditTransaction::commit)
//! pushes them to the history as a single [`EditCommand::Batch`]. A
//! transaction that is dropped without being committed undoes its edits.

use tracing::{debug, warn};

use super::adapter::BlockOption;
use super::operations::{self, EditCommand, EditHistory, apply_inverse};
use super::selection::Selection;
use crate::error::EditorError;
use crate::model::{Mutation, NodeId, ParentLink};
use crate::parser::parse_mutation;
use crate::workspace::Workspace;

pub struct EditTransaction<'a> {
    workspace: &'a mut Workspace,
    selection: &'a mut Selection,
    commands: Vec<EditCommand>,
}

impl<'a> EditTransaction<'a> {
    pub fn new(workspace: &'a mut Workspace, selection: &'a mut Selection) -> Self {
        Self {
            workspace,
            selection,
            commands: Vec::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &*self.workspace
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection.get()
    }

    /// Number of primitives recorded so far.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Create a standalone node from `option`: structural state first, then
    /// field values (each of which may reshape the node).
    pub fn instantiate(&mut self, option: &BlockOption) -> Result<NodeId, EditorError> {
        let mutation = match &option.extra_state {
            Some(text) => parse_mutation(text)?,
            None => Mutation::default(),
        };
        let node = self.workspace.build_node(&option.block_type, mutation)?;
        let id = node.id;
        let cmd = operations::create_node(self.workspace, node)?;
        self.commands.push(cmd);
        if let Some(fields) = &option.field_values {
            for (name, value) in fields {
                let cmd = operations::set_field(self.workspace, id, name, Some(value.clone()))?;
                self.commands.push(cmd);
            }
        }
        Ok(id)
    }

    /// Set or clear a field of `id`.
    pub fn set_field(&mut self, id: NodeId, name: &str, value: Option<String>) -> Result<(), EditorError> {
        let cmd = operations::set_field(self.workspace, id, name, value)?;
        self.commands.push(cmd);
        Ok(())
    }

    /// Attach `child` to `link`.
    ///
    /// A node already in the slot is moved out first. If it is a statement it
    /// is reattached after the last statement of `child`'s chain; otherwise
    /// (or if that statement has no next connector) it is left standalone.
    pub fn attach(&mut self, child: NodeId, link: ParentLink) -> Result<(), EditorError> {
        let displaced = self.workspace.slot_target(&link);
        if let Some(d) = displaced {
            self.move_to(d, None)?;
        }
        self.move_to(child, Some(link))?;
        if let Some(d) = displaced {
            let tail = self.workspace.last_in_chain(child);
            let tail_has_next = self.workspace.node(tail).is_some_and(|n| n.has_next);
            let is_statement = self.workspace.node(d).is_some_and(|n| n.has_previous);
            if tail_has_next && is_statement {
                self.move_to(d, Some(ParentLink::Next { previous: tail }))?;
            } else {
                debug!(node = %d, "displaced node left standalone");
            }
        }
        Ok(())
    }

    /// Make `child` standalone.
    pub fn detach(&mut self, child: NodeId) -> Result<(), EditorError> {
        self.move_to(child, None)
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        if self.selection.get() != node {
            let cmd = operations::select(self.selection, node);
            self.commands.push(cmd);
        }
    }

    /// Delete `id` together with everything in its sockets.
    ///
    /// The statement following `id` takes its place, and a selection inside
    /// the deleted subtree is cleared.
    pub fn delete_subtree(&mut self, id: NodeId) -> Result<(), EditorError> {
        let node = self.workspace.node(id).ok_or(EditorError::UnknownNode(id))?;
        let parent = node.parent.clone();
        let follower = node.next;
        let doomed = self.workspace.subtree(id, false);

        if self.selection.get().is_some_and(|s| doomed.contains(&s)) {
            self.select(None);
        }
        if let Some(f) = follower {
            self.move_to(f, None)?;
        }
        if parent.is_some() {
            self.move_to(id, None)?;
        }
        // Children come after their parents in `doomed`.
        for &n in doomed.iter().rev() {
            if n != id {
                self.move_to(n, None)?;
            }
            let cmd = operations::delete_node(self.workspace, n)?;
            self.commands.push(cmd);
        }
        if let (Some(f), Some(link)) = (follower, parent) {
            self.move_to(f, Some(link))?;
        }
        Ok(())
    }

    /// Push the recorded edits to `history` as one step.
    pub fn commit(mut self, history: &mut EditHistory) {
        let commands = std::mem::take(&mut self.commands);
        debug!(edits = commands.len(), "commit");
        history.push(EditCommand::Batch(commands));
    }

    /// Undo the recorded edits.
    pub fn rollback(mut self) {
        self.undo_recorded();
    }

    fn move_to(&mut self, child: NodeId, link: Option<ParentLink>) -> Result<(), EditorError> {
        let already_there = self
            .workspace
            .node(child)
            .is_some_and(|n| n.parent == link);
        if !already_there {
            let cmd = operations::connect(self.workspace, child, link)?;
            self.commands.push(cmd);
        }
        Ok(())
    }

    fn undo_recorded(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        let batch = EditCommand::Batch(std::mem::take(&mut self.commands));
        if let Err(e) = apply_inverse(self.workspace, self.selection, &batch) {
            warn!(error = %e, "rollback failed");
        }
    }
}

impl Drop for EditTransaction<'_> {
    fn drop(&mut self) {
        self.undo_recorded();
    }
}
