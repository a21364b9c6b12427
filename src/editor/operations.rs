//! Undoable graph edits.
//!
//! Every change to the workspace or the selection goes through one of the
//! primitive functions below, which apply the change and return the
//! [`EditCommand`] describing it. [`EditHistory`] stores those commands and
//! undoes them by applying their inverse.

use tracing::{debug, warn};

use super::selection::Selection;
use crate::error::EditorError;
use crate::model::{Node, NodeId, ParentLink};
use crate::workspace::Workspace;

// ────────────────────────────────────────────────────────────────────────────
// Edit Command (undo/redo unit)
// ────────────────────────────────────────────────────────────────────────────

/// A single undoable edit.
///
/// Each variant captures enough state to reverse the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// A detached node was added.
    CreateNode { node: Box<Node> },
    /// A detached node was removed.
    DeleteNode { node: Box<Node> },
    /// A field changed value (`None` = absent).
    SetField {
        node: NodeId,
        name: String,
        old_value: Option<String>,
        new_value: Option<String>,
    },
    /// A node moved from one slot to another (`None` = standalone).
    Connect {
        child: NodeId,
        old_parent: Option<ParentLink>,
        new_parent: Option<ParentLink>,
    },
    /// The selection changed.
    Select {
        old: Option<NodeId>,
        new: Option<NodeId>,
    },
    /// Commands applied in order as one step.
    Batch(Vec<EditCommand>),
}

impl EditCommand {
    pub fn is_empty(&self) -> bool {
        matches!(self, EditCommand::Batch(cmds) if cmds.iter().all(EditCommand::is_empty))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Edit History (undo / redo stack)
// ────────────────────────────────────────────────────────────────────────────

/// Undo/redo history.
///
/// ```rust,ignore
/// let mut history = EditHistory::new(100);
/// let cmd = set_field(&mut workspace, id, "NUM", Some("42".into()))?;
/// history.push(cmd);
/// history.undo(&mut workspace, &mut selection)?; // NUM back to its old value
/// history.redo(&mut workspace, &mut selection)?; // NUM = 42 again
/// ```
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
    max_size: usize,
}

impl EditHistory {
    /// Create a new history with the given maximum undo depth.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Push a command onto the undo stack and clear the redo stack.
    /// Empty batches are ignored.
    pub fn push(&mut self, cmd: EditCommand) {
        if cmd.is_empty() {
            return;
        }
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last command. Returns `Ok(false)` when there is nothing to
    /// undo.
    pub fn undo(&mut self, workspace: &mut Workspace, selection: &mut Selection) -> Result<bool, EditorError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match apply_inverse(workspace, selection, &cmd) {
            Ok(forward) => {
                debug!("undo");
                self.redo_stack.push(forward);
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push(cmd);
                Err(e)
            }
        }
    }

    /// Redo the last undone command. Returns `Ok(false)` when there is
    /// nothing to redo.
    pub fn redo(&mut self, workspace: &mut Workspace, selection: &mut Selection) -> Result<bool, EditorError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match apply_inverse(workspace, selection, &cmd) {
            Ok(forward) => {
                debug!("redo");
                self.undo_stack.push(forward);
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(cmd);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Apply the inverse of `cmd`, returning the command that re-does it.
///
/// A batch is undone back to front. When one of its members fails, the
/// members already undone are re-applied before the error is returned.
pub fn apply_inverse(
    workspace: &mut Workspace,
    selection: &mut Selection,
    cmd: &EditCommand,
) -> Result<EditCommand, EditorError> {
    match cmd {
        EditCommand::CreateNode { node } => {
            let removed = workspace.remove_node(node.id)?;
            Ok(EditCommand::DeleteNode {
                node: Box::new(removed),
            })
        }
        EditCommand::DeleteNode { node } => {
            workspace.insert_node((**node).clone())?;
            Ok(EditCommand::CreateNode { node: node.clone() })
        }
        EditCommand::SetField {
            node,
            name,
            old_value,
            new_value,
        } => {
            workspace.set_field(*node, name, old_value.clone())?;
            Ok(EditCommand::SetField {
                node: *node,
                name: name.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            })
        }
        EditCommand::Connect {
            child,
            old_parent,
            new_parent,
        } => {
            move_node(workspace, *child, old_parent.as_ref())?;
            Ok(EditCommand::Connect {
                child: *child,
                old_parent: new_parent.clone(),
                new_parent: old_parent.clone(),
            })
        }
        EditCommand::Select { old, new } => {
            selection.set(*old);
            Ok(EditCommand::Select { old: *new, new: *old })
        }
        // Inverses are collected in the order they ran, so that undoing the
        // returned batch replays the recorded commands front to back.
        EditCommand::Batch(cmds) => {
            let mut inverses = Vec::with_capacity(cmds.len());
            for c in cmds.iter().rev() {
                match apply_inverse(workspace, selection, c) {
                    Ok(inverse) => inverses.push(inverse),
                    Err(e) => {
                        for done in inverses.iter().rev() {
                            if let Err(again) = apply_inverse(workspace, selection, done) {
                                warn!(error = %again, "could not restore state after failed undo");
                            }
                        }
                        return Err(e);
                    }
                }
            }
            Ok(EditCommand::Batch(inverses))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Primitive edits
// ────────────────────────────────────────────────────────────────────────────

/// Insert a detached node.
pub fn create_node(workspace: &mut Workspace, node: Node) -> Result<EditCommand, EditorError> {
    let snapshot = Box::new(node.clone());
    workspace.insert_node(node)?;
    Ok(EditCommand::CreateNode { node: snapshot })
}

/// Remove a detached node.
pub fn delete_node(workspace: &mut Workspace, id: NodeId) -> Result<EditCommand, EditorError> {
    let node = workspace.remove_node(id)?;
    Ok(EditCommand::DeleteNode { node: Box::new(node) })
}

/// Set or clear a field.
pub fn set_field(
    workspace: &mut Workspace,
    id: NodeId,
    name: &str,
    value: Option<String>,
) -> Result<EditCommand, EditorError> {
    let old_value = workspace.set_field(id, name, value.clone())?;
    Ok(EditCommand::SetField {
        node: id,
        name: name.to_string(),
        old_value,
        new_value: value,
    })
}

/// Move `child` into `link`, or make it standalone with `None`.
pub fn connect(
    workspace: &mut Workspace,
    child: NodeId,
    link: Option<ParentLink>,
) -> Result<EditCommand, EditorError> {
    let old_parent = move_node(workspace, child, link.as_ref())?;
    Ok(EditCommand::Connect {
        child,
        old_parent,
        new_parent: link,
    })
}

/// Change the selection.
pub fn select(selection: &mut Selection, node: Option<NodeId>) -> EditCommand {
    let old = selection.set(node);
    EditCommand::Select { old, new: node }
}

/// Detach `child` and attach it to `link`. On failure the node is put back
/// where it was.
fn move_node(
    workspace: &mut Workspace,
    child: NodeId,
    link: Option<&ParentLink>,
) -> Result<Option<ParentLink>, EditorError> {
    let old = workspace.disconnect(child)?;
    if let Some(link) = link {
        if let Err(e) = workspace.connect(child, link) {
            if let Some(old) = &old {
                workspace.connect(child, old)?;
            }
            return Err(e);
        }
    }
    Ok(old)
}
