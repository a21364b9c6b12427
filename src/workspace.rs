//! The program graph.
//!
//! [`Workspace`] owns every [`Node`] and keeps both directions of each
//! connection consistent: a socket's `target` / a statement's `next` on the
//! holder side, and [`Node::parent`] on the child side. All mutation goes
//! through a handful of primitives (`insert_node`, `remove_node`,
//! `set_field`, `connect`, `disconnect`) that the undo history can invert.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::block_types::{Shape, ShapeSource, block_definition};
use crate::components::{ComponentDatabase, ComponentType};
use crate::error::EditorError;
use crate::model::{BlockState, Mutation, Node, NodeId, ParentLink, Socket, SocketKind, field_value_text};
use crate::parser::parse_mutation;

/// Block kinds that declare procedures.
pub const PROCEDURE_DEFINITIONS: &[&str] = &["procedures_defnoreturn", "procedures_defreturn"];

#[derive(Debug, Clone)]
pub struct Workspace {
    nodes: IndexMap<NodeId, Node>,
    next_id: u32,
    /// Component instance name → component type name.
    components: IndexMap<String, String>,
    component_db: ComponentDatabase,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(ComponentDatabase::builtin().clone())
    }
}

impl Workspace {
    pub fn new(component_db: ComponentDatabase) -> Self {
        Self {
            nodes: IndexMap::new(),
            next_id: 1,
            components: IndexMap::new(),
            component_db,
        }
    }

    // ── Components ─────────────────────────────────────────────────────────

    pub fn component_db(&self) -> &ComponentDatabase {
        &self.component_db
    }

    /// Declare a component instance (e.g. `Button1` of type `Button`).
    pub fn add_component(&mut self, instance: &str, component_type: &str) {
        self.components
            .insert(instance.to_string(), component_type.to_string());
    }

    /// Declared component instances as `(instance, type)` pairs.
    pub fn components(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components.iter().map(|(i, t)| (i.as_str(), t.as_str()))
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes ordered by id, for comparing graph states.
    pub fn snapshot(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// The definition node of procedure `name`, if declared.
    pub fn procedure(&self, name: &str) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| PROCEDURE_DEFINITIONS.contains(&n.kind.as_str()) && n.field("NAME") == Some(name))
    }

    /// The node currently occupying the slot described by `link`.
    pub fn slot_target(&self, link: &ParentLink) -> Option<NodeId> {
        match link {
            ParentLink::Socket { parent, socket } => {
                self.node(*parent).and_then(|p| p.socket(socket)).and_then(|s| s.target)
            }
            ParentLink::Next { previous } => self.node(*previous).and_then(|p| p.next),
        }
    }

    /// Follow `next` connectors from `id` to the end of its chain.
    pub fn last_in_chain(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..self.nodes.len() {
            match self.node(current).and_then(|n| n.next) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// `id` and everything attached below it through sockets, parents before
    /// children. With `include_next` the statements following `id` in its
    /// chain (and their subtrees) are included as well.
    pub fn subtree(&self, id: NodeId, include_next: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            if include_next || current != id {
                if let Some(next) = node.next {
                    stack.push(next);
                }
            }
            stack.extend(node.sockets.iter().rev().filter_map(|s| s.target));
        }
        out
    }

    // ── Primitives ─────────────────────────────────────────────────────────

    /// Create a detached node of `kind` with default fields and the given
    /// structural state. The node gets a fresh id but is not inserted.
    pub fn build_node(&mut self, kind: &str, mutation: Mutation) -> Result<Node, EditorError> {
        let def = block_definition(kind).ok_or_else(|| EditorError::UnknownBlockType(kind.to_string()))?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let mut node = Node {
            id,
            kind: kind.to_string(),
            fields: def
                .default_fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            mutation,
            output: None,
            has_previous: false,
            has_next: false,
            next: None,
            sockets: Vec::new(),
            parent: None,
        };
        let shape = (def.shape)(&node, &*self);
        apply_shape(&mut node, shape);
        Ok(node)
    }

    /// Insert a detached node.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, EditorError> {
        if self.nodes.contains_key(&node.id) {
            return Err(EditorError::DuplicateNode(node.id));
        }
        if !node.is_detached() {
            return Err(EditorError::NotDetached(node.id));
        }
        let id = node.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node that has no parent, no children and no follower.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, EditorError> {
        let node = self.node(id).ok_or(EditorError::UnknownNode(id))?;
        if !node.is_detached() {
            return Err(EditorError::NotDetached(id));
        }
        self.nodes
            .shift_remove(&id)
            .ok_or(EditorError::UnknownNode(id))
    }

    /// Set (or with `None`, remove) a field and re-derive the node's shape.
    /// Returns the previous value.
    pub fn set_field(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<String>,
    ) -> Result<Option<String>, EditorError> {
        let mut updated = self.node(id).ok_or(EditorError::UnknownNode(id))?.clone();
        let old = match value {
            Some(v) => updated.fields.insert(name.to_string(), v),
            None => updated.fields.shift_remove(name),
        };
        let shape = self.shape_of(&updated)?;
        if !self.shape_fits(&updated, &shape) {
            return Err(EditorError::ShapeConflict {
                node: id,
                field: name.to_string(),
            });
        }
        apply_shape(&mut updated, shape);
        self.nodes.insert(id, updated);
        Ok(old)
    }

    /// Attach the detached-from-parent node `child` to the empty slot `link`.
    pub fn connect(&mut self, child: NodeId, link: &ParentLink) -> Result<(), EditorError> {
        let child_node = self.node(child).ok_or(EditorError::UnknownNode(child))?;
        let incompatible = |reason| EditorError::Incompatible {
            child,
            target: link.to_string(),
            reason,
        };
        if child_node.parent.is_some() {
            return Err(incompatible("node already has a parent"));
        }
        let holder = link.holder();
        let holder_node = self.node(holder).ok_or(EditorError::UnknownNode(holder))?;
        match link {
            ParentLink::Socket { socket, .. } => {
                let slot = holder_node.socket(socket).ok_or_else(|| EditorError::UnknownSocket {
                    node: holder,
                    socket: socket.clone(),
                })?;
                if slot.target.is_some() {
                    return Err(EditorError::Occupied(link.to_string()));
                }
                match slot.kind {
                    SocketKind::Value => match &child_node.output {
                        Some(output) if slot.check.accepts(output) => {}
                        Some(_) => return Err(incompatible("type check mismatch")),
                        None => return Err(incompatible("node has no output connector")),
                    },
                    SocketKind::Statement => {
                        if !child_node.has_previous {
                            return Err(incompatible("node has no previous connector"));
                        }
                    }
                }
            }
            ParentLink::Next { .. } => {
                if !holder_node.has_next {
                    return Err(incompatible("target has no next connector"));
                }
                if holder_node.next.is_some() {
                    return Err(EditorError::Occupied(link.to_string()));
                }
                if !child_node.has_previous {
                    return Err(incompatible("node has no previous connector"));
                }
            }
        }
        if self.subtree(child, true).contains(&holder) {
            return Err(incompatible("connection would create a cycle"));
        }

        match link {
            ParentLink::Socket { parent, socket } => {
                if let Some(slot) = self.nodes.get_mut(parent).and_then(|p| p.socket_mut(socket)) {
                    slot.target = Some(child);
                }
            }
            ParentLink::Next { previous } => {
                if let Some(p) = self.nodes.get_mut(previous) {
                    p.next = Some(child);
                }
            }
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(link.clone());
        }
        Ok(())
    }

    /// Detach `child` from its parent, returning the link it occupied.
    pub fn disconnect(&mut self, child: NodeId) -> Result<Option<ParentLink>, EditorError> {
        let node = self.node(child).ok_or(EditorError::UnknownNode(child))?;
        let Some(link) = node.parent.clone() else {
            return Ok(None);
        };
        match &link {
            ParentLink::Socket { parent, socket } => {
                if let Some(slot) = self.nodes.get_mut(parent).and_then(|p| p.socket_mut(socket)) {
                    slot.target = None;
                }
            }
            ParentLink::Next { previous } => {
                if let Some(p) = self.nodes.get_mut(previous) {
                    p.next = None;
                }
            }
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
        Ok(Some(link))
    }

    /// Remove every node. Declared components are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.next_id = 1;
    }

    // ── Tree construction ──────────────────────────────────────────────────

    /// Build a node tree from a [`BlockState`] without recording history.
    ///
    /// A failure part-way leaves the already created nodes in place.
    pub fn append(&mut self, state: &BlockState) -> Result<NodeId, EditorError> {
        let mut aliases = IndexMap::new();
        self.append_with_aliases(state, &mut aliases)
    }

    /// Like [`append`](Self::append), recording `alias → id` for every
    /// aliased block in the tree.
    pub fn append_with_aliases(
        &mut self,
        state: &BlockState,
        aliases: &mut IndexMap<String, NodeId>,
    ) -> Result<NodeId, EditorError> {
        let mutation = match &state.extra_state {
            Some(text) => parse_mutation(text)?,
            None => Mutation::default(),
        };
        let node = self.build_node(&state.kind, mutation)?;
        let id = self.insert_node(node)?;
        for (name, value) in &state.fields {
            self.set_field(id, name, Some(field_value_text(value)))?;
        }
        for (socket, input) in &state.inputs {
            let child = self.append_with_aliases(&input.block, aliases)?;
            self.connect(
                child,
                &ParentLink::Socket {
                    parent: id,
                    socket: socket.clone(),
                },
            )?;
        }
        if let Some(next) = &state.next {
            let child = self.append_with_aliases(&next.block, aliases)?;
            self.connect(child, &ParentLink::Next { previous: id })?;
        }
        if let Some(alias) = &state.alias {
            aliases.insert(alias.clone(), id);
        }
        Ok(id)
    }

    // ── Shape handling ─────────────────────────────────────────────────────

    fn shape_of(&self, node: &Node) -> Result<Shape, EditorError> {
        let def = block_definition(&node.kind)
            .ok_or_else(|| EditorError::UnknownBlockType(node.kind.clone()))?;
        Ok((def.shape)(node, self))
    }

    /// True when `shape` keeps every existing connection of `node` valid.
    fn shape_fits(&self, node: &Node, shape: &Shape) -> bool {
        let output_of = |id: NodeId| self.node(id).and_then(|c| c.output.clone());
        for socket in node.sockets.iter().filter(|s| s.target.is_some()) {
            let Some(spec) = shape
                .sockets
                .iter()
                .find(|s| s.name == socket.name && s.kind == socket.kind)
            else {
                return false;
            };
            if spec.kind == SocketKind::Value {
                let compatible = socket
                    .target
                    .and_then(output_of)
                    .is_some_and(|out| spec.check.accepts(&out));
                if !compatible {
                    return false;
                }
            }
        }
        if node.next.is_some() && !shape.has_next {
            return false;
        }
        match &node.parent {
            Some(ParentLink::Socket { parent, socket }) => {
                let slot = self.node(*parent).and_then(|p| p.socket(socket));
                match slot.map(|s| (s.kind, &s.check)) {
                    Some((SocketKind::Value, check)) => {
                        shape.output.as_ref().is_some_and(|out| check.accepts(out))
                    }
                    Some((SocketKind::Statement, _)) => shape.has_previous,
                    None => false,
                }
            }
            Some(ParentLink::Next { .. }) => shape.has_previous,
            None => true,
        }
    }
}

impl ShapeSource for Workspace {
    fn procedure_args(&self, name: &str) -> Option<Vec<String>> {
        self.procedure(name).map(|n| n.mutation.args.clone())
    }

    fn component_type(&self, name: &str) -> Option<&ComponentType> {
        self.component_db.get(name)
    }
}

/// Replace the connectors of `node` with `shape`, carrying over the targets
/// of sockets that keep their name and kind.
fn apply_shape(node: &mut Node, shape: Shape) {
    let previous: Vec<Socket> = std::mem::take(&mut node.sockets);
    node.sockets = shape
        .sockets
        .into_iter()
        .map(|spec| {
            let target = previous
                .iter()
                .find(|s| s.name == spec.name && s.kind == spec.kind)
                .and_then(|s| s.target);
            Socket {
                name: spec.name,
                kind: spec.kind,
                check: spec.check,
                target,
            }
        })
        .collect();
    node.output = shape.output;
    node.has_previous = shape.has_previous;
    node.has_next = shape.has_next;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn if_with_condition(ws: &mut Workspace) -> (NodeId, NodeId) {
        let state = BlockState::new("controls_if").with_input(
            "IF0",
            BlockState::new("logic_boolean").with_field("BOOL", "TRUE"),
        );
        let if_id = ws.append(&state).expect("append");
        let cond = ws
            .node(if_id)
            .and_then(|n| n.socket("IF0"))
            .and_then(|s| s.target)
            .expect("condition");
        (if_id, cond)
    }

    #[test]
    fn append_links_both_directions() {
        let mut ws = Workspace::default();
        let (if_id, cond) = if_with_condition(&mut ws);
        assert_eq!(ws.len(), 2);
        assert_eq!(
            ws.node(cond).and_then(|n| n.parent.clone()),
            Some(ParentLink::Socket {
                parent: if_id,
                socket: "IF0".to_string()
            })
        );
    }

    #[test]
    fn connect_rejects_type_mismatch_and_occupied() {
        let mut ws = Workspace::default();
        let (if_id, _) = if_with_condition(&mut ws);
        let num = ws.append(&BlockState::new("math_number")).expect("append");
        let link = ParentLink::Socket {
            parent: if_id,
            socket: "IF0".to_string(),
        };
        assert!(matches!(ws.connect(num, &link), Err(EditorError::Occupied(_))));

        let neg = ws.append(&BlockState::new("logic_negate")).expect("append");
        let bool_slot = ParentLink::Socket {
            parent: neg,
            socket: "BOOL".to_string(),
        };
        assert!(matches!(
            ws.connect(num, &bool_slot),
            Err(EditorError::Incompatible { .. })
        ));
    }

    #[test]
    fn connect_rejects_cycles() {
        let mut ws = Workspace::default();
        let a = ws.append(&BlockState::new("logic_negate")).expect("append");
        let b = ws.append(&BlockState::new("logic_negate")).expect("append");
        ws.connect(b, &ParentLink::Socket { parent: a, socket: "BOOL".to_string() })
            .expect("connect");
        let err = ws.connect(a, &ParentLink::Socket { parent: b, socket: "BOOL".to_string() });
        assert!(matches!(err, Err(EditorError::Incompatible { .. })));
    }

    #[test]
    fn disconnect_reopens_slot() {
        let mut ws = Workspace::default();
        let (if_id, cond) = if_with_condition(&mut ws);
        let link = ws.disconnect(cond).expect("disconnect");
        assert!(link.is_some());
        assert_eq!(ws.node(if_id).and_then(|n| n.socket("IF0")).and_then(|s| s.target), None);
        assert!(ws.node(cond).is_some_and(|n| n.parent.is_none()));
    }

    #[test]
    fn remove_requires_detached() {
        let mut ws = Workspace::default();
        let (if_id, cond) = if_with_condition(&mut ws);
        assert!(matches!(ws.remove_node(if_id), Err(EditorError::NotDetached(_))));
        ws.disconnect(cond).expect("disconnect");
        ws.remove_node(cond).expect("remove");
        ws.remove_node(if_id).expect("remove");
        assert!(ws.is_empty());
    }

    #[test]
    fn set_field_refuses_to_drop_connected_socket() {
        let mut ws = Workspace::default();
        let split = ws
            .append(&BlockState::new("text_split").with_input("AT", BlockState::new("text")))
            .expect("append");
        let err = ws.set_field(split, "OP", Some("SPLITATANY".to_string()));
        assert!(matches!(err, Err(EditorError::ShapeConflict { .. })));
        assert_eq!(ws.node(split).and_then(|n| n.field("OP")), Some("SPLIT"));
    }

    #[test]
    fn subtree_and_chain_helpers() {
        let mut ws = Workspace::default();
        let state = BlockState::new("lexical_variable_set")
            .with_input("VALUE", BlockState::new("math_number"))
            .with_next(BlockState::new("controls_if"));
        let first = ws.append(&state).expect("append");
        assert_eq!(ws.subtree(first, false).len(), 2);
        assert_eq!(ws.subtree(first, true).len(), 3);
        let last = ws.last_in_chain(first);
        assert_eq!(ws.node(last).map(|n| n.kind.as_str()), Some("controls_if"));
    }

    #[test]
    fn procedure_call_shape_uses_definition() {
        let mut ws = Workspace::default();
        ws.append(
            &BlockState::new("procedures_defnoreturn")
                .with_field("NAME", "myProcedure")
                .with_extra_state(r#"<mutation><arg name="myParam"></arg></mutation>"#),
        )
        .expect("append");
        let mut mutation = Mutation::default();
        mutation
            .attributes
            .insert("name".to_string(), "myProcedure".to_string());
        let call = ws.build_node("procedures_callnoreturn", mutation).expect("build");
        assert!(call.socket("ARG0").is_some());
    }
}
