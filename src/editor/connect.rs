//! Choosing where a freshly created node attaches.
//!
//! The resolver only reads the workspace. It proposes a [`ParentLink`] for the
//! new node relative to the selected node; the transaction performs the
//! attachment (including moving a displaced follower behind the new node).

use serde::Serialize;

use crate::config::ConnectOptions;
use crate::model::{Node, NodeId, ParentLink, SocketKind, TypeCheck};
use crate::workspace::Workspace;

/// Which resolution rule produced an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionRule {
    /// Value node into a free value socket of the selected node.
    ValueSocket,
    /// Value node into a free value socket of an ancestor of the selection.
    InwardReattach,
    /// Statement node into a free statement socket of the selected node.
    StatementSocket,
    /// Statement node after the selected statement.
    AfterSelected,
    /// Statement node after the statement enclosing the selected value.
    AfterEnclosing,
}

/// A proposed connection for a new node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub link: ParentLink,
    pub rule: ConnectionRule,
}

impl Attachment {
    fn new(link: ParentLink, rule: ConnectionRule) -> Self {
        Self { link, rule }
    }
}

/// Decide where `new` attaches given the current selection.
/// `None` means the node stays standalone.
pub fn resolve(
    workspace: &Workspace,
    new: NodeId,
    selected: Option<NodeId>,
    options: &ConnectOptions,
) -> Option<Attachment> {
    let new_node = workspace.node(new)?;
    let selected = workspace.node(selected?)?;
    if selected.id == new {
        return None;
    }

    if let Some(output) = &new_node.output {
        if let Some(socket) = free_value_socket(selected, output) {
            return Some(Attachment::new(
                ParentLink::Socket {
                    parent: selected.id,
                    socket,
                },
                ConnectionRule::ValueSocket,
            ));
        }
        return reattach_inward(workspace, selected, output, options);
    }

    if !new_node.has_previous {
        return None;
    }
    if let Some(socket) = selected
        .sockets
        .iter()
        .find(|s| s.kind == SocketKind::Statement && s.target.is_none())
    {
        return Some(Attachment::new(
            ParentLink::Socket {
                parent: selected.id,
                socket: socket.name.clone(),
            },
            ConnectionRule::StatementSocket,
        ));
    }
    if selected.has_next {
        return Some(Attachment::new(
            ParentLink::Next {
                previous: selected.id,
            },
            ConnectionRule::AfterSelected,
        ));
    }
    if selected.is_value() {
        let enclosing = enclosing_statement(workspace, selected.id, options.max_walk_depth)?;
        if workspace.node(enclosing).is_some_and(|n| n.has_next) {
            return Some(Attachment::new(
                ParentLink::Next {
                    previous: enclosing,
                },
                ConnectionRule::AfterEnclosing,
            ));
        }
    }
    None
}

/// First empty value socket of `node` whose check accepts `output`.
fn free_value_socket(node: &Node, output: &TypeCheck) -> Option<String> {
    node.sockets
        .iter()
        .find(|s| s.kind == SocketKind::Value && s.target.is_none() && s.check.accepts(output))
        .map(|s| s.name.clone())
}

fn reattach_inward(
    workspace: &Workspace,
    selected: &Node,
    output: &TypeCheck,
    options: &ConnectOptions,
) -> Option<Attachment> {
    let mut current = selected;
    for _ in 0..options.value_reattach_depth.min(options.max_walk_depth) {
        let Some(ParentLink::Socket { parent, socket }) = &current.parent else {
            return None;
        };
        let holder = workspace.node(*parent)?;
        if holder.output.is_none() && !options.reattach_into_statements {
            return None;
        }
        let through = holder.socket(socket).map(|s| s.kind)?;
        if through == SocketKind::Statement && !options.reattach_through_statement_sockets {
            return None;
        }
        if let Some(socket) = free_value_socket(holder, output) {
            return Some(Attachment::new(
                ParentLink::Socket {
                    parent: holder.id,
                    socket,
                },
                ConnectionRule::InwardReattach,
            ));
        }
        current = holder;
    }
    None
}

/// The nearest node at or above `id` that has no output connector,
/// looking at most `max_depth` levels up.
pub fn enclosing_statement(workspace: &Workspace, id: NodeId, max_depth: usize) -> Option<NodeId> {
    let mut current = id;
    for _ in 0..=max_depth {
        let node = workspace.node(current)?;
        if node.output.is_none() {
            return Some(current);
        }
        current = node.parent.as_ref()?.holder();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockState, Mutation};
    use indexmap::IndexMap;

    fn fresh(ws: &mut Workspace, kind: &str) -> NodeId {
        let node = ws.build_node(kind, Mutation::default()).expect("build");
        ws.insert_node(node).expect("insert")
    }

    fn aliased(kind: &str, alias: &str) -> BlockState {
        let mut state = BlockState::new(kind);
        state.alias = Some(alias.to_string());
        state
    }

    #[test]
    fn no_selection_is_standalone() {
        let mut ws = Workspace::default();
        let new = fresh(&mut ws, "logic_boolean");
        assert_eq!(resolve(&ws, new, None, &ConnectOptions::default()), None);
    }

    #[test]
    fn top_level_node_is_standalone() {
        let mut ws = Workspace::default();
        let sel = fresh(&mut ws, "controls_if");
        let new = fresh(&mut ws, "global_declaration");
        assert_eq!(resolve(&ws, new, Some(sel), &ConnectOptions::default()), None);
    }

    #[test]
    fn value_skips_incompatible_sockets() {
        let mut ws = Workspace::default();
        let sel = fresh(&mut ws, "text_split");
        let new = fresh(&mut ws, "math_number");
        assert_eq!(resolve(&ws, new, Some(sel), &ConnectOptions::default()), None);

        let text = fresh(&mut ws, "text");
        let got = resolve(&ws, text, Some(sel), &ConnectOptions::default()).expect("attach");
        assert_eq!(
            got.link,
            ParentLink::Socket {
                parent: sel,
                socket: "TEXT".to_string()
            }
        );
        assert_eq!(got.rule, ConnectionRule::ValueSocket);
    }

    #[test]
    fn inward_reattach_depth_is_configurable() {
        let mut ws = Workspace::default();
        let mut aliases = IndexMap::new();
        let state = BlockState::new("math_add").with_input("NUM0", aliased("math_number", "n"));
        let add = ws.append_with_aliases(&state, &mut aliases).expect("append");
        let new = fresh(&mut ws, "math_number");

        let got = resolve(&ws, new, Some(aliases["n"]), &ConnectOptions::default()).expect("attach");
        assert_eq!(got.rule, ConnectionRule::InwardReattach);
        assert_eq!(got.link.holder(), add);

        let off = ConnectOptions {
            value_reattach_depth: 0,
            ..ConnectOptions::default()
        };
        assert_eq!(resolve(&ws, new, Some(aliases["n"]), &off), None);
    }

    #[test]
    fn inward_reattach_through_statement_socket_is_gated() {
        let mut ws = Workspace::default();
        let mut aliases = IndexMap::new();
        let state = BlockState::new("controls_while").with_input("DO", aliased("lexical_variable_set", "set"));
        ws.append_with_aliases(&state, &mut aliases).expect("append");
        ws.set_field(aliases["set"], "VAR", Some("global x".to_string()))
            .expect("field");
        let filler = fresh(&mut ws, "math_number");
        ws.connect(
            filler,
            &ParentLink::Socket {
                parent: aliases["set"],
                socket: "VALUE".to_string(),
            },
        )
        .expect("connect");
        let new = fresh(&mut ws, "logic_boolean");

        assert_eq!(resolve(&ws, new, Some(aliases["set"]), &ConnectOptions::default()), None);
        let through = ConnectOptions {
            reattach_through_statement_sockets: true,
            reattach_into_statements: true,
            ..ConnectOptions::default()
        };
        let got = resolve(&ws, new, Some(aliases["set"]), &through).expect("attach");
        assert_eq!(
            got.link,
            ParentLink::Socket {
                parent: ws.node(aliases["set"]).and_then(|n| n.parent.as_ref()).map(|p| p.holder()).expect("parent"),
                socket: "TEST".to_string()
            }
        );
    }

    #[test]
    fn value_under_statement_stays_standalone() {
        let mut ws = Workspace::default();
        let mut aliases = IndexMap::new();
        let state = BlockState::new("controls_forRange").with_input("START", aliased("math_number", "start"));
        let for_id = ws.append_with_aliases(&state, &mut aliases).expect("append");
        let new = fresh(&mut ws, "math_number");

        assert_eq!(resolve(&ws, new, Some(aliases["start"]), &ConnectOptions::default()), None);

        let into = ConnectOptions {
            reattach_into_statements: true,
            ..ConnectOptions::default()
        };
        let got = resolve(&ws, new, Some(aliases["start"]), &into).expect("attach");
        assert_eq!(
            got.link,
            ParentLink::Socket {
                parent: for_id,
                socket: "END".to_string()
            }
        );
    }

    #[test]
    fn statement_prefers_open_socket_then_next() {
        let mut ws = Workspace::default();
        let if_id = fresh(&mut ws, "controls_if");
        let new = fresh(&mut ws, "controls_while");
        let got = resolve(&ws, new, Some(if_id), &ConnectOptions::default()).expect("attach");
        assert_eq!(got.rule, ConnectionRule::StatementSocket);

        let set = fresh(&mut ws, "lexical_variable_set");
        let got = resolve(&ws, new, Some(set), &ConnectOptions::default()).expect("attach");
        assert_eq!(got.link, ParentLink::Next { previous: set });
        assert_eq!(got.rule, ConnectionRule::AfterSelected);
    }

    #[test]
    fn statement_after_enclosing_of_selected_value() {
        let mut ws = Workspace::default();
        let mut aliases = IndexMap::new();
        let state = BlockState::new("controls_if").with_input(
            "IF0",
            BlockState::new("logic_negate").with_input("BOOL", aliased("logic_boolean", "deep")),
        );
        let if_id = ws.append_with_aliases(&state, &mut aliases).expect("append");
        let new = fresh(&mut ws, "controls_if");
        let got = resolve(&ws, new, Some(aliases["deep"]), &ConnectOptions::default()).expect("attach");
        assert_eq!(got.link, ParentLink::Next { previous: if_id });
        assert_eq!(got.rule, ConnectionRule::AfterEnclosing);

        assert_eq!(enclosing_statement(&ws, aliases["deep"], 1), None);
        assert_eq!(enclosing_statement(&ws, aliases["deep"], 2), Some(if_id));
    }

    #[test]
    fn detached_value_has_no_enclosing_statement() {
        let mut ws = Workspace::default();
        let value = fresh(&mut ws, "logic_boolean");
        let new = fresh(&mut ws, "controls_if");
        assert_eq!(resolve(&ws, new, Some(value), &ConnectOptions::default()), None);
    }
}
