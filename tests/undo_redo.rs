use typeblock::{BlockState, ConnectOptions, EditorConfig, EditorSession, NodeId};

fn insert(session: &mut EditorSession, text: &str) -> NodeId {
    session
        .quick_insert(text)
        .expect("insert")
        .unwrap_or_else(|| panic!("no option for {:?}", text))
        .node
}

#[test]
fn undo_create_number_block() {
    let mut s = EditorSession::default();
    insert(&mut s, "42");
    assert_eq!(s.workspace().len(), 1);
    assert!(s.undo().expect("undo"));
    assert!(s.workspace().is_empty());
    assert_eq!(s.selection(), None);
}

#[test]
fn undo_create_block_with_value_connection() {
    let mut s = EditorSession::default();
    let if_id = s.workspace_mut().append(&BlockState::new("controls_if")).expect("append");
    s.select(Some(if_id)).expect("select");
    insert(&mut s, "true");

    assert!(s.undo().expect("undo"));
    let if_node = s.workspace().node(if_id).expect("if");
    assert_eq!(if_node.socket("IF0").and_then(|sk| sk.target), None);
    assert_eq!(s.workspace().len(), 1);
    assert_eq!(s.selection(), Some(if_id));
}

#[test]
fn undo_create_block_with_statement_connection() {
    let mut s = EditorSession::default();
    s.workspace_mut()
        .append(&BlockState::new("global_declaration").with_field("NAME", "myVar"))
        .expect("append");
    let set = s
        .workspace_mut()
        .append(&BlockState::new("lexical_variable_set").with_field("VAR", "global myVar"))
        .expect("append");
    s.select(Some(set)).expect("select");
    insert(&mut s, "if");

    assert!(s.undo().expect("undo"));
    assert_eq!(s.workspace().node(set).and_then(|n| n.next), None);
}

#[test]
fn redo_reproduces_graph_and_selection() {
    let mut s = EditorSession::default();
    let outer = s.workspace_mut().append(&BlockState::new("controls_while")).expect("append");
    s.select(Some(outer)).expect("select");
    insert(&mut s, "if else");
    insert(&mut s, "not");
    insert(&mut s, "false");

    let after = s.workspace().snapshot();
    let selected = s.selection();

    for _ in 0..3 {
        assert!(s.undo().expect("undo"));
    }
    assert_eq!(s.workspace().len(), 1);
    assert!(!s.undo().expect("nothing left"));

    for _ in 0..3 {
        assert!(s.redo().expect("redo"));
    }
    assert_eq!(s.workspace().snapshot(), after);
    assert_eq!(s.selection(), selected);
    assert!(!s.redo().expect("nothing left"));
}

#[test]
fn new_edit_discards_redo() {
    let mut s = EditorSession::default();
    insert(&mut s, "while");
    s.undo().expect("undo");
    assert!(s.history().can_redo());
    insert(&mut s, "if");
    assert!(!s.history().can_redo());
}

#[test]
fn delete_is_one_step_and_heals_chain() {
    let mut s = EditorSession::default();
    let first = s
        .workspace_mut()
        .append(
            &BlockState::new("controls_while")
                .with_input("TEST", BlockState::new("logic_boolean"))
                .with_next(BlockState::new("controls_if")),
        )
        .expect("append");
    let second = s.workspace().node(first).and_then(|n| n.next).expect("second");
    let host = s.workspace_mut().append(&BlockState::new("controls_while")).expect("append");
    s.select(Some(host)).expect("select");
    insert(&mut s, "for each number");
    let loop_id = s.selection().expect("loop");

    // Move the first chain under the new loop by hand, then delete its head.
    s.workspace_mut().connect(first, &typeblock::ParentLink::Socket {
        parent: loop_id,
        socket: "DO".to_string(),
    })
    .expect("connect");
    let before = s.workspace().snapshot();
    s.delete_node(first).expect("delete");

    assert_eq!(
        s.workspace().node(loop_id).and_then(|n| n.socket("DO")).and_then(|sk| sk.target),
        Some(second)
    );
    assert_eq!(s.workspace().len(), before.len() - 2);

    assert!(s.undo().expect("undo"));
    assert_eq!(s.workspace().snapshot(), before);
}

#[test]
fn deleting_selected_node_clears_selection() {
    let mut s = EditorSession::default();
    let id = insert(&mut s, "while");
    s.delete_node(id).expect("delete");
    assert_eq!(s.selection(), None);
    s.undo().expect("undo");
    assert_eq!(s.selection(), Some(id));
}

#[test]
fn inward_reattachment_can_be_disabled() {
    let config = EditorConfig {
        connect: ConnectOptions {
            value_reattach_depth: 0,
            ..ConnectOptions::default()
        },
        ..EditorConfig::default()
    };
    let mut s = EditorSession::new(config);
    let add = s
        .workspace_mut()
        .append(&BlockState::new("math_add").with_input("NUM0", BlockState::new("math_number")))
        .expect("append");
    let zero = s.workspace().node(add).and_then(|n| n.socket("NUM0")).and_then(|sk| sk.target).expect("NUM0");
    s.select(Some(zero)).expect("select");
    let outcome = s.quick_insert("5").expect("insert").expect("match");
    assert_eq!(outcome.attachment, None);
    assert_eq!(s.workspace().node(add).and_then(|n| n.socket("NUM1")).and_then(|sk| sk.target), None);
}

#[test]
fn deeper_reattachment_reaches_grandparent() {
    let config = EditorConfig {
        connect: ConnectOptions {
            value_reattach_depth: 2,
            ..ConnectOptions::default()
        },
        ..EditorConfig::default()
    };
    let mut s = EditorSession::new(config);
    let outer = s
        .workspace_mut()
        .append(
            &BlockState::new("math_add").with_input(
                "NUM0",
                BlockState::new("math_subtract")
                    .with_input("A", BlockState::new("math_number"))
                    .with_input("B", BlockState::new("math_number")),
            ),
        )
        .expect("append");
    let sub = s.workspace().node(outer).and_then(|n| n.socket("NUM0")).and_then(|sk| sk.target).expect("sub");
    let a = s.workspace().node(sub).and_then(|n| n.socket("A")).and_then(|sk| sk.target).expect("A");
    s.select(Some(a)).expect("select");
    let new = insert(&mut s, "3");
    assert_eq!(
        s.workspace().node(outer).and_then(|n| n.socket("NUM1")).and_then(|sk| sk.target),
        Some(new)
    );
}
