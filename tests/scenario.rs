use camino::Utf8PathBuf;
use std::io::Write;

use typeblock::components::ComponentDatabase;
use typeblock::scenario::Scenario;
use typeblock::{EditorConfig, EditorSession, Workspace};

fn write_temp(contents: &str) -> (tempfile::NamedTempFile, Utf8PathBuf) {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write");
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("utf8 path");
    (file, path)
}

#[test]
fn scenario_file_round_trip() {
    let (_file, path) = write_temp(
        r#"{
            "components": { "Button1": "Button" },
            "blocks": [
                { "type": "global_declaration", "fields": { "NAME": "count" } },
                { "type": "controls_if", "alias": "cond",
                  "inputs": { "IF0": { "block": { "type": "logic_boolean", "fields": { "BOOL": "TRUE" } } } } }
            ],
            "steps": [
                { "type": "when Button1.Click" },
                { "select": "cond" },
                { "type": "set global count" },
                { "type": "42" },
                "undo",
                "redo",
                { "query": "get" },
                "escape"
            ]
        }"#,
    );
    let scenario = Scenario::from_json_file(&path).expect("load");
    let mut session = EditorSession::default();
    let report = scenario.run(&mut session).expect("run");

    assert_eq!(report.queries.len(), 4);
    assert_eq!(report.workspace.components.get("Button1").map(String::as_str), Some("Button"));
    // declaration, if, condition, event, set, number
    assert_eq!(report.workspace.nodes.len(), 6);

    let set = report.queries[1].inserted.as_ref().expect("set inserted");
    let number = report.queries[2].inserted.as_ref().expect("number inserted");
    assert_eq!(set.attachment.as_ref().map(|a| a.link.holder()), report.workspace.nodes.iter().find(|n| n.kind == "controls_if").map(|n| n.id));
    assert_eq!(number.attachment.as_ref().map(|a| a.link.holder()), Some(set.node));
    assert_eq!(report.selected, Some(number.node));
    assert!(report.queries[3].matches.iter().any(|m| m == "get global count"));

    let json = serde_json::to_value(&report).expect("serialize");
    assert!(json["workspace"]["nodes"].is_array());
}

#[test]
fn unknown_references_are_skipped() {
    let scenario = Scenario::from_json(r##"{ "steps": [ { "select": "ghost" }, { "delete": "#99" }, { "type": "if" } ] }"##)
        .expect("parse");
    let mut session = EditorSession::default();
    let report = scenario.run(&mut session).expect("run");
    assert_eq!(report.workspace.nodes.len(), 1);
}

#[test]
fn bad_blocks_abort_the_run() {
    let scenario = Scenario::from_json(r#"{ "blocks": [ { "type": "no_such_block" } ] }"#).expect("parse");
    let mut session = EditorSession::default();
    assert!(scenario.run(&mut session).is_err());
}

#[test]
fn custom_component_database() {
    let db = ComponentDatabase::from_json(
        r#"[ { "name": "Ball",
               "events": [ { "name": "Bounce", "params": [ { "name": "speed", "type": "number" } ] } ],
               "methods": [ { "name": "Speed", "returnType": "number" } ],
               "properties": [ { "name": "Radius", "type": "number", "writable": false } ] } ]"#,
    )
    .expect("components");
    let mut session = EditorSession::with_workspace(Workspace::new(db), EditorConfig::default());
    session.add_component("Ball1", "Ball");

    let texts: Vec<String> = session
        .on_query_changed("Ball1")
        .into_iter()
        .map(|o| o.display_text)
        .collect();
    assert!(texts.contains(&"when Ball1.Bounce".to_string()));
    assert!(texts.contains(&"call Ball1.Speed".to_string()));
    assert!(texts.contains(&"Ball1.Radius".to_string()));
    assert!(!texts.contains(&"set Ball1.Radius to".to_string()));

    let event = session.quick_insert("when Ball1.Bounce").expect("insert").expect("match").node;
    let found = session.on_query_changed("get speed");
    assert_eq!(found.first().map(|o| o.display_text.as_str()), Some("get speed"));
    assert_eq!(session.selection(), Some(event));
}

#[test]
fn config_file_is_applied() {
    let (_file, path) = write_temp(r#"{ "max_matches": 2 }"#);
    let config = EditorConfig::from_json_file(&path).expect("config");
    let mut session = EditorSession::new(config);
    assert_eq!(session.on_query_changed("s").len(), 2);
}
