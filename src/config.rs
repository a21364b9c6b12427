//! Editor configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! { "max_matches": 50, "connect": { "value_reattach_depth": 0 } }
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Upper bound on options returned for one query.
    pub max_matches: usize,
    /// Number of undo steps kept.
    pub history_depth: usize,
    pub connect: ConnectOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_matches: crate::editor::matcher::MAX_MATCHES,
            history_depth: 200,
            connect: ConnectOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Read config {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Parse config {}", path))
    }
}

/// Tuning of the connection resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// How many levels a value node may move up from the selection looking
    /// for a free socket. 0 disables inward reattachment.
    pub value_reattach_depth: usize,
    /// Also climb out of statement sockets during inward reattachment.
    pub reattach_through_statement_sockets: bool,
    /// Let inward reattachment fill sockets of statement blocks. When off, a
    /// value whose holder is a statement stays standalone.
    pub reattach_into_statements: bool,
    /// Cap on every upward walk through the graph.
    pub max_walk_depth: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            value_reattach_depth: 1,
            reattach_through_statement_sockets: false,
            reattach_into_statements: false,
            max_walk_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EditorConfig =
            serde_json::from_str(r#"{ "connect": { "value_reattach_depth": 0 } }"#).expect("parse");
        assert_eq!(cfg.max_matches, 100);
        assert_eq!(cfg.history_depth, 200);
        assert_eq!(cfg.connect.value_reattach_depth, 0);
        assert_eq!(cfg.connect.max_walk_depth, 64);
        assert!(!cfg.connect.reattach_into_statements);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("editor.json")).expect("utf8 path");
        std::fs::write(&path, r#"{ "history_depth": 5 }"#).expect("write");
        let cfg = EditorConfig::from_json_file(&path).expect("load");
        assert_eq!(cfg.history_depth, 5);
        assert!(EditorConfig::from_json_file(Utf8Path::new("/nonexistent/editor.json")).is_err());
    }
}
