//! Quick-entry ("type block") editing for block-based programs.
//!
//! The user types a short phrase such as `if`, `set global count` or `42`;
//! this crate ranks a catalog of block templates against it, creates the
//! chosen block in the program graph and wires it to the selected node as a
//! single undoable step.
//!
//! The binary `typeblock` replays JSON scenarios and prints the resulting
//! graph as JSON.

pub mod block_types;
pub mod components;
pub mod config;
pub mod editor;
pub mod error;
pub mod generator;
pub mod model;
pub mod parser;
pub mod scenario;
pub mod workspace;

pub use config::{ConnectOptions, EditorConfig};
pub use editor::{BlockOption, EditorSession, InsertOutcome};
pub use error::{EditorError, TemplateError};
pub use model::{BlockState, Node, NodeId, ParentLink};
pub use workspace::Workspace;
