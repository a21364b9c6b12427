//! Quick-entry editing.
//!
//! The user types a short phrase, the session ranks the option catalog
//! against it, and confirming an option creates the block and wires it into
//! the graph next to the selected node:
//!
//! - **Catalog**: display text → block template, rebuilt when declarations change
//! - **Matcher**: tiered, case-insensitive ranking with literal shorthands
//! - **Connection resolver**: picks the socket or chain position for a new node
//! - **Transaction / history**: one confirm is one undo step

pub mod adapter;
pub mod catalog;
pub mod connect;
pub mod matcher;
pub mod operations;
pub mod selection;
pub mod state;
pub mod transaction;

pub use adapter::{BlockOption, DropDown, LegacyOption, to_option};
pub use catalog::{Catalog, Declarations, ProcedureDecl, generate_options, legacy_options};
pub use connect::{Attachment, ConnectionRule, enclosing_statement, resolve};
pub use matcher::{MAX_MATCHES, match_options, match_options_limited, matching_rows};
pub use operations::{EditCommand, EditHistory, apply_inverse};
pub use selection::Selection;
pub use state::{EditorSession, InsertOutcome};
pub use transaction::EditTransaction;
