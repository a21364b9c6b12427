//! Option catalog for the quick-entry box.
//!
//! The catalog maps each display text (what the user types) to a block
//! template. Its content is a pure function of a [`Declarations`] snapshot:
//! built-in operators and literals plus one or more entries per declared
//! global, procedure, component instance and local name in scope of the
//! selection. The session keeps one [`Catalog`] and rebuilds it whenever the
//! snapshot changes.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use super::adapter::{BlockOption, LegacyOption, to_option};
use crate::block_types::local_name_count;
use crate::components::ComponentDatabase;
use crate::model::{NodeId, ParentLink};
use crate::workspace::{PROCEDURE_DEFINITIONS, Workspace};

/// A declared procedure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProcedureDecl {
    pub name: String,
    pub args: Vec<String>,
    /// True for procedures that produce a result.
    pub returns: bool,
}

/// Everything user-declared that the catalog depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Declarations {
    pub globals: Vec<String>,
    pub procedures: Vec<ProcedureDecl>,
    /// `(instance, component type)` pairs.
    pub components: Vec<(String, String)>,
    /// Local names visible from the selected node.
    pub locals: Vec<String>,
}

impl Declarations {
    /// Take a snapshot of the declarations in `workspace` as seen from
    /// `selected`. Lists are sorted so the snapshot does not depend on node
    /// order.
    pub fn collect(workspace: &Workspace, selected: Option<NodeId>) -> Self {
        let mut globals: Vec<String> = workspace
            .nodes()
            .filter(|n| n.kind == "global_declaration")
            .filter_map(|n| n.field("NAME"))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        globals.sort();
        globals.dedup();

        let mut procedures: Vec<ProcedureDecl> = workspace
            .nodes()
            .filter(|n| PROCEDURE_DEFINITIONS.contains(&n.kind.as_str()))
            .filter_map(|n| {
                n.field("NAME").filter(|name| !name.is_empty()).map(|name| ProcedureDecl {
                    name: name.to_string(),
                    args: n.mutation.args.clone(),
                    returns: n.kind == "procedures_defreturn",
                })
            })
            .collect();
        procedures.sort();
        procedures.dedup_by(|a, b| a.name == b.name);

        let mut components: Vec<(String, String)> = workspace
            .components()
            .map(|(i, t)| (i.to_string(), t.to_string()))
            .collect();
        components.sort();

        let mut locals = selected
            .map(|id| locals_in_scope(workspace, id))
            .unwrap_or_default();
        locals.sort();
        locals.dedup();

        Self {
            globals,
            procedures,
            components,
            locals,
        }
    }
}

/// Names declared by enclosing scopes of `id`, including `id` itself.
///
/// Walking up through a `Next` link moves to an earlier sibling statement,
/// whose own declarations are not in scope; the walk continues past it to
/// reach the enclosing block.
fn locals_in_scope(workspace: &Workspace, id: NodeId) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = id;
    let mut in_scope = true;
    for _ in 0..=workspace.len() {
        let Some(node) = workspace.node(current) else {
            break;
        };
        if in_scope {
            names.extend(scope_names(workspace, current));
        }
        match &node.parent {
            Some(ParentLink::Socket { parent, .. }) => {
                current = *parent;
                in_scope = true;
            }
            Some(ParentLink::Next { previous }) => {
                current = *previous;
                in_scope = false;
            }
            None => break,
        }
    }
    names
}

fn scope_names(workspace: &Workspace, id: NodeId) -> Vec<String> {
    let Some(node) = workspace.node(id) else {
        return Vec::new();
    };
    match node.kind.as_str() {
        "local_declaration_statement" | "local_declaration_expression" => (0..local_name_count(node))
            .filter_map(|i| {
                node.field(&format!("VAR{}", i))
                    .map(str::to_string)
                    .or_else(|| node.mutation.args.get(i).cloned())
            })
            .collect(),
        "controls_forRange" | "controls_forEach" => node.field("VAR").map(str::to_string).into_iter().collect(),
        "procedures_defnoreturn" | "procedures_defreturn" => node.mutation.args.clone(),
        "component_event" => {
            let event = node.mutation.attr("component_type").and_then(|ty| {
                workspace
                    .component_db()
                    .get(ty)
                    .and_then(|t| node.mutation.attr("event_name").and_then(|e| t.event(e)))
            });
            event
                .map(|e| e.params.iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

/// Built-in templates that do not depend on declarations.
pub fn builtin_options() -> &'static [(&'static str, LegacyOption)] {
    static BUILTINS: Lazy<Vec<(&'static str, LegacyOption)>> = Lazy::new(build_builtins);
    &BUILTINS
}

fn plain(kind: &str) -> LegacyOption {
    LegacyOption::new(kind)
}

fn dd(kind: &str, field: &str, value: &str) -> LegacyOption {
    LegacyOption::new(kind).with_drop_down(field, value)
}

fn build_builtins() -> Vec<(&'static str, LegacyOption)> {
    vec![
        // Logic
        ("true", dd("logic_boolean", "BOOL", "TRUE")),
        ("false", dd("logic_boolean", "BOOL", "FALSE")),
        ("not", plain("logic_negate")),
        ("=", dd("logic_compare", "OP", "EQ")),
        ("≠", dd("logic_compare", "OP", "NEQ")),
        ("and", dd("logic_operation", "OP", "AND")),
        ("or", dd("logic_operation", "OP", "OR")),
        // Math
        ("0", dd("math_number", "NUM", "0")),
        ("+", plain("math_add")),
        ("-", plain("math_subtract")),
        ("*", plain("math_multiply")),
        ("/", plain("math_division")),
        ("^", plain("math_power")),
        ("<", dd("math_compare", "OP", "LT")),
        ("≤", dd("math_compare", "OP", "LTE")),
        (">", dd("math_compare", "OP", "GT")),
        ("≥", dd("math_compare", "OP", "GTE")),
        ("abs", dd("math_single", "OP", "ABS")),
        ("sqrt", dd("math_single", "OP", "ROOT")),
        ("neg", dd("math_single", "OP", "NEG")),
        ("random integer", plain("math_random_int")),
        // Text
        ("text", plain("text")),
        ("join", plain("text_join")),
        ("length", plain("text_length")),
        ("is empty", plain("text_isEmpty")),
        ("split", dd("text_split", "OP", "SPLIT")),
        ("split at first", dd("text_split", "OP", "SPLITATFIRST")),
        ("split at any", dd("text_split", "OP", "SPLITATANY")),
        ("split at first of any", dd("text_split", "OP", "SPLITATFIRSTOFANY")),
        // Lists
        ("create empty list", plain("lists_create_with").with_mutator("items", "0")),
        ("make a list", plain("lists_create_with")),
        ("add items to list", plain("lists_add_items")),
        ("length of list", plain("lists_length")),
        // Control
        ("if", plain("controls_if")),
        ("if else", plain("controls_if").with_mutator("else", "1")),
        ("while", plain("controls_while")),
        ("for each number", plain("controls_forRange")),
        ("for each item in list", plain("controls_forEach")),
        // Variables
        ("initialize global name to", plain("global_declaration")),
        ("initialize local name in do", plain("local_declaration_statement")),
        ("initialize local name in return", plain("local_declaration_expression")),
        // Procedures
        ("to procedure do", plain("procedures_defnoreturn")),
        ("to procedure result", plain("procedures_defreturn")),
    ]
}

/// Assemble the legacy template table for a declaration snapshot.
///
/// Display texts are unique; when two templates claim the same text the
/// first one wins.
pub fn legacy_options(decls: &Declarations, db: &ComponentDatabase) -> IndexMap<String, LegacyOption> {
    let mut table = IndexMap::new();
    let mut add = |text: String, option: LegacyOption| {
        if table.contains_key(&text) {
            debug!(display_text = %text, "duplicate catalog entry ignored");
        } else {
            table.insert(text, option);
        }
    };

    for (text, option) in builtin_options() {
        add(text.to_string(), option.clone());
    }

    for name in &decls.globals {
        let var = format!("global {}", name);
        add(format!("get {}", var), dd("lexical_variable_get", "VAR", &var));
        add(format!("set {}", var), dd("lexical_variable_set", "VAR", &var));
    }

    for name in &decls.locals {
        add(format!("get {}", name), dd("lexical_variable_get", "VAR", name));
        add(format!("set {}", name), dd("lexical_variable_set", "VAR", name));
    }

    for proc in &decls.procedures {
        let kind = if proc.returns {
            "procedures_callreturn"
        } else {
            "procedures_callnoreturn"
        };
        add(
            format!("call {}", proc.name),
            dd(kind, "PROCNAME", &proc.name).with_mutator("name", &proc.name),
        );
    }

    for (instance, type_name) in &decls.components {
        let base = |kind: &str| {
            plain(kind)
                .with_mutator("component_type", type_name)
                .with_mutator("instance_name", instance)
        };
        match db.get(type_name) {
            Some(ty) => {
                for event in &ty.events {
                    add(
                        format!("when {}.{}", instance, event.name),
                        base("component_event").with_mutator("event_name", &event.name),
                    );
                }
                for method in &ty.methods {
                    add(
                        format!("call {}.{}", instance, method.name),
                        base("component_method").with_mutator("method_name", &method.name),
                    );
                }
                for prop in &ty.properties {
                    if prop.readable {
                        add(
                            format!("{}.{}", instance, prop.name),
                            base("component_set_get")
                                .with_mutator("property_name", &prop.name)
                                .with_mutator("set_or_get", "get"),
                        );
                    }
                    if prop.writable {
                        add(
                            format!("set {}.{} to", instance, prop.name),
                            base("component_set_get")
                                .with_mutator("property_name", &prop.name)
                                .with_mutator("set_or_get", "set"),
                        );
                    }
                }
            }
            None => warn!(instance = %instance, component_type = %type_name, "unknown component type"),
        }
        add(instance.clone(), base("component_component_block"));
    }

    table
}

/// Convert a legacy table into options sorted by display text.
/// Templates that fail to convert are logged and skipped.
pub fn generate_options(table: &IndexMap<String, LegacyOption>) -> Vec<BlockOption> {
    let mut options: Vec<BlockOption> = table
        .iter()
        .filter_map(|(text, legacy)| match to_option(text, legacy) {
            Ok(option) => Some(option),
            Err(e) => {
                warn!(error = %e, "dropping catalog template");
                None
            }
        })
        .collect();
    options.sort_by(|a, b| a.display_text.cmp(&b.display_text));
    options
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

/// Options built for one declaration snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    declarations: Declarations,
    options: Vec<BlockOption>,
}

impl Catalog {
    pub fn build(declarations: Declarations, db: &ComponentDatabase) -> Self {
        let options = generate_options(&legacy_options(&declarations, db));
        debug!(options = options.len(), "catalog built");
        Self {
            declarations,
            options,
        }
    }

    /// Options sorted by display text.
    pub fn options(&self) -> &[BlockOption] {
        &self.options
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// True when the catalog was built for `declarations`.
    pub fn is_current(&self, declarations: &Declarations) -> bool {
        &self.declarations == declarations
    }

    pub fn get(&self, display_text: &str) -> Option<&BlockOption> {
        self.options
            .binary_search_by(|o| o.display_text.as_str().cmp(display_text))
            .ok()
            .map(|i| &self.options[i])
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
