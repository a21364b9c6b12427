use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers and type checks
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a node in a [`Workspace`](crate::workspace::Workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Set of connection type tags. `None` accepts any type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCheck(pub Option<Vec<String>>);

impl TypeCheck {
    /// A check that accepts every type.
    pub fn any() -> Self {
        Self(None)
    }

    /// A check restricted to the given type tags.
    pub fn of(types: &[&str]) -> Self {
        Self(Some(types.iter().map(|t| t.to_string()).collect()))
    }

    /// Returns true if two connectors with these checks may be joined.
    pub fn accepts(&self, other: &TypeCheck) -> bool {
        match (&self.0, &other.0) {
            (Some(mine), Some(theirs)) => mine.iter().any(|t| theirs.contains(t)),
            _ => true,
        }
    }

    /// Returns true if the check explicitly lists `ty`.
    pub fn includes(&self, ty: &str) -> bool {
        self.0.as_ref().is_some_and(|types| types.iter().any(|t| t == ty))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sockets and links
// ────────────────────────────────────────────────────────────────────────────

/// What a socket accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketKind {
    /// One expression child, joined output-to-input.
    Value,
    /// The first node of a statement chain, joined previous-to-socket.
    Statement,
}

/// A named input of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    pub kind: SocketKind,
    #[serde(default)]
    pub check: TypeCheck,
    /// The attached child, if any.
    pub target: Option<NodeId>,
}

/// How a node hangs off its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum ParentLink {
    /// Attached to a named socket of `parent`.
    Socket { parent: NodeId, socket: String },
    /// Attached to the next connector of the statement `previous`.
    Next { previous: NodeId },
}

impl ParentLink {
    /// The node that holds this link's slot.
    pub fn holder(&self) -> NodeId {
        match self {
            ParentLink::Socket { parent, .. } => *parent,
            ParentLink::Next { previous } => *previous,
        }
    }
}

impl fmt::Display for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentLink::Socket { parent, socket } => write!(f, "{}.{}", parent, socket),
            ParentLink::Next { previous } => write!(f, "{}.next", previous),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structural state
// ────────────────────────────────────────────────────────────────────────────

/// Upper bound on any counted part of a node (else-if branches, list
/// items, joined strings).
pub const MAX_ARITY: usize = 256;

/// Variable-arity shape data of a node, serialized as
/// `<mutation k="v"><arg name="a"></arg></mutation>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mutation {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Mutation {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.args.is_empty()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Parse a numeric attribute, falling back to `default` when it is
    /// missing or not a number. Capped at [`MAX_ARITY`].
    pub fn count(&self, name: &str, default: usize) -> usize {
        self.attr(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
            .min(MAX_ARITY)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Node
// ────────────────────────────────────────────────────────────────────────────

/// A block instance in the program graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Block type identifier (e.g. `"controls_if"`).
    pub kind: String,
    pub fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Mutation::is_empty")]
    pub mutation: Mutation,
    /// Output connector and its type check, for expression nodes.
    pub output: Option<TypeCheck>,
    pub has_previous: bool,
    pub has_next: bool,
    /// Statement following this one in its chain.
    pub next: Option<NodeId>,
    pub sockets: Vec<Socket>,
    pub parent: Option<ParentLink>,
}

impl Node {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn socket(&self, name: &str) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.name == name)
    }

    pub(crate) fn socket_mut(&mut self, name: &str) -> Option<&mut Socket> {
        self.sockets.iter_mut().find(|s| s.name == name)
    }

    /// True for expression nodes (they have an output connector).
    pub fn is_value(&self) -> bool {
        self.output.is_some()
    }

    /// True for command nodes that can sit in a statement chain.
    pub fn is_statement(&self) -> bool {
        self.output.is_none() && (self.has_previous || self.has_next)
    }

    /// Children attached through sockets, in declaration order.
    pub fn socket_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.sockets.iter().filter_map(|s| s.target)
    }

    /// True when nothing is attached to or from this node.
    pub fn is_detached(&self) -> bool {
        self.parent.is_none() && self.next.is_none() && self.sockets.iter().all(|s| s.target.is_none())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BlockState – nested description used to append trees
// ────────────────────────────────────────────────────────────────────────────

/// Nested block description in the editor's JSON block format:
///
/// ```json
/// { "type": "controls_if",
///   "inputs": { "IF0": { "block": { "type": "logic_boolean", "fields": { "BOOL": "TRUE" } } } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockState {
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional name that scenario scripts use to refer to this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Field values; numbers and booleans are accepted and stringified.
    #[serde(default)]
    pub fields: IndexMap<String, serde_json::Value>,
    #[serde(default, rename = "extraState", skip_serializing_if = "Option::is_none")]
    pub extra_state: Option<String>,
    #[serde(default)]
    pub inputs: IndexMap<String, InputState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<InputState>>,
}

impl BlockState {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            alias: None,
            fields: IndexMap::new(),
            extra_state: None,
            inputs: IndexMap::new(),
            next: None,
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields
            .insert(name.to_string(), serde_json::Value::String(value.to_string()));
        self
    }

    pub fn with_input(mut self, name: &str, block: BlockState) -> Self {
        self.inputs.insert(name.to_string(), InputState { block });
        self
    }

    pub fn with_next(mut self, block: BlockState) -> Self {
        self.next = Some(Box::new(InputState { block }));
        self
    }

    pub fn with_extra_state(mut self, extra_state: &str) -> Self {
        self.extra_state = Some(extra_state.to_string());
        self
    }
}

/// Wrapper matching the `{ "block": … }` nesting of the JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub block: BlockState,
}

/// Render a JSON field value the way the editor stores it.
pub fn field_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
