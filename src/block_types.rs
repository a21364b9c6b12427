//! Registry of block kinds known to the editor.
//!
//! Each [`BlockDefinition`] carries the kind's default field values and a
//! shape function. The shape function derives the connectors and sockets of a
//! node from its current field values and structural state, so that e.g. a
//! `controls_if` with `elseif="1"` grows `IF1`/`DO1`, and a procedure call
//! gains one `ARGn` socket per procedure argument.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::components::{ComponentType, type_check_for};
use crate::model::{Node, SocketKind, TypeCheck};

const NUMBER: &[&str] = &["Number"];
const TEXT: &[&str] = &["String"];
const BOOLEAN: &[&str] = &["Boolean"];
const LIST: &[&str] = &["Array"];

/// Lookups a shape function may need beyond the node itself.
pub trait ShapeSource {
    /// Argument names of the declared procedure `name`.
    fn procedure_args(&self, name: &str) -> Option<Vec<String>>;
    /// Component type description by type name.
    fn component_type(&self, name: &str) -> Option<&ComponentType>;
}

/// Declared input of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketSpec {
    pub name: String,
    pub kind: SocketKind,
    pub check: TypeCheck,
}

/// Connectors and sockets of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub output: Option<TypeCheck>,
    pub has_previous: bool,
    pub has_next: bool,
    pub sockets: Vec<SocketSpec>,
}

impl Shape {
    /// An expression block producing `output`.
    pub fn value(output: TypeCheck) -> Self {
        Self {
            output: Some(output),
            has_previous: false,
            has_next: false,
            sockets: Vec::new(),
        }
    }

    /// A command block with previous and next connectors.
    pub fn statement() -> Self {
        Self {
            output: None,
            has_previous: true,
            has_next: true,
            sockets: Vec::new(),
        }
    }

    /// A top-level block (declarations, event handlers) with no connectors.
    pub fn top_level() -> Self {
        Self {
            output: None,
            has_previous: false,
            has_next: false,
            sockets: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, check: TypeCheck) -> Self {
        self.sockets.push(SocketSpec {
            name: name.into(),
            kind: SocketKind::Value,
            check,
        });
        self
    }

    pub fn with_statement(mut self, name: impl Into<String>) -> Self {
        self.sockets.push(SocketSpec {
            name: name.into(),
            kind: SocketKind::Statement,
            check: TypeCheck::any(),
        });
        self
    }
}

pub type ShapeFn = fn(&Node, &dyn ShapeSource) -> Shape;

/// Static description of a block kind.
pub struct BlockDefinition {
    pub kind: &'static str,
    pub default_fields: &'static [(&'static str, &'static str)],
    pub shape: ShapeFn,
}

impl std::fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("kind", &self.kind)
            .field("default_fields", &self.default_fields)
            .finish()
    }
}

/// Look up the definition of a block kind.
pub fn block_definition(kind: &str) -> Option<&'static BlockDefinition> {
    registry().get(kind)
}

/// All registered block kinds, in registration order.
pub fn block_kinds() -> impl Iterator<Item = &'static str> {
    registry().keys().copied()
}

fn registry() -> &'static IndexMap<&'static str, BlockDefinition> {
    static REGISTRY: Lazy<IndexMap<&'static str, BlockDefinition>> = Lazy::new(|| {
        build_registry()
            .into_iter()
            .map(|d| (d.kind, d))
            .collect()
    });
    &REGISTRY
}

fn def(
    kind: &'static str,
    default_fields: &'static [(&'static str, &'static str)],
    shape: ShapeFn,
) -> BlockDefinition {
    BlockDefinition {
        kind,
        default_fields,
        shape,
    }
}

fn build_registry() -> Vec<BlockDefinition> {
    vec![
        // ── Logic ───────────────────────────────────────────────────────
        def("logic_boolean", &[("BOOL", "TRUE")], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN))
        }),
        def("logic_negate", &[], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN)).with_value("BOOL", TypeCheck::of(BOOLEAN))
        }),
        def("logic_compare", &[("OP", "EQ")], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN))
                .with_value("A", TypeCheck::any())
                .with_value("B", TypeCheck::any())
        }),
        def("logic_operation", &[("OP", "AND")], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN))
                .with_value("A", TypeCheck::of(BOOLEAN))
                .with_value("B", TypeCheck::of(BOOLEAN))
        }),
        // ── Math ────────────────────────────────────────────────────────
        def("math_number", &[("NUM", "0")], |_, _| {
            Shape::value(TypeCheck::of(NUMBER))
        }),
        def("math_add", &[], |node, _| {
            numbered_values(Shape::value(TypeCheck::of(NUMBER)), "NUM", node.mutation.count("items", 2), NUMBER)
        }),
        def("math_multiply", &[], |node, _| {
            numbered_values(Shape::value(TypeCheck::of(NUMBER)), "NUM", node.mutation.count("items", 2), NUMBER)
        }),
        def("math_subtract", &[], binary_number),
        def("math_division", &[], binary_number),
        def("math_power", &[], binary_number),
        def("math_compare", &[("OP", "LT")], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN))
                .with_value("A", TypeCheck::of(NUMBER))
                .with_value("B", TypeCheck::of(NUMBER))
        }),
        def("math_single", &[("OP", "ROOT")], |_, _| {
            Shape::value(TypeCheck::of(NUMBER)).with_value("NUM", TypeCheck::of(NUMBER))
        }),
        def("math_random_int", &[], |_, _| {
            Shape::value(TypeCheck::of(NUMBER))
                .with_value("FROM", TypeCheck::of(NUMBER))
                .with_value("TO", TypeCheck::of(NUMBER))
        }),
        // ── Text ────────────────────────────────────────────────────────
        def("text", &[("TEXT", "")], |_, _| Shape::value(TypeCheck::of(TEXT))),
        def("text_join", &[], |node, _| {
            numbered_values(Shape::value(TypeCheck::of(TEXT)), "ADD", node.mutation.count("items", 2), TEXT)
        }),
        def("text_length", &[], |_, _| {
            Shape::value(TypeCheck::of(NUMBER)).with_value("VALUE", TypeCheck::of(TEXT))
        }),
        def("text_isEmpty", &[], |_, _| {
            Shape::value(TypeCheck::of(BOOLEAN)).with_value("VALUE", TypeCheck::of(TEXT))
        }),
        def("text_split", &[("OP", "SPLIT")], text_split_shape),
        // ── Lists ───────────────────────────────────────────────────────
        def("lists_create_with", &[], |node, _| {
            let mut shape = Shape::value(TypeCheck::of(LIST));
            for i in 0..node.mutation.count("items", 2) {
                shape = shape.with_value(format!("ADD{}", i), TypeCheck::any());
            }
            shape
        }),
        def("lists_add_items", &[], |node, _| {
            let mut shape = Shape::statement().with_value("LIST", TypeCheck::of(LIST));
            for i in 0..node.mutation.count("items", 1) {
                shape = shape.with_value(format!("ITEM{}", i), TypeCheck::any());
            }
            shape
        }),
        def("lists_length", &[], |_, _| {
            Shape::value(TypeCheck::of(NUMBER)).with_value("LIST", TypeCheck::of(LIST))
        }),
        // ── Control ─────────────────────────────────────────────────────
        def("controls_if", &[], controls_if_shape),
        def("controls_while", &[], |_, _| {
            Shape::statement()
                .with_value("TEST", TypeCheck::of(BOOLEAN))
                .with_statement("DO")
        }),
        def("controls_forRange", &[("VAR", "number")], |_, _| {
            Shape::statement()
                .with_value("START", TypeCheck::of(NUMBER))
                .with_value("END", TypeCheck::of(NUMBER))
                .with_value("STEP", TypeCheck::of(NUMBER))
                .with_statement("DO")
        }),
        def("controls_forEach", &[("VAR", "item")], |_, _| {
            Shape::statement()
                .with_value("LIST", TypeCheck::of(LIST))
                .with_statement("DO")
        }),
        // ── Variables ───────────────────────────────────────────────────
        def("global_declaration", &[("NAME", "name")], |_, _| {
            Shape::top_level().with_value("VALUE", TypeCheck::any())
        }),
        def("lexical_variable_get", &[("VAR", "")], |_, _| {
            Shape::value(TypeCheck::any())
        }),
        def("lexical_variable_set", &[("VAR", "")], |_, _| {
            Shape::statement().with_value("VALUE", TypeCheck::any())
        }),
        def("local_declaration_statement", &[("VAR0", "name")], |node, _| {
            local_declarations(Shape::statement(), node).with_statement("STACK")
        }),
        def("local_declaration_expression", &[("VAR0", "name")], |node, _| {
            local_declarations(Shape::value(TypeCheck::any()), node)
                .with_value("RETURN", TypeCheck::any())
        }),
        // ── Procedures ──────────────────────────────────────────────────
        def("procedures_defnoreturn", &[("NAME", "procedure")], |_, _| {
            Shape::top_level().with_statement("STACK")
        }),
        def("procedures_defreturn", &[("NAME", "procedure")], |_, _| {
            Shape::top_level().with_value("RETURN", TypeCheck::any())
        }),
        def("procedures_callnoreturn", &[("PROCNAME", "")], |node, source| {
            procedure_arguments(Shape::statement(), node, source)
        }),
        def("procedures_callreturn", &[("PROCNAME", "")], |node, source| {
            procedure_arguments(Shape::value(TypeCheck::any()), node, source)
        }),
        // ── Components ──────────────────────────────────────────────────
        def("component_event", &[], |_, _| Shape::top_level().with_statement("DO")),
        def("component_method", &[], component_method_shape),
        def("component_set_get", &[], component_set_get_shape),
        def("component_component_block", &[], |node, _| {
            let ty = node.mutation.attr("component_type").unwrap_or("Component");
            Shape::value(TypeCheck::of(&[ty]))
        }),
    ]
}

fn binary_number(_: &Node, _: &dyn ShapeSource) -> Shape {
    Shape::value(TypeCheck::of(NUMBER))
        .with_value("A", TypeCheck::of(NUMBER))
        .with_value("B", TypeCheck::of(NUMBER))
}

fn numbered_values(mut shape: Shape, prefix: &str, count: usize, check: &[&str]) -> Shape {
    for i in 0..count {
        shape = shape.with_value(format!("{}{}", prefix, i), TypeCheck::of(check));
    }
    shape
}

fn text_split_shape(node: &Node, _: &dyn ShapeSource) -> Shape {
    let at = match node.field("OP") {
        Some("SPLITATFIRSTOFANY") | Some("SPLITATANY") => TypeCheck::of(LIST),
        _ => TypeCheck::of(TEXT),
    };
    Shape::value(TypeCheck::of(LIST))
        .with_value("TEXT", TypeCheck::of(TEXT))
        .with_value("AT", at)
}

fn controls_if_shape(node: &Node, _: &dyn ShapeSource) -> Shape {
    let else_ifs = node.mutation.count("elseif", 0);
    let mut shape = Shape::statement();
    for i in 0..=else_ifs {
        shape = shape
            .with_value(format!("IF{}", i), TypeCheck::of(BOOLEAN))
            .with_statement(format!("DO{}", i));
    }
    if node.mutation.count("else", 0) > 0 {
        shape = shape.with_statement("ELSE");
    }
    shape
}

/// Number of names declared by a local declaration block.
pub(crate) fn local_name_count(node: &Node) -> usize {
    let from_fields = (0..)
        .take_while(|i| node.fields.contains_key(&format!("VAR{}", i)))
        .count();
    node.mutation.args.len().max(from_fields).max(1)
}

fn local_declarations(mut shape: Shape, node: &Node) -> Shape {
    for i in 0..local_name_count(node) {
        shape = shape.with_value(format!("DECL{}", i), TypeCheck::any());
    }
    shape
}

fn procedure_arguments(mut shape: Shape, node: &Node, source: &dyn ShapeSource) -> Shape {
    let args = if node.mutation.args.is_empty() {
        node.mutation
            .attr("name")
            .or_else(|| node.field("PROCNAME"))
            .and_then(|name| source.procedure_args(name))
            .unwrap_or_default()
    } else {
        node.mutation.args.clone()
    };
    for i in 0..args.len() {
        shape = shape.with_value(format!("ARG{}", i), TypeCheck::any());
    }
    shape
}

fn component_method_shape(node: &Node, source: &dyn ShapeSource) -> Shape {
    let spec = node
        .mutation
        .attr("component_type")
        .and_then(|ty| source.component_type(ty))
        .and_then(|ty| node.mutation.attr("method_name").and_then(|m| ty.method(m)));
    let Some(spec) = spec else {
        return Shape::statement();
    };
    let mut shape = match &spec.return_type {
        Some(ret) => Shape::value(type_check_for(ret)),
        None => Shape::statement(),
    };
    for (i, param) in spec.params.iter().enumerate() {
        shape = shape.with_value(format!("ARG{}", i), type_check_for(&param.ty));
    }
    shape
}

fn component_set_get_shape(node: &Node, source: &dyn ShapeSource) -> Shape {
    let check = node
        .mutation
        .attr("component_type")
        .and_then(|ty| source.component_type(ty))
        .and_then(|ty| node.mutation.attr("property_name").and_then(|p| ty.property(p)))
        .map(|p| type_check_for(&p.ty))
        .unwrap_or_default();
    if node.mutation.attr("set_or_get") == Some("set") {
        Shape::statement().with_value("VALUE", check)
    } else {
        Shape::value(check)
    }
}
