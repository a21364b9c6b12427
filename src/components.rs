//! Component type database.
//!
//! Describes the events, methods and properties of each component type
//! (`Button`, `Label`, ...). The catalog turns every registered component
//! instance into `when …`, `call …`, getter and setter options, and the
//! block registry uses the same data to shape component blocks.
//!
//! The database is loadable from JSON so hosts can supply their own
//! component set; [`ComponentDatabase::builtin`] covers the common ones.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::TypeCheck;

/// A typed parameter of an event or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub ty: String,
}

fn default_param_type() -> String {
    "any".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Methods with a return type produce value blocks.
    #[serde(default, rename = "returnType", skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub readable: bool,
    #[serde(default = "default_true")]
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentType {
    pub name: String,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

impl ComponentType {
    pub fn event(&self, name: &str) -> Option<&EventSpec> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Component types keyed by type name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentDatabase {
    types: IndexMap<String, ComponentType>,
}

impl ComponentDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in component set, cached for the lifetime of the process.
    pub fn builtin() -> &'static ComponentDatabase {
        static BUILTIN: Lazy<ComponentDatabase> = Lazy::new(build_builtin);
        &BUILTIN
    }

    /// Load a database from a JSON array of component types.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let types: Vec<ComponentType> = serde_json::from_str(text)?;
        let mut db = Self::new();
        for ty in types {
            db.insert(ty);
        }
        Ok(db)
    }

    /// Add or replace a component type.
    pub fn insert(&mut self, ty: ComponentType) {
        self.types.insert(ty.name.clone(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&ComponentType> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &ComponentType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Map a component-description type name to a connection check.
pub fn type_check_for(ty: &str) -> TypeCheck {
    match ty {
        "number" => TypeCheck::of(&["Number"]),
        "text" => TypeCheck::of(&["String"]),
        "boolean" => TypeCheck::of(&["Boolean"]),
        "list" => TypeCheck::of(&["Array"]),
        "dictionary" => TypeCheck::of(&["Dictionary"]),
        "InstantInTime" => TypeCheck::of(&["InstantInTime"]),
        "component" => TypeCheck::of(&["Component"]),
        "any" | "" => TypeCheck::any(),
        other => TypeCheck::of(&[other]),
    }
}

fn param(name: &str, ty: &str) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        ty: ty.to_string(),
    }
}

fn event(name: &str, params: Vec<ParamSpec>) -> EventSpec {
    EventSpec {
        name: name.to_string(),
        params,
    }
}

fn method(name: &str, params: Vec<ParamSpec>, return_type: Option<&str>) -> MethodSpec {
    MethodSpec {
        name: name.to_string(),
        params,
        return_type: return_type.map(str::to_string),
    }
}

fn property(name: &str, ty: &str, readable: bool, writable: bool) -> PropertySpec {
    PropertySpec {
        name: name.to_string(),
        ty: ty.to_string(),
        readable,
        writable,
    }
}

fn build_builtin() -> ComponentDatabase {
    let mut db = ComponentDatabase::new();

    db.insert(ComponentType {
        name: "Button".to_string(),
        events: vec![
            event("Click", vec![]),
            event("LongClick", vec![]),
            event("GotFocus", vec![]),
            event("LostFocus", vec![]),
        ],
        methods: vec![],
        properties: vec![
            property("BackgroundColor", "number", true, true),
            property("Enabled", "boolean", true, true),
            property("FontSize", "number", true, true),
            property("Text", "text", true, true),
            property("Visible", "boolean", true, true),
        ],
    });

    db.insert(ComponentType {
        name: "Label".to_string(),
        events: vec![],
        methods: vec![],
        properties: vec![
            property("FontSize", "number", true, true),
            property("HasMargins", "boolean", true, true),
            property("Text", "text", true, true),
            property("Visible", "boolean", true, true),
        ],
    });

    db.insert(ComponentType {
        name: "TextBox".to_string(),
        events: vec![event("GotFocus", vec![]), event("LostFocus", vec![])],
        methods: vec![
            method("HideKeyboard", vec![], None),
            method("RequestFocus", vec![], None),
        ],
        properties: vec![
            property("Hint", "text", true, true),
            property("MultiLine", "boolean", true, true),
            property("Text", "text", true, true),
        ],
    });

    db.insert(ComponentType {
        name: "Clock".to_string(),
        events: vec![event("Timer", vec![])],
        methods: vec![
            method("Now", vec![], Some("InstantInTime")),
            method(
                "FormatTime",
                vec![param("instant", "InstantInTime")],
                Some("text"),
            ),
            method("SystemTime", vec![], Some("number")),
        ],
        properties: vec![
            property("TimerEnabled", "boolean", true, true),
            property("TimerInterval", "number", true, true),
        ],
    });

    db.insert(ComponentType {
        name: "Notifier".to_string(),
        events: vec![event("AfterChoosing", vec![param("choice", "text")])],
        methods: vec![
            method("ShowAlert", vec![param("notice", "text")], None),
            method(
                "ShowChooseDialog",
                vec![
                    param("message", "text"),
                    param("title", "text"),
                    param("button1Text", "text"),
                    param("button2Text", "text"),
                    param("cancelable", "boolean"),
                ],
                None,
            ),
        ],
        properties: vec![property("BackgroundColor", "number", false, true)],
    });

    db
}
