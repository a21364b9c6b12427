//! Normalization of legacy option templates.
//!
//! Catalog entries are described in the older "legacy" form: a canonic block
//! type plus an optional labeled dropdown and optional mutator attributes.
//! [`to_option`] turns one of those into the uniform [`BlockOption`] the
//! matcher and instantiator work with.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::generator::mutation_to_xml;
use crate::model::Mutation;
use crate::parser::Literal;

/// A dropdown field preset: `title_name` is the field, `value` its value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DropDown {
    pub title_name: Option<String>,
    pub value: Option<String>,
}

impl DropDown {
    pub fn new(title_name: &str, value: &str) -> Self {
        Self {
            title_name: Some(title_name.to_string()),
            value: Some(value.to_string()),
        }
    }
}

/// Template in the legacy shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyOption {
    pub canonic_name: Option<String>,
    #[serde(default)]
    pub drop_down: Option<DropDown>,
    #[serde(default)]
    pub mutator_attributes: IndexMap<String, String>,
}

impl LegacyOption {
    pub fn new(canonic_name: &str) -> Self {
        Self {
            canonic_name: Some(canonic_name.to_string()),
            drop_down: None,
            mutator_attributes: IndexMap::new(),
        }
    }

    pub fn with_drop_down(mut self, title_name: &str, value: &str) -> Self {
        self.drop_down = Some(DropDown::new(title_name, value));
        self
    }

    pub fn with_mutator(mut self, name: &str, value: &str) -> Self {
        self.mutator_attributes
            .insert(name.to_string(), value.to_string());
        self
    }
}

impl From<&Literal> for LegacyOption {
    fn from(literal: &Literal) -> Self {
        LegacyOption::new(literal.block_type()).with_drop_down(literal.field_name(), literal.value())
    }
}

/// A producible block template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockOption {
    pub block_type: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_values: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_state: Option<String>,
}

/// Convert a legacy template shown as `display_text` into a [`BlockOption`].
pub fn to_option(display_text: &str, legacy: &LegacyOption) -> Result<BlockOption, TemplateError> {
    if display_text.is_empty() {
        return Err(TemplateError::MissingDisplayText);
    }
    let block_type = legacy
        .canonic_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| TemplateError::MissingBlockType(display_text.to_string()))?;

    let field_values = legacy.drop_down.as_ref().and_then(|dd| match (&dd.title_name, &dd.value) {
        (Some(title), Some(value)) if !title.is_empty() && !value.is_empty() => {
            Some(IndexMap::from([(title.clone(), value.clone())]))
        }
        _ => None,
    });

    let extra_state = if legacy.mutator_attributes.is_empty() {
        None
    } else {
        let mutation = Mutation {
            attributes: legacy.mutator_attributes.clone(),
            args: Vec::new(),
        };
        let xml = mutation_to_xml(&mutation).map_err(|source| TemplateError::Mutation {
            display_text: display_text.to_string(),
            source,
        })?;
        Some(xml)
    };

    Ok(BlockOption {
        block_type: block_type.to_string(),
        display_text: display_text.to_string(),
        field_values,
        extra_state,
    })
}
