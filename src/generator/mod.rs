//! Serialize structural state back to its `<mutation>` document form.
//!
//! The output is the minimal document Blockly-style editors exchange:
//! one attribute per key in insertion order, followed by one `<arg>` child per
//! argument name, e.g. `<mutation name="p"><arg name="x"></arg></mutation>`.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::EditorError;
use crate::model::Mutation;

/// Write `mutation` as a structural state document.
pub fn mutation_to_xml(mutation: &Mutation) -> Result<String, EditorError> {
    let mut writer = Writer::new(Vec::new());

    let mut root = BytesStart::new("mutation");
    for (name, value) in &mutation.attributes {
        root.push_attribute((name.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(root)).map_err(xml_error)?;
    for arg in &mutation.args {
        let mut child = BytesStart::new("arg");
        child.push_attribute(("name", arg.as_str()));
        writer.write_event(Event::Start(child)).map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("arg")))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("mutation")))
        .map_err(xml_error)?;

    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn xml_error(e: impl std::fmt::Display) -> EditorError {
    EditorError::MalformedMutation(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mutation;

    #[test]
    fn writes_attributes_in_order() {
        let mut m = Mutation::default();
        m.attributes.insert("component_type".to_string(), "Button".to_string());
        m.attributes.insert("instance_name".to_string(), "Button1".to_string());
        assert_eq!(
            mutation_to_xml(&m).expect("xml"),
            r#"<mutation component_type="Button" instance_name="Button1"></mutation>"#
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let mut m = Mutation::default();
        m.attributes.insert("name".to_string(), "a\"<b>&".to_string());
        let xml = mutation_to_xml(&m).expect("xml");
        assert_eq!(parse_mutation(&xml).expect("reparse"), m);
    }

    #[test]
    fn writes_args() {
        let m = Mutation {
            attributes: Default::default(),
            args: vec!["x".to_string()],
        };
        assert_eq!(
            mutation_to_xml(&m).expect("xml"),
            r#"<mutation><arg name="x"></arg></mutation>"#
        );
    }
}
