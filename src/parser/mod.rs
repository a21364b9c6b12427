//! Parsers for the small text formats the quick-entry path consumes.
//!
//! - [`parse_mutation`] – structural state documents (`<mutation …>`)
//! - [`literal`] – number / quoted-text shorthands typed into the query box

pub mod literal;

pub use literal::{Literal, recognize_literal};

use crate::error::EditorError;
use crate::model::{MAX_ARITY, Mutation};
use roxmltree::Document;

/// Parse a structural state document into a [`Mutation`].
///
/// Attributes of the root `<mutation>` element are kept in document order;
/// `<arg name="…">` and `<localname name="…">` children become the argument
/// list. An empty or whitespace-only string parses as an empty mutation.
pub fn parse_mutation(text: &str) -> Result<Mutation, EditorError> {
    if text.trim().is_empty() {
        return Ok(Mutation::default());
    }
    let doc = Document::parse(text).map_err(|e| EditorError::MalformedMutation(e.to_string()))?;
    let root = doc.root_element();
    if !root.has_tag_name("mutation") {
        return Err(EditorError::MalformedMutation(format!(
            "expected <mutation>, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut mutation = Mutation::default();
    for attr in root.attributes() {
        check_arity(attr.name(), attr.value())?;
        mutation
            .attributes
            .insert(attr.name().to_string(), attr.value().to_string());
    }
    for child in root
        .children()
        .filter(|c| c.is_element() && (c.has_tag_name("arg") || c.has_tag_name("localname")))
    {
        let name = child.attribute("name").ok_or_else(|| {
            EditorError::MalformedMutation(format!(
                "<{}> without a name attribute",
                child.tag_name().name()
            ))
        })?;
        mutation.args.push(name.to_string());
    }
    Ok(mutation)
}

/// Reject numeric attributes beyond [`MAX_ARITY`].
fn check_arity(name: &str, value: &str) -> Result<(), EditorError> {
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_ARITY => Ok(()),
        _ => Err(EditorError::MalformedMutation(format!(
            "{name}=\"{digits}\" exceeds the limit of {MAX_ARITY}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attributes_in_order() {
        let m = parse_mutation(r#"<mutation elseif="2" else="1"></mutation>"#).expect("parse");
        let keys: Vec<_> = m.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, ["elseif", "else"]);
        assert_eq!(m.count("elseif", 0), 2);
    }

    #[test]
    fn parses_procedure_args() {
        let m = parse_mutation(r#"<mutation><arg name="myParam"></arg><arg name="other"/></mutation>"#)
            .expect("parse");
        assert_eq!(m.args, ["myParam", "other"]);
        assert!(m.attributes.is_empty());
    }

    #[test]
    fn rejects_oversized_counts() {
        for text in [
            r#"<mutation elseif="200000"></mutation>"#,
            r#"<mutation items="99999999999999999999999"></mutation>"#,
        ] {
            assert!(matches!(parse_mutation(text), Err(EditorError::MalformedMutation(_))));
        }
        let m = parse_mutation(r#"<mutation items="256" name="42"></mutation>"#).expect("parse");
        assert_eq!(m.count("items", 2), 256);
    }

    #[test]
    fn count_is_capped() {
        let mut m = Mutation::default();
        m.attributes.insert("elseif".to_string(), "100000".to_string());
        assert_eq!(m.count("elseif", 0), MAX_ARITY);
    }

    #[test]
    fn empty_text_is_empty_mutation() {
        assert!(parse_mutation("  ").expect("parse").is_empty());
    }

    #[test]
    fn rejects_other_roots_and_bad_xml() {
        assert!(matches!(
            parse_mutation("<xml/>"),
            Err(EditorError::MalformedMutation(_))
        ));
        assert!(parse_mutation("<mutation").is_err());
        assert!(parse_mutation("<mutation><arg/></mutation>").is_err());
    }
}
