//! Literal shorthand recognition.
//!
//! Numbers and quoted strings cannot be enumerated in the option catalog, so
//! the quick-entry box recognizes them on demand:
//!
//! - a bare decimal number with an optional sign: `42`, `-3.5`, `+7`, `.5`
//! - a double-quoted string: `"hello"` (quotes stripped, no escapes)

/// A recognized literal shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Number text as it should be stored in `math_number.NUM`.
    Number(String),
    /// Text content as it should be stored in `text.TEXT`.
    Text(String),
}

impl Literal {
    /// Block type that represents this literal.
    pub fn block_type(&self) -> &'static str {
        match self {
            Literal::Number(_) => "math_number",
            Literal::Text(_) => "text",
        }
    }

    /// Name of the field holding the literal value.
    pub fn field_name(&self) -> &'static str {
        match self {
            Literal::Number(_) => "NUM",
            Literal::Text(_) => "TEXT",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Literal::Number(v) | Literal::Text(v) => v,
        }
    }
}

/// Recognize `text` as a literal shorthand.
pub fn recognize_literal(text: &str) -> Option<Literal> {
    if let Some(inner) = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Some(Literal::Text(inner.to_string()));
    }
    is_decimal(text).then(|| Literal::Number(text.strip_prefix('+').unwrap_or(text).to_string()))
}

fn is_decimal(text: &str) -> bool {
    let unsigned = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match frac_part {
        None => !int_part.is_empty() && all_digits(int_part),
        Some(frac) => {
            (!int_part.is_empty() || !frac.is_empty())
                && all_digits(int_part)
                && all_digits(frac)
                && !frac.is_empty()
        }
    }
}
