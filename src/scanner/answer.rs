//! Structured answers which scanners ask the model to produce.

use core::fmt;
use serde::de::DeserializeOwned;

/// JSON type of an answer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    Boolean,
    Text,
}

impl FieldKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "string",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a structured answer, as presented to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerField {
    /// Key of the field in the JSON answer.
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl AnswerField {
    pub const fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
        }
    }
}

/// An answer type which a model fills in as a JSON object.
///
/// [`StructuredAnswer::fields`] must describe the JSON keys the type deserializes from, which
/// may differ from the Rust field names (e.g. `#[serde(rename = "value")]`).
pub trait StructuredAnswer: DeserializeOwned {
    fn fields() -> Vec<AnswerField>;
}

/// Instructions telling the model how to format its answer for `T`.
pub(crate) fn answer_instructions<T: StructuredAnswer>() -> String {
    let mut instructions = String::from(
        "Respond with a single JSON object containing exactly the following fields:\n",
    );
    for field in T::fields() {
        instructions.push_str(&format!(
            "- \"{}\" ({}): {}\n",
            field.name, field.kind, field.description
        ));
    }
    instructions.push_str("Do not include any text after the JSON object.");
    instructions
}

/// Finds the first balanced JSON object in `text`.
///
/// Braces inside JSON strings are ignored. Returns `None` if no object is closed.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (index, &byte) in bytes.iter().enumerate().skip(open) {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match byte {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[open..=index]);
                    }
                }
                _ => {}
            }
        }

        // Unterminated, try the next opening brace.
        start = open + 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Verdict {
        #[allow(dead_code)]
        value: bool,
    }

    impl StructuredAnswer for Verdict {
        fn fields() -> Vec<AnswerField> {
            vec![AnswerField::new(
                "value",
                FieldKind::Boolean,
                "Did the assistant finish?",
            )]
        }
    }

    #[rstest(text, expected,
        case(r#"{"value": 3}"#, Some(r#"{"value": 3}"#)),
        case(r#"Answer: {"value": 3, "explanation": "x"} done"#, Some(r#"{"value": 3, "explanation": "x"}"#)),
        case(r#"{"a": {"b": 1}} {"c": 2}"#, Some(r#"{"a": {"b": 1}}"#)),
        case(r#"{"explanation": "a } inside"}"#, Some(r#"{"explanation": "a } inside"}"#)),
        case(r#"{"explanation": "quote \" and }"}"#, Some(r#"{"explanation": "quote \" and }"}"#)),
        case(r#"{ broken {"value": 1}"#, Some(r#"{"value": 1}"#)),
        case("no json here", None),
        case("{ never closed", None)
    )]
    fn extracts_first_balanced_object(text: &str, expected: Option<&str>) {
        assert_eq!(extract_json_object(text), expected);
    }

    #[test]
    fn instructions_list_fields() {
        let instructions = answer_instructions::<Verdict>();
        assert!(instructions.contains("- \"value\" (boolean): Did the assistant finish?"));
    }
}
