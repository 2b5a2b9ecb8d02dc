//! Literal parsing: typed-in or wire text into a [`Value`].

use thiserror::Error;

use crate::value::Value;

/// A `{...}` or `[...]` literal that is not valid JSON.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed literal {input}: {message}")]
pub struct LiteralError {
    /// The offending input, lossily decoded.
    pub input: String,
    /// Parser diagnostic.
    pub message: String,
}

/// Classify raw bytes as a value.
///
/// Classification keys off the first non-space byte:
/// - `{` or `[` parses strictly as a JSON object or array
/// - a leading and trailing `"` yields a `String` with the quotes removed
/// - `true`, `false` and `null` yield the matching variant
/// - anything that parses as a JSON number yields a `Number`
/// - remaining input is a `String` when it is valid UTF-8, `Binary` otherwise
pub fn parse_literal(input: &[u8]) -> Result<Value, LiteralError> {
    let bytes = input.trim_ascii();

    match bytes.first() {
        None => return Ok(Value::String(String::new())),
        Some(b'{') | Some(b'[') => {
            return serde_json::from_slice::<serde_json::Value>(bytes)
                .map(Value::from)
                .map_err(|e| LiteralError {
                    input: String::from_utf8_lossy(bytes).into_owned(),
                    message: e.to_string(),
                });
        }
        _ => {}
    }

    if is_quoted(bytes) {
        // Honour JSON escapes when they are well formed, otherwise take the
        // text between the quotes verbatim.
        if let Ok(s) = serde_json::from_slice::<String>(bytes) {
            return Ok(Value::String(s));
        }
        return Ok(text_or_binary(&bytes[1..bytes.len() - 1]));
    }

    match bytes {
        b"true" => return Ok(Value::Bool(true)),
        b"false" => return Ok(Value::Bool(false)),
        b"null" => return Ok(Value::Null),
        _ => {}
    }

    if let Ok(n) = serde_json::from_slice::<serde_json::Number>(bytes) {
        return Ok(Value::Number(n));
    }

    Ok(text_or_binary(bytes))
}

/// Convert shell input text to a value.
///
/// Same classification as [`parse_literal`], except that unquoted text never
/// lands on `Binary`: arbitrary words typed at the prompt are strings.
pub fn str_to_val(text: &str) -> Result<Value, LiteralError> {
    match parse_literal(text.as_bytes())? {
        Value::Binary(bytes) => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        other => Ok(other),
    }
}

/// Whether the text is wrapped in a pair of double quotes.
pub fn is_quoted(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"'
}

fn text_or_binary(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => Value::Binary(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", Value::from(42))]
    #[case("  -7 ", Value::from(-7))]
    #[case("true", Value::Bool(true))]
    #[case("false", Value::Bool(false))]
    #[case("null", Value::Null)]
    #[case("\"hi\"", Value::from("hi"))]
    #[case("\"a b\"", Value::from("a b"))]
    #[case("hello", Value::from("hello"))]
    #[case("", Value::from(""))]
    fn classifies_scalars(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(parse_literal(input.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn decimal_number_keeps_precision() {
        let value = parse_literal(b"9.500").unwrap();
        match value {
            Value::Number(n) => assert_eq!(n.to_string(), "9.500"),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn object_literal_parses() {
        let value = parse_literal(br#"{"a":1}"#).unwrap();
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        assert_eq!(map.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn array_literal_parses() {
        let value = parse_literal(b"[1, \"two\"]").unwrap();
        assert_eq!(value, Value::Array(vec![Value::from(1), Value::from("two")]));
    }

    #[rstest]
    #[case("{a:1}")]
    #[case("[1,")]
    #[case("{\"a\":1} trailing")]
    fn malformed_structures_fail(#[case] input: &str) {
        let err = parse_literal(input.as_bytes()).unwrap_err();
        assert_eq!(err.input, input);
    }

    #[test]
    fn quoted_text_with_bad_escape_is_taken_verbatim() {
        let value = parse_literal(br#""C:\path""#).unwrap();
        assert_eq!(value, Value::from(r"C:\path"));
    }

    #[test]
    fn invalid_utf8_is_binary() {
        let value = parse_literal(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(value, Value::Binary(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn quoted_number_stays_a_string() {
        assert_eq!(str_to_val("\"42\"").unwrap(), Value::from("42"));
    }

    #[test]
    fn str_to_val_never_yields_binary() {
        assert_eq!(str_to_val("select 1").unwrap(), Value::from("select 1"));
        assert_eq!(str_to_val("42").unwrap(), Value::from(42));
    }
}
