//! Token resolution: turn one argument token into a value.

use qsh_types::{str_to_val, Value};

use crate::aliases::{AliasRegistry, ALIAS_SIGIL};
use crate::error::{ShellError, ShellResult};

use super::{decode_sigil, Namespace, VarStore};

/// Resolve a token against the session.
///
/// Sigils are tested longest first, since `\\`, `-$`, `-` and `$` overlap
/// as prefixes:
///
/// 1. `\\name`: the alias text, as a string
/// 2. `-$name`, `-name`, `$name`: top of that variable's stack
/// 3. a predefined name: top of its stack
/// 4. anything else: a literal
///
/// A `-` followed by a digit is a negative number, not a query parameter.
pub fn resolve(token: &str, vars: &VarStore, aliases: &AliasRegistry) -> ShellResult<Value> {
    let token = token.trim();

    if let Some(name) = token.strip_prefix(ALIAS_SIGIL) {
        let text = aliases
            .get(name)
            .ok_or_else(|| ShellError::UnknownAlias(name.to_string()))?;
        if qsh_types::is_quoted(text.as_bytes()) {
            return Ok(str_to_val(text)?);
        }
        return Ok(Value::String(text.to_string()));
    }

    if is_negative_number(token) {
        return Ok(str_to_val(token)?);
    }

    let sigiled = token.starts_with('-') || token.starts_with('$');
    if sigiled {
        let (ns, name) = decode_sigil(token)?;
        return bound_top(vars, ns, name);
    }

    if vars.get(Namespace::Predefined, token).is_some() {
        return bound_top(vars, Namespace::Predefined, token);
    }

    Ok(str_to_val(token)?)
}

fn bound_top(vars: &VarStore, ns: Namespace, name: &str) -> ShellResult<Value> {
    vars.top(ns, name)
        .cloned()
        .map_err(|_| ShellError::UnboundVariable(ns.display(name)))
}

fn is_negative_number(token: &str) -> bool {
    token
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn empty_session() -> (VarStore, AliasRegistry) {
        (VarStore::new(), AliasRegistry::new())
    }

    #[test]
    fn test_leading_dot_is_a_query_parameter() {
        let (mut vars, aliases) = empty_session();
        let err = resolve("-.5", &vars, &aliases).unwrap_err();
        assert!(matches!(err, ShellError::UnboundVariable(ref v) if v == "-.5"), "{err:?}");

        vars.push(Namespace::QueryParam, ".5", Value::from("half")).unwrap();
        assert_eq!(resolve("-.5", &vars, &aliases).unwrap(), Value::from("half"));
        assert_eq!(resolve("-0.5", &vars, &aliases).unwrap(), str_to_val("-0.5").unwrap());
    }

    #[rstest]
    #[case("42", Value::from(42))]
    #[case("\"hi\"", Value::from("hi"))]
    #[case("hello", Value::from("hello"))]
    #[case("-7", Value::from(-7))]
    #[case("true", Value::Bool(true))]
    fn test_literals(#[case] token: &str, #[case] expected: Value) {
        let (vars, aliases) = empty_session();
        assert_eq!(resolve(token, &vars, &aliases).unwrap(), expected);
    }

    #[test]
    fn test_object_literal() {
        let (vars, aliases) = empty_session();
        let value = resolve(r#"{"a":1}"#, &vars, &aliases).unwrap();
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        assert_eq!(map.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn test_malformed_object_is_error() {
        let (vars, aliases) = empty_session();
        let err = resolve("{a:1}", &vars, &aliases).unwrap_err();
        assert!(matches!(err, ShellError::MalformedLiteral(_)));
    }

    #[test]
    fn test_unbound_variables() {
        let (vars, aliases) = empty_session();
        for token in ["-$r", "-r", "$r"] {
            let err = resolve(token, &vars, &aliases).unwrap_err();
            assert!(matches!(err, ShellError::UnboundVariable(ref v) if v == token), "{token}: {err:?}");
        }
    }

    #[test]
    fn test_variables_resolve_to_top() {
        let (mut vars, aliases) = empty_session();
        vars.push(Namespace::NamedParam, "r", Value::from(9)).unwrap();
        vars.push(Namespace::QueryParam, "r", Value::from("q")).unwrap();
        vars.push(Namespace::UserVar, "r", Value::Bool(true)).unwrap();
        assert_eq!(resolve("-$r", &vars, &aliases).unwrap(), Value::from(9));
        assert_eq!(resolve("-r", &vars, &aliases).unwrap(), Value::from("q"));
        assert_eq!(resolve("$r", &vars, &aliases).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_predefined_names_resolve() {
        let (vars, aliases) = empty_session();
        assert_eq!(resolve("histfile", &vars, &aliases).unwrap(), Value::from(".qsh_history"));
    }

    #[test]
    fn test_drained_predefined_is_unbound() {
        let (mut vars, aliases) = empty_session();
        vars.unset(Namespace::Predefined, "limit").unwrap();
        assert!(matches!(resolve("limit", &vars, &aliases), Err(ShellError::UnboundVariable(_))));
    }

    #[test]
    fn test_alias_resolves_as_text() {
        let (vars, mut aliases) = empty_session();
        aliases.define("n", "42").unwrap();
        aliases.define("q", "\"quoted\"").unwrap();
        assert_eq!(resolve("\\\\n", &vars, &aliases).unwrap(), Value::from("42"));
        assert_eq!(resolve("\\\\q", &vars, &aliases).unwrap(), Value::from("quoted"));
    }

    #[test]
    fn test_unknown_alias() {
        let (vars, aliases) = empty_session();
        let err = resolve("\\\\nope", &vars, &aliases).unwrap_err();
        assert!(matches!(err, ShellError::UnknownAlias(ref n) if n == "nope"));
    }
}
