//! Generic-parameter substitution applied to type expressions before they
//! reach the oracle, so the oracle only ever compares ground types.
//!
//! Each type parameter in scope resolves to its default, else its constraint,
//! else the wildcard. Bound values are wrapped in parentheses and expanded
//! recursively; a parameter that refers back to itself resolves to the wildcard.

use crate::model::{TypeParameter, WILDCARD_TYPE};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Binding<'a> {
    Wildcard,
    Bound(&'a str),
}

/// Substitutes type parameters of the owning class and of the signature itself.
/// Signature parameters shadow class parameters of the same name.
pub fn normalize_type(
    expr: &str,
    class_scope: &[TypeParameter],
    own_scope: &[TypeParameter],
) -> String {
    let expr = expr.trim();
    if class_scope.is_empty() && own_scope.is_empty() {
        return expr.to_string();
    }

    let mut bindings = HashMap::new();
    for tp in class_scope.iter().chain(own_scope) {
        let binding = match (non_empty(&tp.default), non_empty(&tp.constraint)) {
            (Some(default), _) => Binding::Bound(default),
            (None, Some(constraint)) => Binding::Bound(constraint),
            (None, None) => Binding::Wildcard,
        };
        bindings.insert(tp.name.as_str(), binding);
    }

    let resolver = Resolver { bindings };
    let mut stack = Vec::new();
    replace_identifiers(expr, |ident| resolver.resolve(ident, &mut stack))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

struct Resolver<'a> {
    bindings: HashMap<&'a str, Binding<'a>>,
}

impl<'a> Resolver<'a> {
    fn resolve(&self, ident: &str, stack: &mut Vec<String>) -> Option<String> {
        let binding = self.bindings.get(ident)?;
        match binding {
            Binding::Wildcard => Some(WILDCARD_TYPE.to_string()),
            Binding::Bound(_) if stack.iter().any(|s| s == ident) => {
                Some(WILDCARD_TYPE.to_string())
            }
            Binding::Bound(value) => {
                stack.push(ident.to_string());
                let expanded = replace_identifiers(value, |inner| self.resolve(inner, stack));
                stack.pop();
                Some(format!("({})", expanded))
            }
        }
    }
}

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_$]+").expect("Invalid identifier regex"));

/// Rewrites every maximal identifier run for which `substitute` returns a value
pub fn replace_identifiers<F>(text: &str, mut substitute: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    IDENTIFIER
        .replace_all(text, |caps: &Captures| {
            let ident = &caps[0];
            substitute(ident).unwrap_or_else(|| ident.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(name: &str, default: Option<&str>, constraint: Option<&str>) -> TypeParameter {
        TypeParameter {
            name: name.to_string(),
            default: default.map(String::from),
            constraint: constraint.map(String::from),
        }
    }

    #[test]
    fn test_no_scope_is_identity() {
        assert_eq!(normalize_type("  Promise<T> ", &[], &[]), "Promise<T>");
    }

    #[test]
    fn test_unconstrained_becomes_wildcard() {
        let own = [tp("T", None, None)];
        assert_eq!(normalize_type("Array<T>", &[], &own), "Array<any>");
    }

    #[test]
    fn test_default_wins_over_constraint() {
        let own = [tp("K", Some("string"), Some("PropertyKey"))];
        assert_eq!(normalize_type("Record<K, number>", &[], &own), "Record<(string), number>");
    }

    #[test]
    fn test_whole_identifiers_only() {
        let own = [tp("T", None, Some("number"))];
        assert_eq!(normalize_type("T | Tree | $T", &[], &own), "(number) | Tree | $T");
    }

    #[test]
    fn test_constraints_expand_through_other_parameters() {
        let own = [tp("T", None, None), tp("U", None, Some("Array<T>"))];
        assert_eq!(normalize_type("U", &[], &own), "(Array<any>)");
    }

    #[test]
    fn test_self_reference_terminates() {
        let own = [tp("T", None, Some("Comparable<T>"))];
        assert_eq!(normalize_type("T", &[], &own), "(Comparable<any>)");
    }

    #[test]
    fn test_replace_identifiers_matches_whole_runs() {
        let replaced = replace_identifiers("Map<K_1, $K> | K", |ident| {
            (ident == "K").then(|| "string".to_string())
        });
        assert_eq!(replaced, "Map<K_1, $K> | string");
        assert_eq!(replace_identifiers("", |_| Some("x".to_string())), "");
    }

    #[test]
    fn test_signature_shadows_class_parameter() {
        let class = [tp("T", None, Some("string"))];
        let own = [tp("T", None, None)];
        assert_eq!(normalize_type("T", &class, &own), "any");
        assert_eq!(normalize_type("T", &class, &[]), "(string)");
    }
}
