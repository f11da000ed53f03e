//! Type-equivalence oracle contract and the default lexical implementation
//!
//! The engine never decides type equivalence itself. It hands ground type
//! expressions to a [`TypeOracle`] and reduces the boolean answers. Oracles are
//! not shared across workers: each worker asks an [`OracleFactory`] to rebuild
//! one from the project's [`ContextHandle`].

use crate::error::{MetricsError, Result};
use crate::model::WILDCARD_TYPE;
use crate::normalize::replace_identifiers;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Maximum alias expansion depth before an alias is left as written
const MAX_ALIAS_DEPTH: usize = 8;

/// Opaque, re-creatable handle identifying the compilation context
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextHandle(String);

impl ContextHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decides whether two ground type expressions are interchangeable.
///
/// Implementations must be reflexive, symmetric and free of side effects for
/// a fixed context.
pub trait TypeOracle {
    fn equivalent(&self, left: &str, right: &str) -> Result<bool>;

    /// Answers many comparisons at once, in order
    fn equivalent_batch(&self, pairs: &[(&str, &str)]) -> Result<Vec<bool>> {
        pairs
            .iter()
            .map(|(left, right)| self.equivalent(left, right))
            .collect()
    }
}

/// Rebuilds an oracle inside a worker from a serializable handle
pub trait OracleFactory: Send + Sync {
    fn build(&self, context: &ContextHandle) -> Result<Box<dyn TypeOracle>>;
}

/// True when the expression is the wildcard, possibly parenthesized
pub fn is_wildcard(expr: &str) -> bool {
    strip_outer_parens(expr.trim()) == WILDCARD_TYPE
}

/// Compares each pair, letting a wildcard on either side match anything.
/// Non-wildcard pairs go to the oracle in a single batch.
pub fn compare_pairs(oracle: &dyn TypeOracle, pairs: &[(&str, &str)]) -> Result<Vec<bool>> {
    let mut answers = vec![true; pairs.len()];
    let mut pending = Vec::new();
    let mut slots = Vec::new();

    for (i, (left, right)) in pairs.iter().enumerate() {
        if !is_wildcard(left) && !is_wildcard(right) {
            pending.push((*left, *right));
            slots.push(i);
        }
    }

    if !pending.is_empty() {
        let results = oracle.equivalent_batch(&pending)?;
        if results.len() != pending.len() {
            return Err(MetricsError::oracle(
                "<batch>",
                "<batch>",
                format!(
                    "expected {} answers, oracle returned {}",
                    pending.len(),
                    results.len()
                ),
            ));
        }
        for (slot, equivalent) in slots.into_iter().zip(results) {
            answers[slot] = equivalent;
        }
    }

    Ok(answers)
}

/// Oracle that compares canonicalized spellings of type expressions.
///
/// Canonicalization removes whitespace and redundant outer parentheses,
/// expands known aliases and sorts the members of top-level unions and
/// intersections. It cannot see through structurally identical but
/// differently named types; plug in a real checker for that.
#[derive(Debug, Clone, Default)]
pub struct LexicalOracle {
    aliases: HashMap<String, String>,
}

impl LexicalOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Canonical spelling used for comparisons
    pub fn canonical(&self, expr: &str) -> String {
        let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
        let expanded = self.expand_aliases(&compact, 0);
        canonicalize(&expanded)
    }

    fn expand_aliases(&self, expr: &str, depth: usize) -> String {
        if self.aliases.is_empty() || depth >= MAX_ALIAS_DEPTH {
            return expr.to_string();
        }
        let mut changed = false;
        let replaced = replace_identifiers(expr, |ident| {
            self.aliases.get(ident).map(|target| {
                changed = true;
                let compact: String = target.chars().filter(|c| !c.is_whitespace()).collect();
                format!("({})", compact)
            })
        });
        if changed {
            self.expand_aliases(&replaced, depth + 1)
        } else {
            replaced
        }
    }
}

impl TypeOracle for LexicalOracle {
    fn equivalent(&self, left: &str, right: &str) -> Result<bool> {
        Ok(self.canonical(left) == self.canonical(right))
    }
}

/// Builds [`LexicalOracle`]s. A non-empty context handle names a JSON file
/// mapping alias names to their definitions.
#[derive(Debug, Clone, Default)]
pub struct LexicalOracleFactory;

impl OracleFactory for LexicalOracleFactory {
    fn build(&self, context: &ContextHandle) -> Result<Box<dyn TypeOracle>> {
        if context.is_empty() {
            return Ok(Box::new(LexicalOracle::new()));
        }
        let path = Path::new(context.as_str());
        let content = std::fs::read_to_string(path).map_err(|e| {
            MetricsError::config(format!(
                "cannot read type context {}: {}",
                path.display(),
                e
            ))
        })?;
        let aliases: HashMap<String, String> = serde_json::from_str(&content)?;
        debug!("Loaded {} type aliases from {}", aliases.len(), path.display());
        Ok(Box::new(LexicalOracle::with_aliases(aliases)))
    }
}

fn strip_outer_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && wraps_whole(expr) {
        expr = &expr[1..expr.len() - 1];
    }
    expr
}

/// True when the opening parenthesis at index 0 closes at the last character
fn wraps_whole(expr: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == expr.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Splits on `separator` where it appears outside any brackets
fn split_top_level(expr: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            // `=>` is not a closing angle bracket
            '>' if !expr[..i].ends_with('=') => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

fn canonicalize(expr: &str) -> String {
    let expr = strip_outer_parens(expr);
    for separator in ['|', '&'] {
        let members: Vec<&str> = split_top_level(expr, separator)
            .into_iter()
            .filter(|m| !m.is_empty())
            .collect();
        if members.len() > 1 {
            let mut canonical: Vec<String> = members.into_iter().map(canonicalize).collect();
            canonical.sort();
            canonical.dedup();
            return canonical.join(&separator.to_string());
        }
    }
    expr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_equivalence_ignores_layout_and_member_order() {
        let oracle = LexicalOracle::new();
        assert!(oracle.equivalent("string | number", "number|string").unwrap());
        assert!(oracle.equivalent("((Foo))", "Foo").unwrap());
        assert!(oracle.equivalent("A & (B | C)", "(C | B) & A").unwrap());
        assert!(!oracle.equivalent("string", "number").unwrap());
    }

    #[test]
    fn test_lexical_equivalence_is_symmetric_and_reflexive() {
        let oracle = LexicalOracle::new();
        for (a, b) in [("Map<K, V>", "Map<K,V>"), ("() => void", "string")] {
            assert!(oracle.equivalent(a, a).unwrap());
            assert_eq!(oracle.equivalent(a, b).unwrap(), oracle.equivalent(b, a).unwrap());
        }
    }

    #[test]
    fn test_aliases_expand_before_comparison() {
        let aliases = HashMap::from([("UserId".to_string(), "string | number".to_string())]);
        let oracle = LexicalOracle::with_aliases(aliases);
        assert!(oracle.equivalent("UserId", "number | string").unwrap());
    }

    #[test]
    fn test_cyclic_aliases_terminate() {
        let aliases = HashMap::from([("Node".to_string(), "Array<Node>".to_string())]);
        let oracle = LexicalOracle::with_aliases(aliases);
        assert!(oracle.equivalent("Node", "Node").unwrap());
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(is_wildcard("any"));
        assert!(is_wildcard(" (any) "));
        assert!(!is_wildcard("Array<any>"));
    }

    #[test]
    fn test_compare_pairs_short_circuits_wildcards() {
        struct Refusing;
        impl TypeOracle for Refusing {
            fn equivalent(&self, left: &str, right: &str) -> Result<bool> {
                Err(MetricsError::oracle(left, right, "should not be asked"))
            }
        }
        let answers = compare_pairs(&Refusing, &[("any", "string"), ("(any)", "any")]).unwrap();
        assert_eq!(answers, vec![true, true]);
        assert!(compare_pairs(&Refusing, &[("string", "number")]).is_err());
    }

    #[test]
    fn test_factory_without_context_builds_plain_oracle() {
        let oracle = LexicalOracleFactory.build(&ContextHandle::default()).unwrap();
        assert!(oracle.equivalent("a|b", "b|a").unwrap());
    }

    #[test]
    fn test_factory_reads_alias_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, r#"{ "Id": "string" }"#).unwrap();

        let handle = ContextHandle::new(path.display().to_string());
        let oracle = LexicalOracleFactory.build(&handle).unwrap();
        assert!(oracle.equivalent("Id", "string").unwrap());
    }

    #[test]
    fn test_factory_reports_missing_context() {
        let handle = ContextHandle::new("/nonexistent/aliases.json");
        assert!(LexicalOracleFactory.build(&handle).is_err());
    }
}
