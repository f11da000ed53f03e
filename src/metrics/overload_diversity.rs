//! AMNOI: how consistently the overloads of a declaration agree on their
//! return type

use crate::aggregate::safe_div;
use crate::error::Result;
use crate::model::Construct;
use crate::normalize::normalize_type;
use crate::oracle::{compare_pairs, TypeOracle};
use crate::types::{SourceScore, SubScores};

/// Return type assumed for an overload that declares none
pub const MISSING_RETURN_TYPE: &str = "undefined";

/// Normalized return types of the construct's overloads, in declaration order
pub fn return_types(construct: &Construct<'_>) -> Vec<String> {
    construct
        .callable
        .overloads
        .iter()
        .map(|overload| {
            normalize_type(
                overload.return_type.as_deref().unwrap_or(MISSING_RETURN_TYPE),
                construct.class_scope,
                &overload.type_parameters,
            )
        })
        .collect()
}

/// Number of equivalence classes among `types`.
///
/// All pairs go to the oracle in one batch. Each type joins the class of the
/// first earlier representative it is equivalent to, or opens a new class.
pub fn distinct_classes(types: &[String], oracle: &dyn TypeOracle) -> Result<usize> {
    let n = types.len();
    if n <= 1 {
        return Ok(n);
    }

    let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            pairs.push((types[i].as_str(), types[j].as_str()));
        }
    }
    let answers = compare_pairs(oracle, &pairs)?;
    // Position of (i, j), i < j, in the row-major upper triangle
    let slot = |i: usize, j: usize| i * (2 * n - i - 1) / 2 + (j - i - 1);

    let mut representatives: Vec<usize> = Vec::new();
    for k in 0..n {
        if !representatives.iter().any(|&r| answers[slot(r, k)]) {
            representatives.push(k);
        }
    }
    Ok(representatives.len())
}

/// `1 - (classes - 1) / (overloads - 1)`, 1 for a single overload
pub fn diversity_score(classes: usize, overloads: usize) -> f64 {
    1.0 - safe_div(
        classes.saturating_sub(1) as f64,
        overloads.saturating_sub(1) as f64,
    )
}

/// Score an overloaded function or method. Declarations without overloads
/// are skipped and yield nothing.
pub fn score_construct(construct: &Construct<'_>, oracle: &dyn TypeOracle) -> Result<Vec<SourceScore>> {
    if !construct.callable.has_overloads() {
        return Ok(Vec::new());
    }
    let types = return_types(construct);
    let classes = distinct_classes(&types, oracle)?;
    Ok(vec![SourceScore {
        name: construct.id.callable_name().to_string(),
        score: diversity_score(classes, types.len()),
        sub_scores: SubScores::new(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use crate::metrics::test_support::*;
    use crate::model::{Callable, ConstructId, TypeParameter};
    use crate::oracle::LexicalOracle;

    fn overloaded(returns: &[Option<&str>]) -> Callable {
        Callable {
            overloads: returns.iter().map(|r| overload(*r, Vec::new())).collect(),
            ..Default::default()
        }
    }

    fn score(callable: &Callable, oracle: &dyn TypeOracle) -> Result<Vec<SourceScore>> {
        let construct = Construct {
            id: ConstructId::function("m.ts", "f"),
            callable,
            class_scope: &[],
        };
        score_construct(&construct, oracle)
    }

    #[test]
    fn test_single_overload_scores_one() {
        let scores = score(&overloaded(&[Some("string")]), &ExactOracle).unwrap();
        assert_eq!(scores[0].score, 1.0);
    }

    #[test]
    fn test_equivalent_overloads_score_one() {
        let callable = overloaded(&[Some("string"), Some("string"), Some("string"), Some("string")]);
        assert_eq!(score(&callable, &ExactOracle).unwrap()[0].score, 1.0);
    }

    #[test]
    fn test_pairwise_distinct_overloads_score_zero() {
        let callable = overloaded(&[Some("string"), Some("number"), Some("boolean")]);
        assert_eq!(score(&callable, &ExactOracle).unwrap()[0].score, 0.0);
    }

    #[test]
    fn test_partial_agreement() {
        let callable = overloaded(&[Some("string"), Some("number"), Some("string")]);
        assert_eq!(score(&callable, &ExactOracle).unwrap()[0].score, 0.5);
    }

    #[test]
    fn test_wildcard_absorbs_later_types() {
        let types: Vec<String> = ["any", "string", "number"].iter().map(|t| t.to_string()).collect();
        assert_eq!(distinct_classes(&types, &ExactOracle).unwrap(), 1);
    }

    #[test]
    fn test_missing_return_types_are_undefined() {
        let callable = overloaded(&[None, Some("undefined")]);
        assert_eq!(score(&callable, &ExactOracle).unwrap()[0].score, 1.0);
    }

    #[test]
    fn test_declaration_without_overloads_is_skipped() {
        assert!(score(&Callable::default(), &ExactOracle).unwrap().is_empty());
    }

    #[test]
    fn test_generic_return_types_are_normalized() {
        let mut callable = overloaded(&[Some("T"), Some("string")]);
        callable.overloads[0].type_parameters = vec![TypeParameter {
            name: "T".into(),
            default: Some("string".into()),
            constraint: None,
        }];
        assert_eq!(score(&callable, &LexicalOracle::new()).unwrap()[0].score, 1.0);
    }

    #[test]
    fn test_class_scope_reaches_method_overloads() {
        let callable = overloaded(&[Some("Item"), Some("number")]);
        let class_scope = [TypeParameter {
            name: "Item".into(),
            default: None,
            constraint: Some("number".into()),
        }];
        let construct = Construct {
            id: ConstructId::method("m.ts", "Queue", "peek"),
            callable: &callable,
            class_scope: &class_scope,
        };
        assert_eq!(return_types(&construct), vec!["(number)", "number"]);
        let scores = score_construct(&construct, &LexicalOracle::new()).unwrap();
        assert_eq!(scores[0].name, "peek");
        assert_eq!(scores[0].score, 1.0);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let callable = overloaded(&[Some("string"), Some("number")]);
        assert!(matches!(
            score(&callable, &BrokenOracle),
            Err(MetricsError::Oracle { .. })
        ));
    }
}
