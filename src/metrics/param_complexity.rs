//! APXI: parameter list complexity
//!
//! Two sub-scores per signature. Length complexity decays exponentially once
//! the parameter count reaches the threshold. Sequence complexity is high when
//! adjacent parameters have types that cannot be confused with each other.
//! Groups average each sub-score first and combine afterwards.

use crate::aggregate::safe_div;
use crate::error::Result;
use crate::model::{Construct, SignatureRef};
use crate::normalize::normalize_type;
use crate::oracle::{compare_pairs, TypeOracle};
use crate::types::{SourceScore, SubScores};

pub const LENGTH_COMPLEXITY: &str = "length_complexity";
pub const SEQUENCE_COMPLEXITY: &str = "sequence_complexity";

/// `exp(max - n)` once `n >= max`, otherwise 1
pub fn length_complexity(max: usize, n: usize) -> f64 {
    if n >= max {
        (max as f64 - n as f64).exp()
    } else {
        1.0
    }
}

/// `1 - equivalentAdjacentPairs / (n - 1)`, 1 for lists of zero or one type
pub fn sequence_complexity(types: &[String], oracle: &dyn TypeOracle) -> Result<f64> {
    if types.len() <= 1 {
        return Ok(1.0);
    }
    let pairs: Vec<(&str, &str)> = types
        .windows(2)
        .map(|w| (w[0].as_str(), w[1].as_str()))
        .collect();
    let equivalent = compare_pairs(oracle, &pairs)?
        .into_iter()
        .filter(|&eq| eq)
        .count();
    Ok(1.0 - safe_div(equivalent as f64, pairs.len() as f64))
}

/// Mean of the two sub-scores; a missing sub-score counts as 0
pub fn combine(sub_scores: &SubScores) -> f64 {
    let length = sub_scores.get(LENGTH_COMPLEXITY).copied().unwrap_or(0.0);
    let sequence = sub_scores.get(SEQUENCE_COMPLEXITY).copied().unwrap_or(0.0);
    (length + sequence) / 2.0
}

fn parameter_types(construct: &Construct<'_>, signature: &SignatureRef<'_>) -> Vec<String> {
    signature
        .parameters
        .iter()
        .map(|p| {
            normalize_type(
                p.effective_type(),
                construct.class_scope,
                signature.type_parameters,
            )
        })
        .collect()
}

/// Score every signature callers can see. Overloaded declarations are scored
/// on their overloads, not on the implementation.
pub fn score_construct(
    construct: &Construct<'_>,
    oracle: &dyn TypeOracle,
    max_param_count: usize,
) -> Result<Vec<SourceScore>> {
    let signatures = construct.callable.visible_signatures();
    let overloaded = construct.callable.has_overloads();
    let name = construct.id.callable_name();

    let mut scores = Vec::with_capacity(signatures.len());
    for (i, signature) in signatures.iter().enumerate() {
        let types = parameter_types(construct, signature);
        let sub_scores = SubScores::from([
            (
                LENGTH_COMPLEXITY.to_string(),
                length_complexity(max_param_count, types.len()),
            ),
            (
                SEQUENCE_COMPLEXITY.to_string(),
                sequence_complexity(&types, oracle)?,
            ),
        ]);
        scores.push(SourceScore {
            name: if overloaded {
                format!("{}#{}", name, i + 1)
            } else {
                name.to_string()
            },
            score: combine(&sub_scores),
            sub_scores,
        });
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Rollup, Tally};
    use crate::metrics::test_support::*;
    use crate::model::{Callable, ConstructId};

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_length_complexity_threshold() {
        assert_eq!(length_complexity(4, 4), 1.0);
        assert_eq!(length_complexity(4, 5), (-1.0f64).exp());
        assert_eq!(length_complexity(4, 3), 1.0);
        assert!(length_complexity(4, 8) < length_complexity(4, 6));
    }

    #[test]
    fn test_sequence_complexity_two_parameters() {
        let same = sequence_complexity(&types(&["string", "string"]), &ExactOracle).unwrap();
        let different = sequence_complexity(&types(&["string", "number"]), &ExactOracle).unwrap();
        assert_eq!(same, 0.0);
        assert_eq!(different, 1.0);
    }

    #[test]
    fn test_sequence_complexity_short_lists() {
        assert_eq!(sequence_complexity(&[], &BrokenOracle).unwrap(), 1.0);
        assert_eq!(sequence_complexity(&types(&["string"]), &BrokenOracle).unwrap(), 1.0);
    }

    #[test]
    fn test_wildcard_matches_neighbour() {
        let score = sequence_complexity(&types(&["any", "number", "string"]), &ExactOracle).unwrap();
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_untyped_parameters_fall_back_to_wildcard() {
        let callable = function(vec![
            crate::model::Parameter {
                name: "a".into(),
                ..Default::default()
            },
            param("b", "number"),
        ]);
        let construct = Construct {
            id: ConstructId::function("m.ts", "f"),
            callable: &callable,
            class_scope: &[],
        };
        let scores = score_construct(&construct, &BrokenOracle, 4).unwrap();
        assert_eq!(scores[0].sub_scores[SEQUENCE_COMPLEXITY], 0.0);
    }

    #[test]
    fn test_overloads_replace_implementation() {
        let callable = Callable {
            parameters: vec![param("x", "string"), param("y", "string")],
            overloads: vec![
                overload(None, vec![param("x", "string")]),
                overload(None, vec![param("x", "string"), param("y", "number")]),
            ],
            ..Default::default()
        };
        let construct = Construct {
            id: ConstructId::function("m.ts", "parse"),
            callable: &callable,
            class_scope: &[],
        };
        let scores = score_construct(&construct, &ExactOracle, 4).unwrap();
        let names: Vec<_> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["parse#1", "parse#2"]);
        assert!(scores.iter().all(|s| s.sub_scores[SEQUENCE_COMPLEXITY] == 1.0));
    }

    #[test]
    fn test_group_combines_after_reducing_sub_scores() {
        let mut tally = Tally::new(Rollup::CombineSubScores(combine));
        let wide = function((0..6).map(|i| param(&format!("p{}", i), "string")).collect());
        let narrow = function(vec![param("a", "string"), param("b", "number")]);
        for (name, callable) in [("wide", &wide), ("narrow", &narrow)] {
            let construct = Construct {
                id: ConstructId::function("m.ts", name),
                callable,
                class_scope: &[],
            };
            tally.record(&construct.id, score_construct(&construct, &ExactOracle, 4).unwrap());
        }
        let modules = tally.finish();
        let module = &modules["m.ts"];

        let length = ((-2.0f64).exp() + 1.0) / 2.0;
        let sequence = (0.0 + 1.0) / 2.0;
        assert!((module.sub_scores[LENGTH_COMPLEXITY] - length).abs() < 1e-12);
        assert!((module.sub_scores[SEQUENCE_COMPLEXITY] - sequence).abs() < 1e-12);
        assert!((module.score - (length + sequence) / 2.0).abs() < 1e-12);
    }
}
