//! APLCI: whether parameter names that appear together keep the same order

use crate::aggregate::safe_div;
use crate::model::Project;
use crate::types::{MetricDetails, MetricKind, MetricReport};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Times a pair `(a, b)`, `a < b`, appeared in each relative order
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PairOrder {
    pub forward: usize,
    pub reverse: usize,
}

impl PairOrder {
    pub fn occurrences(&self) -> usize {
        self.forward + self.reverse
    }

    pub fn is_consistent(&self) -> bool {
        self.forward == 0 || self.reverse == 0
    }
}

/// Parameter name lists of every signature callers can see: overloads when
/// present, else the declaration itself
pub fn signature_parameters(project: &Project) -> Vec<Vec<&str>> {
    project
        .constructs()
        .flat_map(|construct| {
            construct
                .callable
                .visible_signatures()
                .into_iter()
                .map(|signature| {
                    signature
                        .parameters
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Relative orders of every pair of distinct names sharing a signature. A
/// name repeated in one list counts at its first position.
pub fn pair_orders<'a>(signatures: &[Vec<&'a str>]) -> BTreeMap<(&'a str, &'a str), PairOrder> {
    let mut orders: BTreeMap<(&str, &str), PairOrder> = BTreeMap::new();
    for names in signatures {
        let mut seen = HashSet::new();
        let firsts: Vec<&str> = names.iter().copied().filter(|n| seen.insert(*n)).collect();
        for (i, &left) in firsts.iter().enumerate() {
            for &right in &firsts[i + 1..] {
                let order = if left < right {
                    &mut orders.entry((left, right)).or_default().forward
                } else {
                    &mut orders.entry((right, left)).or_default().reverse
                };
                *order += 1;
            }
        }
    }
    orders
}

pub fn compute(project: &Project) -> MetricReport {
    let signatures = signature_parameters(project);
    let orders = pair_orders(&signatures);

    let eligible: Vec<_> = orders
        .iter()
        .filter(|(_, order)| order.occurrences() >= 2)
        .collect();
    let consistent = eligible.iter().filter(|(_, order)| order.is_consistent()).count();
    let inconsistent_pairs: Vec<(String, String)> = eligible
        .iter()
        .filter(|(_, order)| !order.is_consistent())
        .map(|((a, b), _)| (a.to_string(), b.to_string()))
        .collect();

    let score = safe_div(consistent as f64, eligible.len() as f64);
    debug!(
        "{}: {}/{} parameter pairs keep their order",
        project.name,
        consistent,
        eligible.len()
    );
    MetricReport::new(&project.name, MetricKind::Aplci, score).with_details(
        MetricDetails::ParameterOrder {
            eligible_pairs: eligible.len(),
            consistent_pairs: consistent,
            inconsistent_pairs,
        },
    )
}
