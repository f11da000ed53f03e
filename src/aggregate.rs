//! Roll-up of signature scores into construct, module and project scores
//!
//! Every level is a mean of the level below. Empty levels score 0. Modules
//! with nothing to score are kept as 0 entries so they still weigh on the
//! project score; constructs with nothing to score are left out.

use crate::model::ConstructId;
use crate::types::{ConstructKind, ConstructResult, ModuleResult, SourceScore, SubScores};
use std::collections::BTreeMap;

/// Division that resolves a zero or non-finite quotient to 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Arithmetic mean; 0 for an empty input
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    safe_div(sum, count as f64)
}

/// Mean of each named sub-score across all maps. A map lacking a key (an
/// empty module, say) counts as 0 for it.
pub fn mean_sub_scores<'a, I>(maps: I) -> SubScores
where
    I: IntoIterator<Item = &'a SubScores>,
{
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut count = 0usize;
    for map in maps {
        count += 1;
        for (key, value) in map {
            *sums.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    sums.into_iter()
        .map(|(key, sum)| (key, safe_div(sum, count as f64)))
        .collect()
}

/// How a group of child results reduces into one score
#[derive(Clone, Copy)]
pub enum Rollup {
    /// Mean of the child scores
    MeanOfScores,
    /// Reduce each sub-score across the children first, then combine
    CombineSubScores(fn(&SubScores) -> f64),
}

impl Rollup {
    pub fn reduce<'a, I>(&self, children: I) -> (f64, SubScores)
    where
        I: IntoIterator<Item = (f64, &'a SubScores)>,
    {
        let children: Vec<_> = children.into_iter().collect();
        let sub_scores = mean_sub_scores(children.iter().map(|(_, subs)| *subs));
        let score = match self {
            Rollup::MeanOfScores => mean(children.iter().map(|(score, _)| *score)),
            Rollup::CombineSubScores(_) if children.is_empty() => 0.0,
            Rollup::CombineSubScores(combine) => combine(&sub_scores),
        };
        (score, sub_scores)
    }
}

#[derive(Debug, Default)]
struct ConstructTally {
    /// Signature scores of a free function
    signatures: Vec<SourceScore>,
    /// Signature scores of each public method by position and name, for classes
    methods: BTreeMap<(usize, String), Vec<SourceScore>>,
    is_class: bool,
}

/// Collects signature scores and rolls them up per module
pub struct Tally {
    rollup: Rollup,
    modules: BTreeMap<String, BTreeMap<String, ConstructTally>>,
}

impl Tally {
    pub fn new(rollup: Rollup) -> Self {
        Self {
            rollup,
            modules: BTreeMap::new(),
        }
    }

    /// Register a module so it appears in the output even with nothing scored
    pub fn touch_module(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default();
    }

    /// Record the scores of a construct's signatures. Methods are grouped under
    /// their owning class.
    pub fn record(&mut self, id: &ConstructId, signatures: Vec<SourceScore>) {
        let constructs = self.modules.entry(id.module.clone()).or_default();
        let tally = constructs.entry(id.name.clone()).or_default();
        match &id.method {
            Some(method) => {
                tally.is_class = true;
                tally
                    .methods
                    .entry((id.position, method.clone()))
                    .or_default()
                    .extend(signatures);
            }
            None => tally.signatures.extend(signatures),
        }
    }

    pub fn finish(self) -> BTreeMap<String, ModuleResult> {
        let rollup = self.rollup;
        self.modules
            .into_iter()
            .map(|(path, constructs)| {
                let constructs: BTreeMap<String, ConstructResult> = constructs
                    .into_iter()
                    .map(|(name, tally)| {
                        let result = finish_construct(&rollup, &name, tally);
                        (name, result)
                    })
                    .collect();
                let (score, sub_scores) =
                    rollup.reduce(constructs.values().map(|c| (c.score, &c.sub_scores)));
                (
                    path,
                    ModuleResult {
                        score,
                        sub_scores,
                        constructs,
                    },
                )
            })
            .collect()
    }
}

fn finish_construct(rollup: &Rollup, name: &str, tally: ConstructTally) -> ConstructResult {
    let (kind, sources) = if tally.is_class {
        let methods: Vec<SourceScore> = tally
            .methods
            .into_iter()
            .map(|((_, method), signatures)| {
                let (score, sub_scores) =
                    rollup.reduce(signatures.iter().map(|s| (s.score, &s.sub_scores)));
                SourceScore {
                    name: method,
                    score,
                    sub_scores,
                }
            })
            .collect();
        (ConstructKind::Class, methods)
    } else {
        (ConstructKind::Function, tally.signatures)
    };

    let (score, sub_scores) = rollup.reduce(sources.iter().map(|s| (s.score, &s.sub_scores)));
    ConstructResult {
        name: name.to_string(),
        kind,
        score,
        sub_scores,
        sources,
    }
}

/// Project score over the module results
pub fn project_score(rollup: &Rollup, modules: &BTreeMap<String, ModuleResult>) -> (f64, SubScores) {
    rollup.reduce(modules.values().map(|m| (m.score, &m.sub_scores)))
}
