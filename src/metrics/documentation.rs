//! ADI: documentation coverage of functions and public methods

use crate::aggregate::{Rollup, Tally};
use crate::metrics::module_report;
use crate::model::{Callable, Project};
use crate::types::{MetricKind, MetricReport, SourceScore, SubScores};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("Invalid word regex"));

pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Words across the declaration's own docs and the docs of its overloads
pub fn documented_words(callable: &Callable) -> usize {
    callable
        .docs
        .iter()
        .chain(callable.overloads.iter().flat_map(|o| o.docs.iter()))
        .map(|block| word_count(block))
        .sum()
}

/// `min(1, words / word_target)`
pub fn coverage_score(words: usize, word_target: usize) -> f64 {
    if word_target == 0 {
        return 1.0;
    }
    (words as f64 / word_target as f64).min(1.0)
}

pub fn compute(project: &Project, word_target: usize) -> MetricReport {
    let mut tally = Tally::new(Rollup::MeanOfScores);
    for (path, module) in &project.modules {
        tally.touch_module(path);
        for construct in module.constructs(path) {
            let words = documented_words(construct.callable);
            tally.record(
                &construct.id,
                vec![SourceScore {
                    name: construct.id.callable_name().to_string(),
                    score: coverage_score(words, word_target),
                    sub_scores: SubScores::new(),
                }],
            );
        }
    }

    let report = module_report(&project.name, MetricKind::Adi, tally.finish());
    debug!("{} documentation coverage: {:.3}", project.name, report.score);
    report
}
