//! AMGI: whether names sharing a keyword are grouped in the same modules
//!
//! A keyword spread over many modules with few occurrences each scores low;
//! a keyword concentrated in one module scores 1.

use crate::aggregate::{mean, safe_div};
use crate::metrics::name_confusion::callable_names;
use crate::model::Project;
use crate::types::{KeywordRun, MetricDetails, MetricKind, MetricReport};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

const ACCESSOR_PREFIXES: [&str; 2] = ["get", "set"];
const CONNECTORS: [&str; 3] = ["by", "of", "to"];

fn strip_accessor(name: &str) -> &str {
    for prefix in ACCESSOR_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            // `getUser`, `get_user`, but not `getter`
            if rest
                .chars()
                .next()
                .is_some_and(|c| c == '_' || c.is_ascii_digit() || c.is_uppercase())
            {
                return rest;
            }
        }
    }
    name
}

fn split_camel_case(segment: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = segment.chars().collect();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let boundary = c.is_uppercase()
            && i > 0
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || (chars[i - 1].is_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_lowercase())));
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
}

/// Lower-cased significant words of a name, in order
pub fn significant_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for segment in strip_accessor(name).split(['_', '-', '[', ']']) {
        split_camel_case(segment, &mut words);
    }
    words
        .into_iter()
        .map(|w| w.to_lowercase())
        .filter(|w| !CONNECTORS.contains(&w.as_str()))
        .collect()
}

fn distinct_words(name: &str) -> BTreeSet<String> {
    significant_words(name).into_iter().collect()
}

/// `1 - (modules - 1) / (occurrences - 1)`
pub fn keyword_score(modules: usize, occurrences: usize) -> f64 {
    1.0 - safe_div(
        modules.saturating_sub(1) as f64,
        occurrences.saturating_sub(1) as f64,
    )
}

/// Keywords found in at least two distinct names
pub fn retained_keywords(project: &Project) -> BTreeSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in callable_names(project) {
        for word in distinct_words(&name) {
            *counts.entry(word).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(word, _)| word)
        .collect()
}

pub fn compute(project: &Project) -> MetricReport {
    let retained = retained_keywords(project);

    // keyword -> module -> occurrences, overloads counting once each
    let mut histogram: BTreeMap<String, BTreeMap<&str, usize>> = BTreeMap::new();
    for (path, module) in &project.modules {
        for construct in module.constructs(path) {
            let weight = construct.callable.entry_weight();
            for word in distinct_words(construct.id.callable_name()) {
                if retained.contains(&word) {
                    *histogram
                        .entry(word)
                        .or_default()
                        .entry(path.as_str())
                        .or_default() += weight;
                }
            }
        }
    }

    let keywords: BTreeMap<String, KeywordRun> = histogram
        .into_iter()
        .map(|(word, per_module)| {
            let modules = per_module.len();
            let occurrences = per_module.values().sum();
            let run = KeywordRun {
                modules,
                occurrences,
                score: keyword_score(modules, occurrences),
            };
            (word, run)
        })
        .collect();

    let score = mean(keywords.values().map(|run| run.score));
    debug!(
        "{}: {} grouping keywords, score {:.3}",
        project.name,
        keywords.len(),
        score
    );
    MetricReport::new(&project.name, MetricKind::Amgi, score)
        .with_details(MetricDetails::KeywordGrouping { keywords })
}
