//! AMNCI: names that differ only by case, underscores or a numeric suffix

use crate::aggregate::safe_div;
use crate::model::Project;
use crate::types::{MetricDetails, MetricKind, MetricReport};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Upper-cased name without its trailing digit run and without underscores
pub fn canonical_name(name: &str) -> String {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
        .replace('_', "")
        .to_uppercase()
}

/// Every function and public method name, each once, in first-seen order
pub fn callable_names(project: &Project) -> Vec<String> {
    let mut seen = HashSet::new();
    project
        .constructs()
        .map(|c| c.id.callable_name().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Names sharing their canonical form with at least one other name. Names
/// are distinct, so a name never collides with itself.
pub fn confusing_names(names: &[String]) -> Vec<String> {
    let mut spellings: HashMap<String, usize> = HashMap::new();
    for name in names {
        *spellings.entry(canonical_name(name)).or_default() += 1;
    }
    names
        .iter()
        .filter(|name| spellings[&canonical_name(name)] > 1)
        .cloned()
        .collect()
}

pub fn compute(project: &Project) -> MetricReport {
    let names = callable_names(project);
    let confusing = confusing_names(&names);
    let score = 1.0 - safe_div(confusing.len() as f64, names.len() as f64);
    debug!(
        "{}: {} of {} names are confusing",
        project.name,
        confusing.len(),
        names.len()
    );

    let canonical_names: BTreeMap<String, String> = names
        .iter()
        .map(|name| (name.clone(), canonical_name(name)))
        .collect();
    MetricReport::new(&project.name, MetricKind::Amnci, score).with_details(
        MetricDetails::NameConfusion {
            canonical_names,
            confusing_names: confusing,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::project;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(canonical_name("getUser"), "GETUSER");
        assert_eq!(canonical_name("get_user"), "GETUSER");
        assert_eq!(canonical_name("getUser2"), "GETUSER");
        assert_eq!(canonical_name("get_user_10"), "GETUSER");
        assert_eq!(canonical_name("v2_load"), "V2LOAD");
    }

    #[test]
    fn test_distinct_spellings_are_confusing() {
        let list = names(&["getUser", "get_user", "getUser2", "deleteUser"]);
        assert_eq!(
            confusing_names(&list),
            names(&["getUser", "get_user", "getUser2"])
        );
    }

    #[test]
    fn test_name_never_collides_with_itself() {
        assert!(confusing_names(&names(&["load", "save"])).is_empty());
    }

    #[test]
    fn test_repeated_name_counts_once() {
        let project = project(
            r#"{ "name": "p", "modules": {
                "a.ts": { "load": [{ "kind": "function" }] },
                "b.ts": {
                    "Loader": [{ "kind": "class", "methods": [{ "name": "load" }, { "name": "load_2" }] }]
                }
            } }"#,
        );
        let report = compute(&project);
        assert_eq!(report.score, 0.0);
        match report.details {
            Some(MetricDetails::NameConfusion { confusing_names, .. }) => {
                assert_eq!(confusing_names, names(&["load", "load_2"]));
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_empty_project_scores_one() {
        let project = project(r#"{ "name": "p" }"#);
        assert_eq!(compute(&project).score, 1.0);
    }
}
