//! The six usability metrics
//!
//! AMNOI and APXI compare types and run per chunk on the worker pool, each
//! chunk with its own oracle. The other four are cheap and run in-process over
//! the whole project.

pub mod documentation;
pub mod keyword_grouping;
pub mod name_confusion;
pub mod overload_diversity;
pub mod param_complexity;
pub mod param_order;

use crate::aggregate::{project_score, Rollup, Tally};
use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use crate::model::{Module, Project};
use crate::oracle::{ContextHandle, OracleFactory, TypeOracle};
use crate::scheduler::Chunk;
use crate::types::{MetricKind, MetricReport, ModuleResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Self-contained unit of pooled work: owned modules plus the handle each
/// worker rebuilds its oracle from
#[derive(Debug, Clone)]
pub struct ChunkTask {
    pub metric: MetricKind,
    pub context: ContextHandle,
    pub modules: Chunk,
    pub max_param_count: usize,
}

impl ChunkTask {
    /// Score the chunk's modules with a freshly built oracle
    pub fn run(self, factory: &dyn OracleFactory) -> Result<BTreeMap<String, ModuleResult>> {
        let oracle = factory.build(&self.context)?;
        debug!(
            "Scoring {} modules for {} on a worker",
            self.modules.len(),
            self.metric
        );
        score_modules(
            self.metric,
            self.modules.iter().map(|(path, module)| (path.as_str(), module)),
            oracle.as_ref(),
            self.max_param_count,
        )
    }
}

/// How each metric rolls construct scores up to modules and the project
pub fn rollup(metric: MetricKind) -> Rollup {
    match metric {
        MetricKind::Apxi => Rollup::CombineSubScores(param_complexity::combine),
        _ => Rollup::MeanOfScores,
    }
}

/// Score modules for one of the type-comparing metrics
pub fn score_modules<'a, I>(
    metric: MetricKind,
    modules: I,
    oracle: &dyn TypeOracle,
    max_param_count: usize,
) -> Result<BTreeMap<String, ModuleResult>>
where
    I: IntoIterator<Item = (&'a str, &'a Module)>,
{
    let mut tally = Tally::new(rollup(metric));
    for (path, module) in modules {
        tally.touch_module(path);
        for construct in module.constructs(path) {
            let scores = match metric {
                MetricKind::Amnoi => overload_diversity::score_construct(&construct, oracle)?,
                MetricKind::Apxi => {
                    param_complexity::score_construct(&construct, oracle, max_param_count)?
                }
                other => {
                    return Err(MetricsError::config(format!(
                        "{} does not compare types",
                        other
                    )))
                }
            };
            if !scores.is_empty() {
                tally.record(&construct.id, scores);
            }
        }
    }
    Ok(tally.finish())
}

/// Build a report from merged per-module results
pub fn module_report(
    project_name: &str,
    metric: MetricKind,
    modules: BTreeMap<String, ModuleResult>,
) -> MetricReport {
    let (score, sub_scores) = project_score(&rollup(metric), &modules);
    let mut report = MetricReport::new(project_name, metric, score);
    report.sub_scores = sub_scores;
    report.modules = modules;
    report
}

/// Compute one metric synchronously on the calling thread. Type-comparing
/// metrics treat the whole project as a single chunk.
pub fn compute_local(
    project: &Project,
    metric: MetricKind,
    config: &MetricsConfig,
    factory: &dyn OracleFactory,
) -> Result<MetricReport> {
    let report = match metric {
        MetricKind::Amnoi | MetricKind::Apxi => {
            let oracle = factory.build(&project.context)?;
            let modules = score_modules(
                metric,
                project.modules.iter().map(|(path, module)| (path.as_str(), module)),
                oracle.as_ref(),
                config.max_param_count,
            )?;
            module_report(&project.name, metric, modules)
        }
        MetricKind::Adi => documentation::compute(project, config.word_target),
        MetricKind::Amnci => name_confusion::compute(project),
        MetricKind::Amgi => keyword_grouping::compute(project),
        MetricKind::Aplci => param_order::compute(project),
    };
    Ok(report)
}
