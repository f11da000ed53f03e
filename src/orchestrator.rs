//! Per-project orchestration of the metrics run
//!
//! All selected metrics of a project start together. Type-comparing metrics
//! are partitioned into chunks and sent to the shared worker pool; the others
//! run in-process. Each metric's outcome is a memoized shared future, so the
//! run happens once and every later observer gets the recorded outcomes.

use crate::config::{MetricsConfig, ProjectConfig};
use crate::error::{MetricsError, Result};
use crate::metrics::{self, ChunkTask};
use crate::model::Project;
use crate::oracle::{LexicalOracleFactory, OracleFactory};
use crate::pool::{TaskHandle, WorkerPool};
use crate::scheduler::partition;
use crate::types::{MetricKind, MetricOutcome, MetricReport, ProjectAnalysis};
use futures::future::{try_join_all, BoxFuture, Shared};
use futures::stream::{self, BoxStream, FuturesUnordered};
use futures::{FutureExt, StreamExt};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

type SharedOutcome = Shared<BoxFuture<'static, MetricOutcome>>;

/// Drives the metrics of one project
pub struct Orchestrator {
    project: Arc<Project>,
    metrics: Vec<MetricKind>,
    config: Arc<MetricsConfig>,
    pool: WorkerPool,
    factory: Arc<dyn OracleFactory>,
    run: Mutex<Option<Vec<SharedOutcome>>>,
}

impl Orchestrator {
    /// Validate the project and configuration. Nothing runs until the
    /// results are first requested.
    pub fn new(
        project: Project,
        metrics: Vec<MetricKind>,
        config: MetricsConfig,
        pool: WorkerPool,
        factory: Arc<dyn OracleFactory>,
    ) -> Result<Self> {
        project.validate()?;
        config.validate()?;

        let mut metrics = metrics;
        metrics.sort();
        metrics.dedup();

        Ok(Self {
            project: Arc::new(project),
            metrics,
            config: Arc::new(config),
            pool,
            factory,
            run: Mutex::new(None),
        })
    }

    /// Load the project's model and select its metrics from the configuration
    pub fn from_project_config(
        project_config: &ProjectConfig,
        config: MetricsConfig,
        pool: WorkerPool,
        factory: Arc<dyn OracleFactory>,
    ) -> Result<Self> {
        let project = project_config.load_project()?;
        Self::new(
            project,
            project_config.selected_metrics(),
            config,
            pool,
            factory,
        )
    }

    pub fn project_name(&self) -> &str {
        &self.project.name
    }

    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    /// Stream of one outcome per selected metric, in completion order.
    ///
    /// The first call starts the run; later calls replay it without
    /// recomputing. Must be called from within a tokio runtime.
    pub fn results(&self) -> BoxStream<'static, MetricOutcome> {
        self.outcomes()
            .into_iter()
            .collect::<FuturesUnordered<_>>()
            .boxed()
    }

    /// Wait for every metric and gather the outcomes
    pub async fn collect(&self) -> ProjectAnalysis {
        let mut analysis = ProjectAnalysis::new(self.project_name());
        let mut results = self.results();
        while let Some(outcome) = results.next().await {
            analysis.record(outcome);
        }
        analysis
    }

    /// Forget the memoized run; the next request recomputes every metric
    pub fn invalidate(&self) {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        if run.take().is_some() {
            debug!("Invalidated results of project '{}'", self.project.name);
        }
    }

    fn outcomes(&self) -> Vec<SharedOutcome> {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        run.get_or_insert_with(|| self.start()).clone()
    }

    fn start(&self) -> Vec<SharedOutcome> {
        info!(
            "Starting analysis of project '{}': {} modules, {} metrics",
            self.project.name,
            self.project.modules.len(),
            self.metrics.len()
        );

        self.metrics
            .iter()
            .map(|&metric| {
                let project = Arc::clone(&self.project);
                let config = Arc::clone(&self.config);
                let pool = self.pool.clone();
                let factory = Arc::clone(&self.factory);
                let project_name = project.name.clone();

                let task = tokio::spawn(async move {
                    compute_metric(project, metric, config, pool, factory).await
                });

                async move {
                    let result = match task.await {
                        Ok(result) => result,
                        Err(e) => Err(MetricsError::rejected(format!(
                            "{} task aborted: {}",
                            metric, e
                        ))),
                    };
                    match &result {
                        Ok(report) => info!(
                            "{} for '{}': {:.3}",
                            metric, project_name, report.score
                        ),
                        Err(e) => warn!("{} failed for '{}': {}", metric, project_name, e),
                    }
                    MetricOutcome {
                        project_name,
                        metric,
                        result: result.map_err(Arc::new),
                    }
                }
                .boxed()
                .shared()
            })
            .collect()
    }
}

async fn compute_metric(
    project: Arc<Project>,
    metric: MetricKind,
    config: Arc<MetricsConfig>,
    pool: WorkerPool,
    factory: Arc<dyn OracleFactory>,
) -> Result<MetricReport> {
    if metric.needs_oracle() {
        compute_chunked(&project, metric, &config, &pool, factory).await
    } else {
        metrics::compute_local(&project, metric, &config, factory.as_ref())
    }
}

/// Fan a type-comparing metric out over the pool and merge the chunk results.
/// The first failing chunk fails the metric.
async fn compute_chunked(
    project: &Project,
    metric: MetricKind,
    config: &MetricsConfig,
    pool: &WorkerPool,
    factory: Arc<dyn OracleFactory>,
) -> Result<MetricReport> {
    let chunks = partition(project, pool.workers());
    debug!(
        "{} for '{}': {} chunks over {} workers",
        metric,
        project.name,
        chunks.len(),
        pool.workers()
    );

    let mut submitter = pool.submitter();
    let mut handles: Vec<TaskHandle<_>> = Vec::with_capacity(chunks.len());
    for modules in chunks {
        let task = ChunkTask {
            metric,
            context: project.context.clone(),
            modules,
            max_param_count: config.max_param_count,
        };
        let factory = Arc::clone(&factory);
        handles.push(submitter.submit(move || task.run(factory.as_ref())).await?);
    }

    let parts = try_join_all(handles.into_iter().map(TaskHandle::join)).await?;
    let modules: BTreeMap<_, _> = parts.into_iter().flatten().collect();
    Ok(metrics::module_report(&project.name, metric, modules))
}

/// Merge the result streams of several projects into one
pub fn analyze_projects(orchestrators: &[Orchestrator]) -> BoxStream<'static, MetricOutcome> {
    stream::select_all(orchestrators.iter().map(Orchestrator::results)).boxed()
}

/// Run several projects together and gather one analysis per orchestrator, in
/// the same order. Outcomes are routed by position, so projects sharing a name
/// stay apart.
pub async fn collect_projects(orchestrators: &[Orchestrator]) -> Vec<ProjectAnalysis> {
    let mut analyses: Vec<ProjectAnalysis> = orchestrators
        .iter()
        .map(|o| ProjectAnalysis::new(o.project_name()))
        .collect();

    let mut outcomes = stream::select_all(
        orchestrators
            .iter()
            .enumerate()
            .map(|(i, o)| o.results().map(move |outcome| (i, outcome))),
    );
    while let Some((i, outcome)) = outcomes.next().await {
        if let Some(analysis) = analyses.get_mut(i) {
            analysis.record(outcome);
        }
    }
    analyses
}

/// Run the given metrics on one project with a private pool and the lexical oracle
pub async fn analyze_project(
    project: Project,
    metrics: Vec<MetricKind>,
    config: MetricsConfig,
) -> Result<ProjectAnalysis> {
    let pool = WorkerPool::from_config(&config);
    let orchestrator = Orchestrator::new(
        project,
        metrics,
        config,
        pool,
        Arc::new(LexicalOracleFactory),
    )?;
    Ok(orchestrator.collect().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::project;

    fn sample() -> Project {
        project(
            r#"{ "name": "sample", "modules": {
                "a.ts": { "getUser": [{ "kind": "function",
                    "docs": ["Fetches a user."],
                    "parameters": [{ "name": "id", "type": "string" }, { "name": "org", "type": "string" }]
                }] },
                "b.ts": { "get_user": [{ "kind": "function", "overloads": [
                    { "return_type": "User" }, { "return_type": "User" }
                ] }] }
            } }"#,
        )
    }

    #[tokio::test]
    async fn test_all_metrics_emit_once() {
        let analysis = analyze_project(
            sample(),
            MetricKind::ALL.to_vec(),
            MetricsConfig::builder().workers(2).build(),
        )
        .await
        .unwrap();
        assert_eq!(analysis.reports.len(), 6);
        assert!(analysis.failures.is_empty());
        assert_eq!(analysis.score(MetricKind::Amnci), Some(0.0));
        // b.ts has the only overloaded function; a.ts is an empty 0 entry
        assert_eq!(analysis.score(MetricKind::Amnoi), Some(0.5));
    }

    #[tokio::test]
    async fn test_duplicate_metrics_are_collapsed() {
        let orchestrator = Orchestrator::new(
            sample(),
            vec![MetricKind::Adi, MetricKind::Adi, MetricKind::Amgi],
            MetricsConfig::builder().workers(1).build(),
            WorkerPool::new(1, 1),
            Arc::new(LexicalOracleFactory),
        )
        .unwrap();
        assert_eq!(orchestrator.metrics(), &[MetricKind::Adi, MetricKind::Amgi]);
        let outcomes: Vec<_> = orchestrator.results().collect().await;
        assert_eq!(outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_up_front() {
        let config = MetricsConfig {
            word_target: 0,
            ..MetricsConfig::default()
        };
        let result = Orchestrator::new(
            sample(),
            vec![MetricKind::Adi],
            config,
            WorkerPool::new(1, 1),
            Arc::new(LexicalOracleFactory),
        );
        assert!(matches!(result, Err(MetricsError::ConfigError(_))));
    }
}
