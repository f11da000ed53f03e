//! Configuration for metric computation and project selection

use crate::error::{MetricsError, Result};
use crate::model::Project;
use crate::oracle::ContextHandle;
use crate::types::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Tuning of the metrics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "MetricsConfigFile")]
pub struct MetricsConfig {
    /// Parameter count from which the length complexity starts to decay
    pub max_param_count: usize,
    /// Number of pool workers running chunk tasks in parallel
    pub workers: usize,
    /// Capacity of the pool submission queue
    pub max_queue: usize,
    /// Documentation word count that earns a full documentation score
    pub word_target: usize,
}

/// `[metrics]` table as written in a configuration file. Omitted settings
/// resolve the way [`MetricsConfigBuilder`] resolves them.
#[derive(Debug, Deserialize)]
struct MetricsConfigFile {
    max_param_count: Option<usize>,
    workers: Option<usize>,
    max_queue: Option<usize>,
    word_target: Option<usize>,
}

impl From<MetricsConfigFile> for MetricsConfig {
    fn from(file: MetricsConfigFile) -> Self {
        MetricsConfigBuilder {
            max_param_count: file.max_param_count,
            workers: file.workers,
            max_queue: file.max_queue,
            word_target: file.word_target,
        }
        .build()
    }
}

/// One project to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Overrides the name stored in the declaration model
    #[serde(default)]
    pub name: Option<String>,
    /// JSON declaration model produced by the source parser
    pub model: PathBuf,
    /// Overrides the oracle context handle stored in the model
    #[serde(default)]
    pub context: Option<String>,
    /// Metrics not to compute for this project
    #[serde(default)]
    pub skip_metrics: HashSet<MetricKind>,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            max_param_count: 4,
            workers,
            max_queue: workers * 4,
            word_target: 50,
        }
    }
}

impl MetricsConfig {
    /// Create a new builder for MetricsConfig
    pub fn builder() -> MetricsConfigBuilder {
        MetricsConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(MetricsError::config("workers must be at least 1"));
        }
        if self.max_queue == 0 {
            return Err(MetricsError::config("max_queue must be at least 1"));
        }
        if self.word_target == 0 {
            return Err(MetricsError::config("word_target must be at least 1"));
        }
        Ok(())
    }
}

/// Builder for MetricsConfig
#[derive(Default)]
pub struct MetricsConfigBuilder {
    max_param_count: Option<usize>,
    workers: Option<usize>,
    max_queue: Option<usize>,
    word_target: Option<usize>,
}

impl MetricsConfigBuilder {
    pub fn max_param_count(mut self, count: usize) -> Self {
        self.max_param_count = Some(count);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn max_queue(mut self, capacity: usize) -> Self {
        self.max_queue = Some(capacity);
        self
    }

    pub fn word_target(mut self, words: usize) -> Self {
        self.word_target = Some(words);
        self
    }

    pub fn build(self) -> MetricsConfig {
        let defaults = MetricsConfig::default();
        let workers = self.workers.unwrap_or(defaults.workers);
        MetricsConfig {
            max_param_count: self.max_param_count.unwrap_or(defaults.max_param_count),
            workers,
            max_queue: self.max_queue.unwrap_or(workers * 4),
            word_target: self.word_target.unwrap_or(defaults.word_target),
        }
    }
}

impl ProjectConfig {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            model: model.into(),
            context: None,
            skip_metrics: HashSet::new(),
        }
    }

    pub fn skip(mut self, metric: MetricKind) -> Self {
        self.skip_metrics.insert(metric);
        self
    }

    /// Metrics to run, in canonical order
    pub fn selected_metrics(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|m| !self.skip_metrics.contains(m))
            .collect()
    }

    /// Load and validate the declaration model, applying the overrides
    pub fn load_project(&self) -> Result<Project> {
        let mut project = Project::from_json_file(&self.model)?;
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(context) = &self.context {
            project.context = ContextHandle::new(context.clone());
        }
        project.validate()?;
        Ok(project)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.model.is_relative() {
            self.model = base.join(&self.model);
        }
        let resolved = match &self.context {
            Some(context) if !context.is_empty() && Path::new(context).is_relative() => {
                Some(base.join(context).display().to_string())
            }
            _ => None,
        };
        if resolved.is_some() {
            self.context = resolved;
        }
    }
}

impl AnalysisConfig {
    /// Load from a `.toml` or `.json` file. Relative paths inside are resolved
    /// against the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AnalysisConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(MetricsError::config(format!(
                    "unsupported configuration format: {}",
                    path.display()
                )))
            }
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for project in &mut config.projects {
            project.resolve_paths(base);
        }
        config.metrics.validate()?;
        Ok(config)
    }
}
