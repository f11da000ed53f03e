//! Core data types for metric reporting

use crate::error::MetricsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named sub-scores of a result (e.g. length and sequence complexity)
pub type SubScores = BTreeMap<String, f64>;

/// The six usability metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricKind {
    /// Overload return-type diversity
    #[serde(alias = "amnoi")]
    Amnoi,
    /// Parameter count and sequence complexity
    #[serde(alias = "apxi")]
    Apxi,
    /// Documentation coverage
    #[serde(alias = "adi")]
    Adi,
    /// Name canonical collision
    #[serde(alias = "amnci")]
    Amnci,
    /// Keyword grouping consistency
    #[serde(alias = "amgi")]
    Amgi,
    /// Parameter naming order consistency
    #[serde(alias = "aplci")]
    Aplci,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Amnoi,
        MetricKind::Apxi,
        MetricKind::Adi,
        MetricKind::Amnci,
        MetricKind::Amgi,
        MetricKind::Aplci,
    ];

    /// Metrics whose computation queries the type oracle and therefore runs on the worker pool
    pub fn needs_oracle(self) -> bool {
        matches!(self, MetricKind::Amnoi | MetricKind::Apxi)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Amnoi => "Overload return-type diversity",
            Self::Apxi => "Parameter list complexity",
            Self::Adi => "Documentation coverage",
            Self::Amnci => "Method name confusion",
            Self::Amgi => "Method name grouping",
            Self::Aplci => "Parameter list consistency",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amnoi => write!(f, "AMNOI"),
            Self::Apxi => write!(f, "APXI"),
            Self::Adi => write!(f, "ADI"),
            Self::Amnci => write!(f, "AMNCI"),
            Self::Amgi => write!(f, "AMGI"),
            Self::Aplci => write!(f, "APLCI"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown metric: {}", s))
    }
}

/// Kind of a top-level scored construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructKind {
    Function,
    Class,
}

/// Score of one signature, overload set or method inside a construct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceScore {
    pub name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_scores: SubScores,
}

/// Score of an exported function or class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructResult {
    pub name: String,
    pub kind: ConstructKind,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_scores: SubScores,
    pub sources: Vec<SourceScore>,
}

/// Score of one module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleResult {
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_scores: SubScores,
    pub constructs: BTreeMap<String, ConstructResult>,
}

/// Extra payload of the project-level metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricDetails {
    NameConfusion {
        /// Name to its canonical form, for every counted name
        canonical_names: BTreeMap<String, String>,
        confusing_names: Vec<String>,
    },
    KeywordGrouping {
        keywords: BTreeMap<String, KeywordRun>,
    },
    ParameterOrder {
        eligible_pairs: usize,
        consistent_pairs: usize,
        inconsistent_pairs: Vec<(String, String)>,
    },
}

/// Spread of one retained keyword across modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRun {
    pub modules: usize,
    pub occurrences: usize,
    pub score: f64,
}

/// One metric computed for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    pub project_name: String,
    pub metric: MetricKind,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_scores: SubScores,
    /// Per-module breakdown; empty for project-level metrics
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, ModuleResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MetricDetails>,
    pub generated_at: DateTime<Utc>,
}

impl MetricReport {
    pub fn new(project_name: impl Into<String>, metric: MetricKind, score: f64) -> Self {
        Self {
            project_name: project_name.into(),
            metric,
            score,
            sub_scores: SubScores::new(),
            modules: BTreeMap::new(),
            details: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: MetricDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// What the orchestrator emits for each metric of a project
#[derive(Debug, Clone)]
pub struct MetricOutcome {
    pub project_name: String,
    pub metric: MetricKind,
    pub result: std::result::Result<MetricReport, Arc<MetricsError>>,
}

/// A metric that failed for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricFailure {
    pub metric: MetricKind,
    pub message: String,
}

/// All outcomes of one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
    pub reports: Vec<MetricReport>,
    pub failures: Vec<MetricFailure>,
}

impl ProjectAnalysis {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            timestamp: Utc::now(),
            reports: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Add an outcome, keeping reports and failures ordered by metric
    pub fn record(&mut self, outcome: MetricOutcome) {
        match outcome.result {
            Ok(report) => {
                self.reports.push(report);
                self.reports.sort_by_key(|r| r.metric);
            }
            Err(e) => {
                self.failures.push(MetricFailure {
                    metric: outcome.metric,
                    message: e.to_string(),
                });
                self.failures.sort_by_key(|f| f.metric);
            }
        }
    }

    pub fn report(&self, metric: MetricKind) -> Option<&MetricReport> {
        self.reports.iter().find(|r| r.metric == metric)
    }

    pub fn score(&self, metric: MetricKind) -> Option<f64> {
        self.report(metric).map(|r| r.score)
    }
}
