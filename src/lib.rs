//! # api_usability_audit
//!
//! Usability metrics for the public surface of a library, computed from its
//! parsed declarations:
//! - **AMNOI**: do the overloads of a function agree on their return type?
//! - **APXI**: are parameter lists short and hard to mix up?
//! - **ADI**: are functions and methods documented?
//! - **AMNCI**: are there names that differ only by case, underscores or digits?
//! - **AMGI**: are names sharing a keyword grouped in the same modules?
//! - **APLCI**: do parameter names keep the same relative order everywhere?
//!
//! Every score lies in `[0, 1]`, higher meaning more usable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use api_usability_audit::{analyze_project, MetricKind, MetricsConfig, Project};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let project = Project::from_json_file(Path::new("model.json"))?;
//! let analysis = analyze_project(project, MetricKind::ALL.to_vec(), MetricsConfig::default()).await?;
//!
//! for report in &analysis.reports {
//!     println!("{}: {:.3}", report.metric, report.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - Type-comparing metrics fan out over a bounded worker pool with backpressure
//! - Pluggable type-equivalence oracle, rebuilt per worker from an opaque handle
//! - Results are memoized per project and replayed to late observers
//! - TOML or JSON configuration with per-project metric selection

mod aggregate;
mod config;
mod error;
pub mod metrics;
mod model;
mod normalize;
mod oracle;
mod orchestrator;
mod pool;
mod scheduler;
mod types;

// Re-export public API
pub use aggregate::{mean, safe_div, Rollup};
pub use config::{AnalysisConfig, MetricsConfig, MetricsConfigBuilder, ProjectConfig};
pub use error::{MetricsError, Result};
pub use model::{
    Callable, ClassDecl, Construct, ConstructId, Declaration, Method, Module, Parameter, Project,
    Signature, TypeParameter, Visibility, WILDCARD_TYPE,
};
pub use normalize::normalize_type;
pub use oracle::{
    compare_pairs, ContextHandle, LexicalOracle, LexicalOracleFactory, OracleFactory, TypeOracle,
};
pub use orchestrator::{analyze_project, analyze_projects, collect_projects, Orchestrator};
pub use pool::{Submitter, TaskHandle, WorkerPool};
pub use scheduler::{chunk_size, partition, Chunk};
pub use types::{
    ConstructKind, ConstructResult, KeywordRun, MetricDetails, MetricFailure, MetricKind,
    MetricOutcome, MetricReport, ModuleResult, ProjectAnalysis, SourceScore, SubScores,
};
