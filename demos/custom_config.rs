//! Example showing custom configuration and a custom type oracle

use api_usability_audit::{
    ContextHandle, LexicalOracle, MetricDetails, MetricKind, MetricsConfig, OracleFactory,
    Orchestrator, ProjectConfig, TypeOracle, WorkerPool,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;

/// Oracle treating the project's branded string types as plain strings
struct BrandedStrings;

impl OracleFactory for BrandedStrings {
    fn build(
        &self,
        _context: &ContextHandle,
    ) -> api_usability_audit::Result<Box<dyn TypeOracle>> {
        let aliases = HashMap::from([
            ("UserId".to_string(), "string".to_string()),
            ("Email".to_string(), "string".to_string()),
        ]);
        Ok(Box::new(LexicalOracle::with_aliases(aliases)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MetricsConfig::builder()
        .max_param_count(3) // Penalize long parameter lists earlier
        .word_target(30)    // Shorter docs are enough for full coverage
        .workers(4)
        .build();

    let project_config = ProjectConfig::new("tests/fixtures/sample_project/model.json")
        .skip(MetricKind::Amgi);

    let pool = WorkerPool::from_config(&config);
    let orchestrator =
        Orchestrator::from_project_config(&project_config, config, pool, Arc::new(BrandedStrings))?;

    println!("Analyzing '{}' with custom configuration...\n", orchestrator.project_name());

    // Outcomes arrive as each metric finishes
    let mut results = orchestrator.results();
    while let Some(outcome) = results.next().await {
        match outcome.result {
            Ok(report) => {
                println!("{:<6} {:.3}", report.metric, report.score);
                if let Some(MetricDetails::NameConfusion { confusing_names, .. }) = &report.details {
                    for name in confusing_names {
                        println!("    ⚠  confusable name: {}", name);
                    }
                }
            }
            Err(e) => println!("{:<6} failed: {}", outcome.metric, e),
        }
    }

    // A second pass replays the recorded outcomes
    let analysis = orchestrator.collect().await;
    println!("\nReplayed {} reports without recomputing", analysis.reports.len());

    Ok(())
}
