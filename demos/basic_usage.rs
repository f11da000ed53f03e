//! Basic example of using the metrics API

use api_usability_audit::{analyze_project, MetricKind, MetricsConfig, Project};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Declaration model produced by a source parser
    let model_path = Path::new("tests/fixtures/sample_project/model.json");
    println!("Analyzing declarations from: {}", model_path.display());

    let project = Project::from_json_file(model_path)?;
    let analysis =
        analyze_project(project, MetricKind::ALL.to_vec(), MetricsConfig::default()).await?;

    println!("\n=== Usability Results ===");
    println!("Project: {}", analysis.project_name);
    println!();

    for report in &analysis.reports {
        println!(
            "  {:<6} {:.3}  {}",
            report.metric,
            report.score,
            report.metric.description()
        );
    }

    // Modules dragging the documentation score down
    if let Some(adi) = analysis.report(MetricKind::Adi) {
        let weak: Vec<_> = adi
            .modules
            .iter()
            .filter(|(_, module)| module.score < 0.5)
            .collect();

        if !weak.is_empty() {
            println!("\nPoorly documented modules:");
            for (path, module) in weak {
                println!("  - {}: {:.3}", path, module.score);
            }
        } else {
            println!("\n✓ Every module is reasonably documented!");
        }
    }

    for failure in &analysis.failures {
        println!("⚠  {} failed: {}", failure.metric, failure.message);
    }

    Ok(())
}
