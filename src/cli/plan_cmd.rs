//! CLI handler for `surfacer plan` — show the effective plan without running it.

use crate::cli::output;
use crate::config::SurveyPlan;
use anyhow::Result;
use std::path::Path;

/// Resolve a plan (file plus overrides, or defaults for a base URL) and
/// print it. Handy for checking target URLs before a run.
pub async fn run(plan_path: Option<&Path>, base_url: Option<&str>) -> Result<()> {
    let plan = SurveyPlan::assemble(plan_path, base_url, None, false)?;

    if output::is_json() {
        output::print_json(&plan);
        return Ok(());
    }

    println!("  Base URL: {}", plan.base_url);
    println!("  Baseline: {}", plan.baseline_label());
    println!(
        "  Viewport: {}x{}  Timeout: {}ms  Settle: {}ms",
        plan.viewport.width, plan.viewport.height, plan.navigation_timeout_ms, plan.settle_ms
    );
    println!(
        "  Output:   {} / {} / {}/",
        plan.output.report_json.display(),
        plan.output.report_markdown.display(),
        plan.output.screenshot_dir.display()
    );
    println!();

    println!("  Targets:");
    for target in &plan.targets {
        let url = plan
            .resolve_target_url(target)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| target.path.clone());
        println!("    {:<16} {url}", target.label);
    }
    println!();

    let names: Vec<&str> = plan
        .feature_checks
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    println!("  Feature checks ({}): {}", names.len(), names.join(", "));

    Ok(())
}
