//! CLI handler for `surfacer run` — execute a survey and write the report.

use crate::cli::output::{self, Styled};
use crate::config::SurveyPlan;
use crate::progress::{self, ProgressEventKind, ProgressReceiver};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::report::markdown;
use crate::survey;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Run the survey command.
pub async fn run(
    plan_path: Option<&Path>,
    base_url: Option<&str>,
    out_dir: Option<&Path>,
    headed: bool,
) -> Result<()> {
    init_tracing();
    let s = Styled::new();

    let plan = SurveyPlan::assemble(plan_path, base_url, out_dir, headed)?;

    // Artifact directories must exist before the browser writes screenshots.
    if let Some(parent) = plan.output.report_json.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::create_dir_all(&plan.output.screenshot_dir).with_context(|| {
        format!(
            "failed to create screenshot directory {}",
            plan.output.screenshot_dir.display()
        )
    })?;

    if !output::is_quiet() && !output::is_json() {
        eprintln!(
            "  Surveying {} ({} targets)...",
            plan.base_url,
            plan.targets.len()
        );
    }

    let renderer = ChromiumRenderer::new(&plan.launch_options())
        .await
        .context("failed to launch the browser")?;
    info!("browser launched");

    let (tx, rx) = progress::channel();
    let bar_task = if output::is_quiet() || output::is_json() {
        drop(rx);
        None
    } else {
        Some(spawn_progress_bar(plan.targets.len() as u64, rx))
    };

    let survey_result = survey::run_survey(&plan, &renderer, Some(tx)).await;

    // The browser goes down whether the survey succeeded or not.
    if let Err(e) = renderer.shutdown().await {
        warn!(error = %e, "browser shutdown failed");
    }
    if let Some(task) = bar_task {
        let _ = task.await;
    }

    let report = survey_result?;

    let json = report.to_json_pretty()?;
    std::fs::write(&plan.output.report_json, json)
        .with_context(|| format!("failed to write {}", plan.output.report_json.display()))?;
    let md = markdown::render_markdown(&report);
    std::fs::write(&plan.output.report_markdown, md)
        .with_context(|| format!("failed to write {}", plan.output.report_markdown.display()))?;

    if !output::is_quiet() && !output::is_json() {
        let failures = report.failure_count();
        if failures == 0 {
            eprintln!(
                "  {} Surveyed {} pages, {} screenshots.",
                s.ok_sym(),
                report.page_count(),
                report.screenshot_count()
            );
        } else {
            eprintln!(
                "  {} Surveyed {} pages, {} failed: {}",
                s.warn_sym(),
                report.page_count(),
                failures,
                report.failed_labels().join(", ")
            );
        }
        if !report.design_gaps.is_empty() {
            eprintln!(
                "  {} {} page(s) drift from the \"{}\" baseline.",
                s.warn_sym(),
                report.design_gaps.len(),
                report.baseline
            );
        }
        eprintln!("  Report:  {}", plan.output.report_json.display());
        eprintln!("  Summary: {}", plan.output.report_markdown.display());
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "run_id": report.run_id,
            "base_url": report.base_url,
            "pages": report.page_count(),
            "failures": report.failure_count(),
            "screenshots": report.screenshot_count(),
            "design_gaps": report.design_gaps.len(),
            "report_json": plan.output.report_json.display().to_string(),
            "report_markdown": plan.output.report_markdown.display().to_string(),
        }));
    }

    Ok(())
}

/// Initialize tracing to stderr so log lines never mix into report output.
fn init_tracing() {
    let directive = if output::is_verbose() {
        "surfacer=debug"
    } else {
        "surfacer=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Drive a terminal progress bar from survey events.
///
/// The task ends when the run completes or the sender side is dropped.
fn spawn_progress_bar(total: u64, mut rx: ProgressReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("█▓▒░"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        loop {
            match rx.recv().await {
                Ok(ev) => match ev.event {
                    ProgressEventKind::TargetStarted { label, .. } => {
                        bar.set_message(label);
                    }
                    ProgressEventKind::TargetCompleted {
                        label, is_error, ..
                    } => {
                        if is_error {
                            bar.println(format!("  ! {label} failed"));
                        }
                        bar.inc(1);
                    }
                    ProgressEventKind::Warning { message } => {
                        bar.println(format!("  ! {message}"));
                    }
                    ProgressEventKind::SurveyCompleted { .. } => break,
                    ProgressEventKind::SurveyStarted { .. } => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        bar.finish_and_clear();
    })
}
