//! Survey pipeline: walk the plan's targets and aggregate the report.
//!
//! Strictly sequential by design. One rendering context is opened for the
//! whole run, each target is probed to completion before the next begins,
//! and the context is closed before the report is assembled. Per-target
//! failures never abort the walk; they become error observations.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SurveyPlan;
use crate::gaps;
use crate::probe::Prober;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::recommend;
use crate::renderer::Renderer;
use crate::report::{Observation, Report};

/// Mutable state threaded through a run: the plan, the run identity, and
/// the observations recorded so far.
pub struct SurveyContext<'a> {
    plan: &'a SurveyPlan,
    run_id: String,
    pages: BTreeMap<String, Observation>,
}

impl<'a> SurveyContext<'a> {
    pub fn new(plan: &'a SurveyPlan) -> Self {
        Self {
            plan,
            run_id: Uuid::new_v4().to_string(),
            pages: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record the observation for one target label.
    pub fn record(&mut self, label: &str, observation: Observation) {
        if self.pages.insert(label.to_string(), observation).is_some() {
            warn!(label, "duplicate target label replaced an earlier observation");
        }
    }

    /// Close out the run: derive gaps and recommendations, assemble the report.
    pub fn finish(self) -> Report {
        let baseline = self.plan.baseline_label().to_string();
        let design_gaps = gaps::find_design_gaps(&baseline, &self.pages);
        let recommendations =
            recommend::build_recommendations(&self.pages, &design_gaps, &baseline);

        Report {
            run_id: self.run_id,
            generated_at: Utc::now(),
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            base_url: self.plan.base_url.clone(),
            baseline,
            pages: self.pages,
            design_gaps,
            recommendations,
        }
    }
}

/// Run the survey pipeline against an already-validated plan.
///
/// Opens one rendering context, probes every target in plan order, closes
/// the context, and aggregates the report. The caller owns the renderer and
/// its shutdown.
pub async fn run_survey(
    plan: &SurveyPlan,
    renderer: &dyn Renderer,
    progress_tx: Option<ProgressSender>,
) -> Result<Report> {
    let started = Instant::now();
    let mut cx = SurveyContext::new(plan);
    let mut seq = 0u64;
    let run_id = cx.run_id().to_string();

    info!(run_id = %run_id, base_url = %plan.base_url, targets = plan.targets.len(), "survey starting");
    progress::emit(
        &progress_tx,
        &run_id,
        &mut seq,
        ProgressEventKind::SurveyStarted {
            base_url: plan.base_url.clone(),
            targets: plan.targets.len() as u64,
        },
    );

    let prober = Prober::new(plan);
    let mut page = renderer
        .new_context()
        .await
        .context("failed to open a rendering context")?;

    for target in &plan.targets {
        let url_hint = plan
            .resolve_target_url(target)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| target.path.clone());
        progress::emit(
            &progress_tx,
            &run_id,
            &mut seq,
            ProgressEventKind::TargetStarted {
                label: target.label.clone(),
                url: url_hint,
            },
        );

        let target_started = Instant::now();
        let observation = prober.probe(page.as_mut(), target).await;

        for w in &observation.warnings {
            progress::emit(
                &progress_tx,
                &run_id,
                &mut seq,
                ProgressEventKind::Warning {
                    message: format!("{}: {w}", target.label),
                },
            );
        }
        progress::emit(
            &progress_tx,
            &run_id,
            &mut seq,
            ProgressEventKind::TargetCompleted {
                label: target.label.clone(),
                status: observation.status,
                is_error: observation.is_error,
                elapsed_ms: target_started.elapsed().as_millis() as u64,
            },
        );
        cx.record(&target.label, observation);
    }

    // Release the context before aggregation, whatever the targets did.
    if let Err(e) = page.close().await {
        warn!(error = %e, "failed to close rendering context");
    }

    let report = cx.finish();
    progress::emit(
        &progress_tx,
        &run_id,
        &mut seq,
        ProgressEventKind::SurveyCompleted {
            pages: report.page_count() as u64,
            failures: report.failure_count() as u64,
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
    );
    info!(
        run_id = %run_id,
        pages = report.page_count(),
        failures = report.failure_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "survey complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_feature_checks;
    use crate::probe::script::DesignTokens;

    fn observation_with_tokens(vars: &[(&str, &str)]) -> Observation {
        let mut obs = Observation::failed(
            "https://app.example.com/x",
            &default_feature_checks(),
            "unused".into(),
        );
        obs.is_error = false;
        obs.error = None;
        let mut tokens = DesignTokens::default();
        for (name, value) in vars {
            tokens
                .css_variables
                .insert(name.to_string(), value.to_string());
        }
        obs.design_tokens = Some(tokens);
        obs
    }

    #[test]
    fn context_aggregates_gaps_and_recommendations() {
        let plan = SurveyPlan::for_base_url("https://app.example.com");
        let mut cx = SurveyContext::new(&plan);
        let run_id = cx.run_id().to_string();

        cx.record(
            "home",
            observation_with_tokens(&[("--primary", "#1976d2"), ("--radius", "8px")]),
        );
        cx.record("admin", observation_with_tokens(&[("--primary", "#0d47a1")]));
        cx.record(
            "missing",
            Observation::failed(
                "https://app.example.com/missing",
                &default_feature_checks(),
                "HTTP 404".into(),
            ),
        );

        let report = cx.finish();
        assert_eq!(report.run_id, run_id);
        assert_eq!(report.baseline, "home");
        assert_eq!(report.page_count(), 3);
        assert_eq!(report.failure_count(), 1);

        assert_eq!(report.design_gaps.len(), 1);
        assert_eq!(report.design_gaps[0].page, "admin");
        assert_eq!(report.design_gaps[0].drift_count(), 2);

        assert!(report.recommendations.critical[0].contains("missing"));
        assert!(report
            .recommendations
            .high_priority
            .iter()
            .any(|r| r.contains("baseline")));
        assert!(report.generator.starts_with("surfacer "));
    }

    #[test]
    fn run_ids_are_unique_per_context() {
        let plan = SurveyPlan::for_base_url("https://app.example.com");
        let a = SurveyContext::new(&plan);
        let b = SurveyContext::new(&plan);
        assert_ne!(a.run_id(), b.run_id());
    }
}
