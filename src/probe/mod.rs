//! Per-target probe: preflight, navigate, settle, snapshot, evaluate,
//! screenshot.
//!
//! A probe never aborts the run. Early-stage failures (unreachable host,
//! navigation timeout) produce an error observation; later stages degrade to
//! warnings on the observation and the probe keeps going. HTTP error
//! statuses do not abort either: single-page apps render their own error
//! views and those are worth observing and screenshotting.

pub mod dom;
pub mod script;

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{SurveyPlan, Target};
use crate::error::{ProbeError, ProbeResult};
use crate::renderer::RenderContext;
use crate::report::Observation;

/// Rendered text below this length counts as an empty page.
const MIN_CONTENT_TEXT_LENGTH: u64 = 100;

/// Result of the preflight HTTP request.
#[derive(Debug, Clone)]
struct Preflight {
    status: u16,
    final_url: String,
}

/// Probes targets against one rendering context.
pub struct Prober<'a> {
    plan: &'a SurveyPlan,
    http: reqwest::Client,
}

impl<'a> Prober<'a> {
    pub fn new(plan: &'a SurveyPlan) -> Self {
        // The browser never reports HTTP statuses over CDP, so statuses come
        // from one plain GET per target. No retries: a flaky page should
        // look flaky in the report.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(plan.navigation_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(plan.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self { plan, http }
    }

    /// Probe one target. Infallible by design: anything that goes wrong is
    /// recorded on the returned observation.
    pub async fn probe(&self, page: &mut dyn RenderContext, target: &Target) -> Observation {
        let url = match self.plan.resolve_target_url(target) {
            Ok(u) => u.to_string(),
            Err(e) => {
                let err = ProbeError::InvalidUrl(e.to_string());
                warn!(label = %target.label, error = %err, "target skipped");
                return Observation::failed(&target.path, &self.plan.feature_checks, err.to_string());
            }
        };

        info!(label = %target.label, url = %url, "probing target");
        match self.try_probe(page, target, &url).await {
            Ok(obs) => obs,
            Err(e) => {
                warn!(label = %target.label, stage = e.stage(), error = %e, "probe failed");
                Observation::failed(&url, &self.plan.feature_checks, e.to_string())
            }
        }
    }

    async fn preflight(&self, url: &str) -> ProbeResult<Preflight> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Preflight(e.to_string()))?;
        Ok(Preflight {
            status: resp.status().as_u16(),
            final_url: resp.url().to_string(),
        })
    }

    async fn try_probe(
        &self,
        page: &mut dyn RenderContext,
        target: &Target,
        url: &str,
    ) -> ProbeResult<Observation> {
        let preflight = self.preflight(url).await?;
        debug!(label = %target.label, status = preflight.status, "preflight done");

        let nav = page
            .navigate(url, self.plan.navigation_timeout_ms)
            .await
            .map_err(|e| ProbeError::Navigation(e.to_string()))?;

        // Let client-side rendering settle before snapshotting.
        if self.plan.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.plan.settle_ms)).await;
        }

        let mut warnings = Vec::new();

        let html = page
            .get_html()
            .await
            .map_err(|e| ProbeError::Snapshot(e.to_string()))?;
        let analysis =
            dom::analyze_snapshot(&html, &self.plan.feature_checks, self.plan.max_nav_items);

        // The live URL beats the navigation result: client-side redirects
        // happen after the load event.
        let final_url = match page.get_url().await {
            Ok(u) if !u.is_empty() => u,
            _ => nav.final_url.clone(),
        };

        let metrics = match page.execute_js(script::PAGE_METRICS_JS).await {
            Ok(value) => match script::parse_page_metrics(value) {
                Ok(m) => m,
                Err(e) => {
                    warnings.push(e.to_string());
                    script::PageMetrics::default()
                }
            },
            Err(e) => {
                warnings.push(ProbeError::Evaluation(e.to_string()).to_string());
                script::PageMetrics::default()
            }
        };

        let design_tokens = match page.execute_js(script::DESIGN_TOKENS_JS).await {
            Ok(value) => match script::parse_design_tokens(value) {
                Ok(t) => Some(t),
                Err(e) => {
                    warnings.push(e.to_string());
                    None
                }
            },
            Err(e) => {
                warnings.push(ProbeError::Evaluation(e.to_string()).to_string());
                None
            }
        };

        let screenshot_path = self.plan.screenshot_path(&target.label);
        let screenshot = match page
            .screenshot(&screenshot_path, self.plan.full_page_screenshots)
            .await
        {
            Ok(()) => Some(screenshot_path.display().to_string()),
            Err(e) => {
                warnings.push(ProbeError::Screenshot(e.to_string()).to_string());
                None
            }
        };

        let http_error = preflight.status >= 400;
        let is_error = http_error || analysis.not_found_text;
        let error = if http_error {
            Some(format!("HTTP {}", preflight.status))
        } else if analysis.not_found_text {
            Some("page rendered a not-found view".to_string())
        } else {
            None
        };

        let requested_is_login = url_mentions_login(url);
        let landed_on_login = url_mentions_login(&final_url);
        let is_login_page =
            analysis.looks_like_login() || (landed_on_login && analysis.has_forms);
        let redirected_to_login = landed_on_login && !requested_is_login;

        // Error pages never count as having content, whatever they render.
        let has_content = !is_error && metrics.text_length > MIN_CONTENT_TEXT_LENGTH;

        debug!(
            label = %target.label,
            nav_items = analysis.nav_items.len(),
            buttons = analysis.action_buttons.len(),
            text_length = metrics.text_length,
            "probe complete"
        );

        Ok(Observation {
            url: url.to_string(),
            final_url: Some(final_url),
            status: Some(preflight.status),
            is_error,
            error,
            warnings,
            load_time_ms: Some(nav.load_time_ms),
            title: analysis.title,
            has_content,
            text_length: metrics.text_length,
            color_scheme: if metrics.color_scheme.is_empty() {
                None
            } else {
                Some(metrics.color_scheme)
            },
            is_login_page,
            redirected_to_login,
            structure: analysis.structure,
            has_forms: analysis.has_forms,
            has_tables: analysis.has_tables,
            has_navigation: analysis.has_navigation,
            has_cards: analysis.has_cards,
            has_loading_indicators: analysis.has_loading_indicators,
            link_count: analysis.link_count,
            feature_counts: analysis.feature_counts,
            nav_items: analysis.nav_items,
            form_fields: analysis.form_fields,
            action_buttons: analysis.action_buttons,
            error_messages: analysis.error_messages,
            auth: if is_login_page { Some(analysis.auth) } else { None },
            design_tokens,
            screenshot,
            probed_at: Utc::now(),
        })
    }
}

/// Whether a URL looks like an authentication page.
fn url_mentions_login(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("login")
        || lower.contains("signin")
        || lower.contains("sign-in")
        || lower.contains("/auth")
}
