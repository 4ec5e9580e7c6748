// Copyright 2026 Surfacer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Report types: one observation per surveyed page, merged into a run report.
//!
//! Observations carry the same field set whether a page loaded or failed, so
//! consumers can diff reports across runs without special-casing failures.
//! `pages` is a `BTreeMap` keyed by target label; iteration order and JSON
//! key order are therefore stable across runs.

pub mod markdown;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FeatureCheck;
use crate::gaps::DesignGap;
use crate::probe::dom::{ActionButton, AuthSignals, FormField, NavItem, PageStructure};
use crate::probe::script::DesignTokens;
use crate::recommend::RecommendationSet;

/// Everything recorded about one surveyed page.
///
/// Every target produces exactly one observation, including targets that
/// failed to load. Failed targets keep the full field set with empty or
/// default values so the JSON shape never varies per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// URL the survey requested.
    pub url: String,
    /// URL the browser ended up on, after client-side redirects.
    pub final_url: Option<String>,
    /// HTTP status from the preflight request.
    pub status: Option<u16>,
    /// The page failed to load or rendered an error view.
    pub is_error: bool,
    /// What went wrong, when `is_error` is set by a probe failure.
    pub error: Option<String>,
    /// Non-fatal degradations (screenshot failed, script rejected).
    pub warnings: Vec<String>,
    /// Milliseconds until the load event.
    pub load_time_ms: Option<u64>,

    pub title: Option<String>,
    /// The page rendered a meaningful amount of text. Forced to `false`
    /// for error pages regardless of what they rendered.
    pub has_content: bool,
    /// Rendered text length from the in-page probe.
    pub text_length: u64,
    /// Resolved `color-scheme` of the root element.
    pub color_scheme: Option<String>,

    /// The page presents a login form.
    pub is_login_page: bool,
    /// A non-login target landed on a login URL.
    pub redirected_to_login: bool,

    pub structure: PageStructure,
    pub has_forms: bool,
    pub has_tables: bool,
    pub has_navigation: bool,
    pub has_cards: bool,
    pub has_loading_indicators: bool,
    pub link_count: usize,

    /// Count per configured feature check; zero when absent, and present
    /// even for failed pages.
    pub feature_counts: BTreeMap<String, usize>,
    pub nav_items: Vec<NavItem>,
    pub form_fields: Vec<FormField>,
    pub action_buttons: Vec<ActionButton>,
    pub error_messages: Vec<String>,

    /// Login affordances; populated only for login pages.
    pub auth: Option<AuthSignals>,
    /// CSS custom properties and style samples; absent when evaluation
    /// failed or the page never rendered.
    pub design_tokens: Option<DesignTokens>,
    /// Screenshot path relative to the invocation directory.
    pub screenshot: Option<String>,

    pub probed_at: DateTime<Utc>,
}

impl Observation {
    /// Observation for a target that never rendered.
    pub fn failed(url: &str, checks: &[FeatureCheck], error: String) -> Self {
        Self {
            url: url.to_string(),
            final_url: None,
            status: None,
            is_error: true,
            error: Some(error),
            warnings: Vec::new(),
            load_time_ms: None,
            title: None,
            has_content: false,
            text_length: 0,
            color_scheme: None,
            is_login_page: false,
            redirected_to_login: false,
            structure: PageStructure::default(),
            has_forms: false,
            has_tables: false,
            has_navigation: false,
            has_cards: false,
            has_loading_indicators: false,
            link_count: 0,
            feature_counts: zero_counts(checks),
            nav_items: Vec::new(),
            form_fields: Vec::new(),
            action_buttons: Vec::new(),
            error_messages: Vec::new(),
            auth: None,
            design_tokens: None,
            screenshot: None,
            probed_at: Utc::now(),
        }
    }
}

/// One zero entry per configured check, so failed pages report the same
/// check names as loaded ones.
pub fn zero_counts(checks: &[FeatureCheck]) -> BTreeMap<String, usize> {
    checks.iter().map(|c| (c.name.clone(), 0)).collect()
}

/// Aggregated result of one survey run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique id for this run.
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Tool name and version that produced the report.
    pub generator: String,
    pub base_url: String,
    /// Label of the design-token baseline page.
    pub baseline: String,
    /// One observation per target, keyed by target label.
    pub pages: BTreeMap<String, Observation>,
    /// Token drift of each page against the baseline, sorted by label.
    pub design_gaps: Vec<DesignGap>,
    pub recommendations: RecommendationSet,
}

impl Report {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse report")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn failure_count(&self) -> usize {
        self.pages.values().filter(|o| o.is_error).count()
    }

    pub fn screenshot_count(&self) -> usize {
        self.pages.values().filter(|o| o.screenshot.is_some()).count()
    }

    /// Labels of pages that failed, in report order.
    pub fn failed_labels(&self) -> Vec<&str> {
        self.pages
            .iter()
            .filter(|(_, o)| o.is_error)
            .map(|(label, _)| label.as_str())
            .collect()
    }
}
