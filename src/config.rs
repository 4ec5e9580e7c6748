//! Survey plan: which pages to visit and how.
//!
//! A [`SurveyPlan`] is the single configuration object for a run. It can be
//! loaded from a JSON plan file, assembled from CLI flags, or both (flags
//! override the file). Every field has a default so a minimal plan is just
//! `{"base_url": "https://app.example.com"}`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::renderer::LaunchOptions;

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Default feature checks, embedded at compile time so there is no runtime
/// file I/O. Plan files can replace the whole set via `feature_checks`.
const DEFAULT_CHECKS_JSON: &str = include_str!("default_checks.json");

/// Desktop Chrome user agent applied unless the plan overrides it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_targets() -> Vec<Target> {
    vec![
        Target::new("home", "/"),
        Target::new("login", "/login"),
        Target::new("dashboard", "/dashboard"),
        Target::new("admin", "/admin"),
    ]
}

fn default_viewport() -> ViewportSize {
    ViewportSize {
        width: 1920,
        height: 1080,
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_navigation_timeout_ms() -> u64 {
    15_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_max_nav_items() -> usize {
    20
}

fn default_headless() -> bool {
    true
}

fn default_full_page_screenshots() -> bool {
    true
}

/// Parse the embedded default check set.
pub fn default_feature_checks() -> Vec<FeatureCheck> {
    serde_json::from_str(DEFAULT_CHECKS_JSON).unwrap_or_default()
}

// ── Plan types ───────────────────────────────────────────────────────────────

/// One page to survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Stable label used as the report key and screenshot file name.
    pub label: String,
    /// Path relative to `base_url`, or an absolute `http(s)` URL.
    pub path: String,
}

impl Target {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// A named group of CSS selectors counted on every page.
///
/// Selectors are tried in order; the first one that matches anything supplies
/// the count. A check with no matching selector records a count of zero, so
/// absence shows up in the report rather than disappearing from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCheck {
    pub name: String,
    pub selectors: Vec<String>,
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

/// Where report artifacts are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    /// JSON report path.
    pub report_json: PathBuf,
    /// Markdown summary path.
    pub report_markdown: PathBuf,
    /// Directory for per-page PNG screenshots.
    pub screenshot_dir: PathBuf,
}

impl OutputPaths {
    /// All three artifact paths rooted under one directory.
    pub fn under(dir: &Path) -> Self {
        Self {
            report_json: dir.join("report.json"),
            report_markdown: dir.join("report.md"),
            screenshot_dir: dir.join("screenshots"),
        }
    }
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::under(Path::new("surfacer-out"))
    }
}

/// Full configuration for a survey run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyPlan {
    /// Root URL of the application under survey.
    pub base_url: String,

    /// Pages to visit, in order. Labels must be unique.
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,

    /// Label of the target whose design tokens anchor gap detection.
    /// Defaults to the first target.
    #[serde(default)]
    pub baseline: Option<String>,

    /// Named selector groups counted on every page.
    #[serde(default = "default_feature_checks")]
    pub feature_checks: Vec<FeatureCheck>,

    #[serde(default = "default_viewport")]
    pub viewport: ViewportSize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-target navigation timeout in milliseconds.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Wait after the load event before snapshotting, for client-side
    /// rendering to settle.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Cap on extracted navigation items per page.
    #[serde(default = "default_max_nav_items")]
    pub max_nav_items: usize,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_full_page_screenshots")]
    pub full_page_screenshots: bool,

    /// Explicit browser binary. Discovered when absent.
    #[serde(default)]
    pub browser_executable: Option<PathBuf>,

    #[serde(default)]
    pub output: OutputPaths,
}

impl Default for SurveyPlan {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            targets: default_targets(),
            baseline: None,
            feature_checks: default_feature_checks(),
            viewport: default_viewport(),
            user_agent: default_user_agent(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            settle_ms: default_settle_ms(),
            max_nav_items: default_max_nav_items(),
            headless: default_headless(),
            full_page_screenshots: default_full_page_screenshots(),
            browser_executable: None,
            output: OutputPaths::default(),
        }
    }
}

impl SurveyPlan {
    /// Default plan for one base URL.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Load a plan from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file {}", path.display()))?;
        let plan: SurveyPlan = serde_json::from_str(&raw)
            .with_context(|| format!("invalid plan file {}", path.display()))?;
        Ok(plan)
    }

    /// Build the effective plan from an optional plan file and CLI overrides,
    /// then validate it.
    pub fn assemble(
        plan_path: Option<&Path>,
        base_url: Option<&str>,
        out_dir: Option<&Path>,
        headed: bool,
    ) -> Result<Self> {
        let mut plan = match plan_path {
            Some(p) => Self::load(p)?,
            None => {
                let base = base_url
                    .ok_or_else(|| anyhow::anyhow!("either --plan or --base-url is required"))?;
                Self::for_base_url(base)
            }
        };

        if let Some(base) = base_url {
            plan.base_url = base.to_string();
        }
        if let Some(dir) = out_dir {
            plan.output = OutputPaths::under(dir);
        }
        if headed {
            plan.headless = false;
        }

        plan.validate()?;
        Ok(plan)
    }

    /// Check the plan for problems that would otherwise surface mid-run.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            bail!("base_url must be http or https, got {:?}", base.scheme());
        }

        if self.targets.is_empty() {
            bail!("plan has no targets");
        }

        let mut labels = BTreeSet::new();
        let mut files = BTreeSet::new();
        for target in &self.targets {
            if target.label.trim().is_empty() {
                bail!("target {:?} has an empty label", target.path);
            }
            if !labels.insert(target.label.as_str()) {
                bail!("duplicate target label {:?}", target.label);
            }
            // Two labels must not collapse to the same screenshot file.
            if !files.insert(sanitize_label(&target.label)) {
                bail!(
                    "target label {:?} collides with another label once sanitized",
                    target.label
                );
            }
        }

        if let Some(baseline) = &self.baseline {
            if !labels.contains(baseline.as_str()) {
                bail!("baseline {:?} does not match any target label", baseline);
            }
        }

        let mut check_names = BTreeSet::new();
        for check in &self.feature_checks {
            if check.name.trim().is_empty() {
                bail!("feature check with empty name");
            }
            if !check_names.insert(check.name.as_str()) {
                bail!("duplicate feature check {:?}", check.name);
            }
            if check.selectors.is_empty() {
                bail!("feature check {:?} has no selectors", check.name);
            }
            for sel in &check.selectors {
                if scraper::Selector::parse(sel).is_err() {
                    bail!("feature check {:?}: invalid selector {:?}", check.name, sel);
                }
            }
        }

        if self.navigation_timeout_ms == 0 {
            bail!("navigation_timeout_ms must be greater than zero");
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            bail!("viewport dimensions must be greater than zero");
        }
        if self.max_nav_items == 0 {
            bail!("max_nav_items must be greater than zero");
        }

        Ok(())
    }

    /// Resolve a target to an absolute URL against `base_url`.
    pub fn resolve_target_url(&self, target: &Target) -> Result<Url> {
        if target.path.starts_with("http://") || target.path.starts_with("https://") {
            return Url::parse(&target.path)
                .with_context(|| format!("target {:?}: invalid url {:?}", target.label, target.path));
        }
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        base.join(&target.path)
            .with_context(|| format!("target {:?}: cannot join {:?}", target.label, target.path))
    }

    /// Label of the design-token baseline target.
    pub fn baseline_label(&self) -> &str {
        match &self.baseline {
            Some(label) => label,
            None => &self.targets[0].label,
        }
    }

    /// Browser launch options derived from this plan.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            viewport_width: self.viewport.width,
            viewport_height: self.viewport.height,
            executable: self.browser_executable.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Screenshot path for a target label.
    pub fn screenshot_path(&self, label: &str) -> PathBuf {
        self.output
            .screenshot_dir
            .join(format!("{}.png", sanitize_label(label)))
    }
}

/// Reduce a label to a safe file stem: lowercase alphanumerics with single
/// underscores between runs of anything else.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_sep = true;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("page");
    }
    out
}
