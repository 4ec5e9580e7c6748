//! End-to-end survey pipeline tests with a scripted renderer.
//!
//! A fake renderer serves canned HTML and script results while a wiremock
//! server answers the preflight requests, so the full pipeline runs without
//! a browser: plan → probe every target → aggregate → report.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use surfacer::config::{OutputPaths, SurveyPlan, Target};
use surfacer::probe::script;
use surfacer::renderer::{NavigationResult, RenderContext, Renderer};
use surfacer::survey::run_survey;
use tempfile::TempDir;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

// ── Page Fixtures ──

const HOME_HTML: &str = r#"<html><head><title>Acme Console</title></head><body>
<header><nav class="navbar">
  <a href="/">Home</a><a href="/dashboard">Dashboard</a><a href="/admin">Admin</a>
</nav></header>
<main>
  <div class="MuiCard-root">Revenue</div>
  <div class="MuiCard-root">Signups</div>
  <button>Get started</button>
</main>
<footer>© Acme</footer>
</body></html>"#;

const DASHBOARD_HTML: &str = r#"<html><head><title>Dashboard - Acme</title></head><body>
<nav><a href="/">Home</a><a href="/reports">Reports</a></nav>
<main>
  <table class="MuiTable-root"><tr><th>Name</th></tr><tr><td>Widget</td></tr></table>
  <button disabled>Export</button>
</main>
</body></html>"#;

const LOGIN_HTML: &str = r#"<html><head><title>Sign in - Acme</title></head><body>
<main><form action="/login" method="post">
  <input type="email" name="email" placeholder="Email" required>
  <input type="password" name="password" placeholder="Password" required>
  <button type="submit">Sign in</button>
</form></main>
</body></html>"#;

const MISSING_HTML: &str = r#"<html><head><title>404 Not Found</title></head><body>
<main><h1>Page not found</h1><p>The page you requested does not exist.</p></main>
</body></html>"#;

// ── Scripted Renderer ──

#[derive(Clone, Default)]
struct PageFixture {
    html: &'static str,
    text_length: u64,
    css_variables: Vec<(&'static str, &'static str)>,
    /// Relative URL the "browser" ends up on after navigation.
    redirect_to: Option<&'static str>,
    fail_navigation: bool,
    fail_screenshot: bool,
}

impl PageFixture {
    fn new(html: &'static str, text_length: u64) -> Self {
        Self {
            html,
            text_length,
            ..Self::default()
        }
    }

    fn with_variables(mut self, vars: &[(&'static str, &'static str)]) -> Self {
        self.css_variables = vars.to_vec();
        self
    }
}

struct FakeRenderer {
    fixtures: HashMap<&'static str, PageFixture>,
}

impl FakeRenderer {
    fn new(fixtures: Vec<(&'static str, PageFixture)>) -> Self {
        Self {
            fixtures: fixtures.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(FakePage {
            fixtures: self.fixtures.clone(),
            current: None,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

struct CurrentPage {
    fixture: PageFixture,
    final_url: String,
}

struct FakePage {
    fixtures: HashMap<&'static str, PageFixture>,
    current: Option<CurrentPage>,
}

impl FakePage {
    fn current(&self) -> Result<&CurrentPage> {
        match &self.current {
            Some(c) => Ok(c),
            None => bail!("no page loaded"),
        }
    }
}

#[async_trait]
impl RenderContext for FakePage {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        let parsed = url::Url::parse(url)?;
        let fixture = match self.fixtures.get(parsed.path()) {
            Some(f) => f.clone(),
            None => bail!("no fixture for path {}", parsed.path()),
        };
        if fixture.fail_navigation {
            bail!("net::ERR_CONNECTION_RESET");
        }
        let final_url = match fixture.redirect_to {
            Some(rel) => parsed.join(rel)?.to_string(),
            None => url.to_string(),
        };
        self.current = Some(CurrentPage {
            fixture,
            final_url: final_url.clone(),
        });
        Ok(NavigationResult {
            final_url,
            load_time_ms: 12,
        })
    }

    async fn execute_js(&self, script_src: &str) -> Result<serde_json::Value> {
        let current = self.current()?;
        if script_src == script::PAGE_METRICS_JS {
            return Ok(json!({
                "text_length": current.fixture.text_length,
                "color_scheme": "light",
            }));
        }
        if script_src == script::DESIGN_TOKENS_JS {
            let vars: serde_json::Map<String, serde_json::Value> = current
                .fixture
                .css_variables
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            return Ok(json!({
                "css_variables": vars,
                "element_styles": {
                    "button_0": {
                        "background_color": "rgb(26, 115, 232)",
                        "color": "rgn(255, 255, 255)",
                        "font_family": "Roboto, sans-serif",
                        "font_size": "14px",
                        "font_weight": "500",
                        "border_radius": "4px",
                    }
                },
            }));
        }
        bail!("unexpected script: {script_src}");
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.current()?.fixture.html.to_string())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.current()?.final_url.clone())
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> Result<()> {
        if self.current()?.fixture.fail_screenshot {
            bail!("capture failed");
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\nfake")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

// ── Helpers ──

fn plan_for(base_url: &str, out: &Path, targets: Vec<Target>) -> SurveyPlan {
    let mut plan = SurveyPlan::for_base_url(base_url);
    plan.targets = targets;
    plan.settle_ms = 0;
    plan.navigation_timeout_ms = 2_000;
    plan.output = OutputPaths::under(out);
    plan.validate().unwrap();
    std::fs::create_dir_all(&plan.output.screenshot_dir).unwrap();
    plan
}

async fn mock_status(server: &MockServer, path: &str, status: u16) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path(path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

// ── Pipeline Tests ──

/// Test: every target yields exactly one observation, HTTP errors included.
#[tokio::test]
async fn test_survey_observes_every_target() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/dashboard", 200).await;
    mock_status(&server, "/does-not-exist", 404).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![
            Target::new("home", "/"),
            Target::new("dashboard", "/dashboard"),
            Target::new("missing", "/does-not-exist"),
        ],
    );
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/dashboard", PageFixture::new(DASHBOARD_HTML, 2_400)),
        ("/does-not-exist", PageFixture::new(MISSING_HTML, 40)),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    assert_eq!(report.page_count(), 3);
    let labels: Vec<&str> = report.pages.keys().map(String::as_str).collect();
    assert_eq!(labels, vec!["dashboard", "home", "missing"]);

    let home = &report.pages["home"];
    assert_eq!(home.status, Some(200));
    assert!(!home.is_error);
    assert!(home.has_content);
    assert_eq!(home.title.as_deref(), Some("Acme Console"));
    assert!(home.has_navigation);
    assert!(home.has_cards);
    assert!(!home.nav_items.is_empty());

    let dashboard = &report.pages["dashboard"];
    assert!(dashboard.has_tables);
    assert!(dashboard
        .action_buttons
        .iter()
        .any(|b| b.text == "Export" && b.disabled));

    let missing = &report.pages["missing"];
    assert_eq!(missing.status, Some(404));
    assert!(missing.is_error);
    assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
    assert!(!missing.has_content, "error pages never count as content");
    // The error view itself still gets observed and screenshotted.
    assert_eq!(missing.title.as_deref(), Some("404 Not Found"));
    assert!(missing.screenshot.is_some());

    assert_eq!(report.failure_count(), 1);
    assert!(!report.run_id.is_empty());
}

/// Test: a navigation failure produces an error observation, not a panic
/// and not a missing entry.
#[tokio::test]
async fn test_navigation_failure_yields_error_observation() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/broken", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![Target::new("home", "/"), Target::new("broken", "/broken")],
    );
    let broken_fixture = PageFixture {
        fail_navigation: true,
        ..PageFixture::new(HOME_HTML, 900)
    };
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/broken", broken_fixture),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    let broken = &report.pages["broken"];
    assert!(broken.is_error);
    assert!(broken
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("navigation failed"));
    assert_eq!(broken.status, None);
    assert_eq!(broken.load_time_ms, None);
    assert!(broken.screenshot.is_none());
    assert_eq!(report.failed_labels(), vec!["broken"]);
}

/// Test: successful and failed observations serialize with the same keys,
/// down to the per-check feature counts.
#[tokio::test]
async fn test_observation_shape_is_identical_across_outcomes() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/broken", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![Target::new("home", "/"), Target::new("broken", "/broken")],
    );
    let broken_fixture = PageFixture {
        fail_navigation: true,
        ..PageFixture::default()
    };
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/broken", broken_fixture),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    let ok = serde_json::to_value(&report.pages["home"]).unwrap();
    let failed = serde_json::to_value(&report.pages["broken"]).unwrap();

    let ok_keys: Vec<&String> = ok.as_object().unwrap().keys().collect();
    let failed_keys: Vec<&String> = failed.as_object().unwrap().keys().collect();
    assert_eq!(ok_keys, failed_keys);

    let ok_counts: Vec<&String> = ok["feature_counts"].as_object().unwrap().keys().collect();
    let failed_counts: Vec<&String> =
        failed["feature_counts"].as_object().unwrap().keys().collect();
    assert_eq!(ok_counts, failed_counts);
    assert!(failed["feature_counts"]
        .as_object()
        .unwrap()
        .values()
        .all(|v| v == 0));
}

/// Test: screenshots land under the plan's screenshot directory, one per
/// rendered page.
#[tokio::test]
async fn test_screenshots_written_under_plan_directory() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/dashboard", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![
            Target::new("Home Page", "/"),
            Target::new("dashboard", "/dashboard"),
        ],
    );
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/dashboard", PageFixture::new(DASHBOARD_HTML, 2_400)),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    // "Home Page" sanitizes to home_page.png
    let home_shot = out.path().join("screenshots/home_page.png");
    let dash_shot = out.path().join("screenshots/dashboard.png");
    assert!(home_shot.exists());
    assert!(dash_shot.exists());
    assert_eq!(report.screenshot_count(), 2);
    assert_eq!(
        report.pages["Home Page"].screenshot.as_deref(),
        Some(home_shot.to_str().unwrap())
    );
}

/// Test: a screenshot failure degrades to a warning on the observation.
#[tokio::test]
async fn test_screenshot_failure_degrades_to_warning() {
    let server = MockServer::start().await;
    mock_status(&server, "/flaky", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![Target::new("flaky", "/flaky")],
    );
    let flaky_fixture = PageFixture {
        fail_screenshot: true,
        ..PageFixture::new(HOME_HTML, 5_000)
    };
    let renderer = FakeRenderer::new(vec![("/flaky", flaky_fixture)]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    let flaky = &report.pages["flaky"];
    assert!(!flaky.is_error, "screenshot trouble is not a page failure");
    assert!(flaky.screenshot.is_none());
    assert!(flaky
        .warnings
        .iter()
        .any(|w| w.contains("screenshot failed")));
    assert_eq!(report.screenshot_count(), 0);
}

/// Test: design-token drift is reported against the baseline target.
#[tokio::test]
async fn test_design_gaps_against_baseline() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/dashboard", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![
            Target::new("home", "/"),
            Target::new("dashboard", "/dashboard"),
        ],
    );
    let renderer = FakeRenderer::new(vec![
        (
            "/",
            PageFixture::new(HOME_HTML, 5_000).with_variables(&[
                ("--color-primary", "#1a73e8"),
                ("--radius", "4px"),
            ]),
        ),
        (
            "/dashboard",
            PageFixture::new(DASHBOARD_HTML, 2_400)
                .with_variables(&[("--color-primary", "#222222")]),
        ),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    assert_eq!(report.baseline, "home");
    assert_eq!(report.design_gaps.len(), 1);
    let gap = &report.design_gaps[0];
    assert_eq!(gap.page, "dashboard");
    assert_eq!(gap.missing_variables, vec!["--radius"]);
    let drift = &gap.changed_variables["--color-primary"];
    assert_eq!(drift.baseline, "#1a73e8");
    assert_eq!(drift.observed, "#222222");

    assert!(report
        .recommendations
        .high_priority
        .iter()
        .any(|r| r.contains("baseline")));
}

/// Test: login pages set the auth flags and feed the recommendations.
#[tokio::test]
async fn test_login_detection_and_auth_recommendations() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/login", 200).await;
    mock_status(&server, "/admin", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![
            Target::new("home", "/"),
            Target::new("login", "/login"),
            Target::new("admin", "/admin"),
        ],
    );
    let admin = PageFixture {
        redirect_to: Some("/login?next=%2Fadmin"),
        ..PageFixture::new(LOGIN_HTML, 300)
    };
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/login", PageFixture::new(LOGIN_HTML, 300)),
        ("/admin", admin),
    ]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    let home = &report.pages["home"];
    assert!(!home.is_login_page);
    assert!(home.auth.is_none());

    let login = &report.pages["login"];
    assert!(login.is_login_page);
    assert!(!login.redirected_to_login, "login was the requested page");
    let auth = login.auth.as_ref().unwrap();
    assert!(auth.password_field);
    assert!(!auth.enterprise_sso);
    assert!(!auth.password_recovery);

    let admin = &report.pages["admin"];
    assert!(admin.redirected_to_login);
    assert!(admin.is_login_page);

    // The bare login form drives auth recommendations.
    assert!(report
        .recommendations
        .high_priority
        .iter()
        .any(|r| r.contains("SSO")));
    assert!(report
        .recommendations
        .medium_priority
        .iter()
        .any(|r| r.contains("recovery")));
}

/// Test: two runs over the same targets produce reports with identical
/// key sets, run metadata aside.
#[tokio::test]
async fn test_repeat_runs_share_key_sets() {
    let server = MockServer::start().await;
    mock_status(&server, "/", 200).await;
    mock_status(&server, "/dashboard", 200).await;

    let out = TempDir::new().unwrap();
    let plan = plan_for(
        &server.uri(),
        out.path(),
        vec![
            Target::new("home", "/"),
            Target::new("dashboard", "/dashboard"),
        ],
    );
    let renderer = FakeRenderer::new(vec![
        ("/", PageFixture::new(HOME_HTML, 5_000)),
        ("/dashboard", PageFixture::new(DASHBOARD_HTML, 2_400)),
    ]);

    let first = run_survey(&plan, &renderer, None).await.unwrap();
    let second = run_survey(&plan, &renderer, None).await.unwrap();

    assert_ne!(first.run_id, second.run_id);

    let a = serde_json::to_value(&first).unwrap();
    let b = serde_json::to_value(&second).unwrap();
    let top_a: Vec<&String> = a.as_object().unwrap().keys().collect();
    let top_b: Vec<&String> = b.as_object().unwrap().keys().collect();
    assert_eq!(top_a, top_b);

    for label in ["home", "dashboard"] {
        let keys_a: Vec<&String> = a["pages"][label].as_object().unwrap().keys().collect();
        let keys_b: Vec<&String> = b["pages"][label].as_object().unwrap().keys().collect();
        assert_eq!(keys_a, keys_b);
    }
}

/// Test: an unreachable host fails the target with a preflight error.
#[tokio::test]
async fn test_preflight_connection_refused_fails_target() {
    let out = TempDir::new().unwrap();
    // Port 1 is never listening.
    let plan = plan_for(
        "http://127.0.0.1:1",
        out.path(),
        vec![Target::new("home", "/")],
    );
    let renderer = FakeRenderer::new(vec![]);

    let report = run_survey(&plan, &renderer, None).await.unwrap();

    assert_eq!(report.failure_count(), 1);
    let home = &report.pages["home"];
    assert!(home
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("preflight request failed"));
    assert!(report
        .recommendations
        .critical
        .iter()
        .any(|r| r.contains("home")));
}
