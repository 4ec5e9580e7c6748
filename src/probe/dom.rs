//! Snapshot analysis of rendered page HTML.
//!
//! The probe captures the rendered DOM as an HTML string and this module
//! extracts everything selector-addressable from it: landmark structure,
//! feature counts, navigation items, form fields, action buttons, error
//! messages, and authentication signals. Uses the `scraper` crate, so all
//! entry points are synchronous; callers run them between awaits and never
//! hold `Html` across a suspension point.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::FeatureCheck;

// ── Bounds ───────────────────────────────────────────────────────────────────

/// Longest nav item text kept, in characters.
const MAX_NAV_TEXT: usize = 50;
/// Cap on extracted action buttons.
const MAX_ACTION_BUTTONS: usize = 30;
/// Cap on extracted form fields.
const MAX_FORM_FIELDS: usize = 50;
/// Cap on extracted error messages.
const MAX_ERROR_MESSAGES: usize = 10;
/// Longest error message text kept, in characters.
const MAX_ERROR_TEXT: usize = 200;

// ── Extracted types ──────────────────────────────────────────────────────────

/// Landmark elements present on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStructure {
    pub header: bool,
    pub nav: bool,
    pub main: bool,
    pub aside: bool,
    pub footer: bool,
}

/// A navigation link or menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub text: String,
    /// Raw `href` attribute; `None` for menu buttons.
    pub href: Option<String>,
}

/// A form input, select, or textarea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub field_type: String,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
}

/// A clickable button.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionButton {
    pub text: String,
    pub disabled: bool,
}

/// Authentication affordances detected on the page.
///
/// Only meaningful for login pages; the probe attaches these to the
/// observation when the page looks like one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AuthSignals {
    /// A masked password input is present.
    pub password_field: bool,
    /// Google social sign-in affordance.
    pub google_sso: bool,
    /// Forgot-password or reset link.
    pub password_recovery: bool,
    /// Sign-up or registration link.
    pub signup_link: bool,
    /// Enterprise SSO (SAML / OIDC / single sign-on) mention.
    pub enterprise_sso: bool,
    /// MFA / two-factor mention.
    pub mfa_hint: bool,
}

/// Everything extracted from one rendered-DOM snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotAnalysis {
    pub title: Option<String>,
    pub structure: PageStructure,
    pub has_forms: bool,
    pub has_tables: bool,
    pub has_navigation: bool,
    pub has_cards: bool,
    pub has_loading_indicators: bool,
    /// Title or top headings read like an error page (404, not found).
    pub not_found_text: bool,
    pub link_count: usize,
    /// Count per configured feature check; zero when nothing matched.
    pub feature_counts: BTreeMap<String, usize>,
    pub nav_items: Vec<NavItem>,
    pub form_fields: Vec<FormField>,
    pub action_buttons: Vec<ActionButton>,
    pub error_messages: Vec<String>,
    pub auth: AuthSignals,
}

impl SnapshotAnalysis {
    /// Whether the page carries login affordances.
    pub fn looks_like_login(&self) -> bool {
        self.auth.password_field
    }
}

// ── Main entry point ─────────────────────────────────────────────────────────

/// Analyze a rendered-DOM snapshot.
///
/// Parses the HTML once and runs every extraction pass over the same
/// document. `checks` is tried in order per check; the first selector with
/// any match supplies that check's count.
pub fn analyze_snapshot(
    html: &str,
    checks: &[FeatureCheck],
    max_nav_items: usize,
) -> SnapshotAnalysis {
    let document = Html::parse_document(html);
    let mut out = SnapshotAnalysis::default();

    extract_title(&document, &mut out);
    extract_structure(&document, &mut out);
    extract_flags(&document, &mut out);
    count_features(&document, checks, &mut out);
    extract_nav_items(&document, max_nav_items, &mut out);
    extract_form_fields(&document, &mut out);
    extract_action_buttons(&document, &mut out);
    extract_error_messages(&document, &mut out);
    detect_not_found(&document, &mut out);
    detect_auth_signals(&document, &mut out);

    out
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn count_matches(document: &Html, selector: &str) -> usize {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).count(),
        Err(_) => 0,
    }
}

// ── Title and landmarks ──────────────────────────────────────────────────────

fn extract_title(document: &Html, out: &mut SnapshotAnalysis) {
    let sel = Selector::parse("title").unwrap();
    if let Some(el) = document.select(&sel).next() {
        let text = element_text(&el);
        if !text.is_empty() {
            out.title = Some(text);
        }
    }
}

fn extract_structure(document: &Html, out: &mut SnapshotAnalysis) {
    out.structure = PageStructure {
        header: count_matches(document, "header") > 0,
        nav: count_matches(document, "nav") > 0,
        main: count_matches(document, "main") > 0,
        aside: count_matches(document, "aside") > 0,
        footer: count_matches(document, "footer") > 0,
    };
}

fn extract_flags(document: &Html, out: &mut SnapshotAnalysis) {
    out.has_forms = count_matches(document, "form, input, select, textarea") > 0;
    out.has_tables =
        count_matches(document, r#"table, .MuiTable-root, .MuiDataGrid-root, [role="grid"]"#) > 0;
    out.has_navigation = count_matches(
        document,
        r#"nav, [role="navigation"], .MuiAppBar-root, .MuiDrawer-root"#,
    ) > 0;
    out.has_cards = count_matches(document, ".MuiCard-root, .MuiPaper-root, .card") > 0;
    out.has_loading_indicators = count_matches(
        document,
        r#".MuiCircularProgress-root, .MuiSkeleton-root, [class*="loading"], [class*="spinner"]"#,
    ) > 0;
    out.link_count = count_matches(document, "a[href]");
}

// ── Configured feature checks ────────────────────────────────────────────────

fn count_features(document: &Html, checks: &[FeatureCheck], out: &mut SnapshotAnalysis) {
    for check in checks {
        let mut count = 0;
        for selector in &check.selectors {
            let found = count_matches(document, selector);
            if found > 0 {
                count = found;
                break;
            }
        }
        out.feature_counts.insert(check.name.clone(), count);
    }
}

// ── Navigation items ─────────────────────────────────────────────────────────

const NAV_ITEM_SELECTORS: &[&str] = &[
    "nav a",
    r#"[role="navigation"] a"#,
    "header a",
    ".navbar a",
    ".menu a",
    ".MuiDrawer-root a",
    r#"button[role="menuitem"]"#,
];

fn extract_nav_items(document: &Html, max_items: usize, out: &mut SnapshotAnalysis) {
    let mut seen = Vec::new();
    'outer: for selector in NAV_ITEM_SELECTORS {
        let sel = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for el in document.select(&sel) {
            let text = element_text(&el);
            if text.is_empty() || text.chars().count() >= MAX_NAV_TEXT {
                continue;
            }
            let href = el.value().attr("href").map(|s| s.to_string());
            let item = NavItem { text, href };
            if seen.contains(&item) {
                continue;
            }
            seen.push(item);
            if seen.len() >= max_items {
                break 'outer;
            }
        }
    }
    out.nav_items = seen;
}

// ── Forms and buttons ────────────────────────────────────────────────────────

fn extract_form_fields(document: &Html, out: &mut SnapshotAnalysis) {
    let sel = Selector::parse("input, select, textarea").unwrap();
    for el in document.select(&sel) {
        if out.form_fields.len() >= MAX_FORM_FIELDS {
            break;
        }
        let field_type = el
            .value()
            .attr("type")
            .unwrap_or(el.value().name())
            .to_string();
        if field_type == "hidden" {
            continue;
        }
        out.form_fields.push(FormField {
            field_type,
            name: el.value().attr("name").map(|s| s.to_string()),
            placeholder: el.value().attr("placeholder").map(|s| s.to_string()),
            required: el.value().attr("required").is_some(),
        });
    }
}

fn extract_action_buttons(document: &Html, out: &mut SnapshotAnalysis) {
    let sel = Selector::parse(r#"button, [role="button"], input[type="submit"]"#).unwrap();
    for el in document.select(&sel) {
        if out.action_buttons.len() >= MAX_ACTION_BUTTONS {
            break;
        }
        let text = if el.value().name() == "input" {
            el.value().attr("value").unwrap_or("").trim().to_string()
        } else {
            element_text(&el)
        };
        if text.is_empty() {
            continue;
        }
        out.action_buttons.push(ActionButton {
            text,
            disabled: el.value().attr("disabled").is_some(),
        });
    }
}

// ── Error messages and not-found detection ───────────────────────────────────

fn extract_error_messages(document: &Html, out: &mut SnapshotAnalysis) {
    let sel =
        Selector::parse(r#".error, .error-message, [role="alert"], .MuiAlert-message"#).unwrap();
    for el in document.select(&sel) {
        if out.error_messages.len() >= MAX_ERROR_MESSAGES {
            break;
        }
        let text = element_text(&el);
        if text.is_empty() || text.chars().count() > MAX_ERROR_TEXT {
            continue;
        }
        if out.error_messages.contains(&text) {
            continue;
        }
        out.error_messages.push(text);
    }
}

fn detect_not_found(document: &Html, out: &mut SnapshotAnalysis) {
    let re = match Regex::new(r"(?i)(^|\b)(404|page not found|not found|does not exist)(\b|$)") {
        Ok(re) => re,
        Err(_) => return,
    };

    if let Some(title) = &out.title {
        if re.is_match(title) {
            out.not_found_text = true;
            return;
        }
    }

    let sel = Selector::parse("h1, h2").unwrap();
    for el in document.select(&sel) {
        if re.is_match(&element_text(&el)) {
            out.not_found_text = true;
            return;
        }
    }
}

// ── Authentication signals ───────────────────────────────────────────────────

fn detect_auth_signals(document: &Html, out: &mut SnapshotAnalysis) {
    let mut auth = AuthSignals {
        password_field: count_matches(document, r#"input[type="password"]"#) > 0,
        google_sso: count_matches(document, r#"[class*="google"], [data-provider="google"]"#) > 0,
        password_recovery: count_matches(document, r#"a[href*="forgot"], a[href*="reset"]"#) > 0,
        signup_link: count_matches(document, r#"a[href*="signup"], a[href*="register"]"#) > 0,
        enterprise_sso: false,
        mfa_hint: false,
    };

    // Text-only affordances: scan interactive element text.
    let haystack = interactive_text(document);
    if let Ok(re) = Regex::new(r"(?i)\b(sso|saml|oidc|single sign.?on)\b") {
        auth.enterprise_sso = re.is_match(&haystack);
    }
    if let Ok(re) = Regex::new(r"(?i)\b(mfa|2fa|two.factor|multi.factor)\b") {
        auth.mfa_hint = re.is_match(&haystack);
    }
    if !auth.google_sso {
        if let Ok(re) = Regex::new(r"(?i)\b(sign|log|continue).{0,10}with google\b") {
            auth.google_sso = re.is_match(&haystack);
        }
    }
    if !auth.password_recovery && haystack.to_lowercase().contains("forgot") {
        auth.password_recovery = true;
    }

    out.auth = auth;
}

/// Concatenated text of links, buttons, and labels, for text-based signal
/// matching where no selector can express the affordance.
fn interactive_text(document: &Html) -> String {
    let sel = Selector::parse(r#"a, button, label, [role="button"]"#).unwrap();
    let mut parts = Vec::new();
    for el in document.select(&sel) {
        let text = element_text(&el);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" | ")
}
