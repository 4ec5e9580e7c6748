//! Markdown rendering of a survey report.
//!
//! Human-readable companion to the JSON report: executive summary, one
//! section per page in label order, design gaps, and recommendations.
//! Status markers follow the CLI convention (`[OK]` / `[!!]`).

use std::fmt::Write;

use crate::probe::dom::PageStructure;
use crate::report::{Observation, Report};

/// Render the whole report as Markdown.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# UI Survey Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Base URL**: {}", report.base_url);
    let _ = writeln!(
        out,
        "- **Generated**: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "- **Run ID**: `{}`", report.run_id);
    let _ = writeln!(out, "- **Generator**: {}", report.generator);
    let _ = writeln!(out);

    render_summary(report, &mut out);
    render_pages(report, &mut out);
    render_gaps(report, &mut out);
    render_recommendations(report, &mut out);

    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "*Generated automatically by {} from a headless browser survey.*",
        report.generator
    );

    out
}

fn render_summary(report: &Report, out: &mut String) {
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Pages surveyed: {}", report.page_count());
    let _ = writeln!(out, "- Failed pages: {}", report.failure_count());
    let _ = writeln!(out, "- Screenshots captured: {}", report.screenshot_count());
    let _ = writeln!(
        out,
        "- Design gaps against `{}` baseline: {}",
        report.baseline,
        report.design_gaps.len()
    );
    let _ = writeln!(
        out,
        "- Recommendations: {}",
        report.recommendations.total()
    );
    let _ = writeln!(out);
}

fn render_pages(report: &Report, out: &mut String) {
    let _ = writeln!(out, "## Pages");
    let _ = writeln!(out);

    for (label, obs) in &report.pages {
        let _ = writeln!(out, "### {label}");
        let _ = writeln!(out);
        let _ = writeln!(out, "- {}", status_line(obs));
        let _ = writeln!(out, "- URL: {}", obs.url);
        if let Some(final_url) = &obs.final_url {
            if final_url != &obs.url {
                let _ = writeln!(out, "- Landed on: {final_url}");
            }
        }
        if let Some(title) = &obs.title {
            let _ = writeln!(out, "- Title: {title}");
        }

        if obs.is_error {
            if let Some(error) = &obs.error {
                let _ = writeln!(out, "- Error: {error}");
            }
        } else {
            let _ = writeln!(
                out,
                "- Content: {} ({} chars rendered)",
                if obs.has_content { "yes" } else { "no" },
                obs.text_length
            );
            let _ = writeln!(out, "- Structure: {}", format_structure(&obs.structure));
            let _ = writeln!(out, "- Features: {}", format_features(obs));
            if !obs.nav_items.is_empty() {
                let _ = writeln!(out, "- Navigation: {}", format_nav(obs));
            }
            if obs.is_login_page {
                let _ = writeln!(out, "- Login page: {}", format_auth(obs));
            }
            if !obs.error_messages.is_empty() {
                let _ = writeln!(
                    out,
                    "- Visible errors: {}",
                    obs.error_messages.join("; ")
                );
            }
        }

        for warning in &obs.warnings {
            let _ = writeln!(out, "- [!!] {warning}");
        }
        if let Some(shot) = &obs.screenshot {
            let _ = writeln!(out, "- Screenshot: `{shot}`");
        }
        let _ = writeln!(out);
    }
}

fn render_gaps(report: &Report, out: &mut String) {
    let _ = writeln!(out, "## Design Gaps");
    let _ = writeln!(out);

    if report.design_gaps.is_empty() {
        let _ = writeln!(
            out,
            "No CSS custom property drift against the `{}` baseline.",
            report.baseline
        );
        let _ = writeln!(out);
        return;
    }

    for gap in &report.design_gaps {
        let _ = writeln!(out, "### {}", gap.page);
        let _ = writeln!(out);
        if !gap.missing_variables.is_empty() {
            let _ = writeln!(out, "Missing variables:");
            for name in &gap.missing_variables {
                let _ = writeln!(out, "- `{name}`");
            }
            let _ = writeln!(out);
        }
        if !gap.changed_variables.is_empty() {
            let _ = writeln!(out, "Changed variables:");
            for (name, drift) in &gap.changed_variables {
                let _ = writeln!(
                    out,
                    "- `{name}`: `{}` on `{}`, `{}` here",
                    drift.baseline, report.baseline, drift.observed
                );
            }
            let _ = writeln!(out);
        }
    }
}

fn render_recommendations(report: &Report, out: &mut String) {
    let _ = writeln!(out, "## Recommendations");
    let _ = writeln!(out);

    if report.recommendations.is_empty() {
        let _ = writeln!(out, "Nothing to recommend.");
        let _ = writeln!(out);
        return;
    }

    for (tier, items) in report.recommendations.tiers() {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {tier}");
        let _ = writeln!(out);
        for item in items {
            let _ = writeln!(out, "- {item}");
        }
        let _ = writeln!(out);
    }
}

fn status_line(obs: &Observation) -> String {
    let marker = if obs.is_error { "[!!]" } else { "[OK]" };
    let status = match obs.status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    };
    match obs.load_time_ms {
        Some(ms) => format!("{marker} {status} in {ms}ms"),
        None => format!("{marker} {status}"),
    }
}

fn format_structure(structure: &PageStructure) -> String {
    let mut parts = Vec::new();
    if structure.header {
        parts.push("header");
    }
    if structure.nav {
        parts.push("nav");
    }
    if structure.main {
        parts.push("main");
    }
    if structure.aside {
        parts.push("aside");
    }
    if structure.footer {
        parts.push("footer");
    }
    if parts.is_empty() {
        "no landmark elements".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_features(obs: &Observation) -> String {
    let present: Vec<String> = obs
        .feature_counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(name, count)| format!("{name} {count}"))
        .collect();
    if present.is_empty() {
        "none detected".to_string()
    } else {
        present.join(", ")
    }
}

fn format_nav(obs: &Observation) -> String {
    const SHOWN: usize = 8;
    let names: Vec<&str> = obs
        .nav_items
        .iter()
        .take(SHOWN)
        .map(|i| i.text.as_str())
        .collect();
    let rest = obs.nav_items.len().saturating_sub(SHOWN);
    let mut line = names.join(", ");
    if rest > 0 {
        line.push_str(&format!(" (+{rest} more)"));
    }
    line
}

fn format_auth(obs: &Observation) -> String {
    let Some(auth) = &obs.auth else {
        return "detected".to_string();
    };
    let mut present = Vec::new();
    let mut absent = Vec::new();

    for (label, flag) in [
        ("password field", auth.password_field),
        ("Google SSO", auth.google_sso),
        ("password recovery", auth.password_recovery),
        ("sign-up link", auth.signup_link),
        ("enterprise SSO", auth.enterprise_sso),
        ("MFA", auth.mfa_hint),
    ] {
        if flag {
            present.push(label);
        } else {
            absent.push(label);
        }
    }

    let mut line = present.join(", ");
    if line.is_empty() {
        line.push_str("no affordances detected");
    }
    if !absent.is_empty() {
        line.push_str(&format!("; missing: {}", absent.join(", ")));
    }
    line
}
