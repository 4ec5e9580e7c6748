//! Recommendation tiers for the report.
//!
//! Four priority tiers of free-form recommendation strings. Derived entries
//! come from what the run actually found (failed pages, token drift, missing
//! login affordances); a small static catalog of UI hygiene items fills the
//! lower tiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::gaps::{total_drift, DesignGap};
use crate::report::Observation;

/// Prioritized recommendations, highest urgency first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub critical: Vec<String>,
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub low_priority: Vec<String>,
}

impl RecommendationSet {
    pub fn total(&self) -> usize {
        self.critical.len()
            + self.high_priority.len()
            + self.medium_priority.len()
            + self.low_priority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Tiers paired with display names, for rendering.
    pub fn tiers(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Critical", self.critical.as_slice()),
            ("High priority", self.high_priority.as_slice()),
            ("Medium priority", self.medium_priority.as_slice()),
            ("Low priority", self.low_priority.as_slice()),
        ]
    }
}

/// Build the recommendation set from the run's findings.
pub fn build_recommendations(
    pages: &BTreeMap<String, Observation>,
    gaps: &[DesignGap],
    baseline_label: &str,
) -> RecommendationSet {
    let mut recs = RecommendationSet::default();

    // Failed pages are always the first thing to fix.
    let failed: Vec<&str> = pages
        .iter()
        .filter(|(_, o)| o.is_error)
        .map(|(label, _)| label.as_str())
        .collect();
    if !failed.is_empty() {
        recs.critical.push(format!(
            "Restore the {} page(s) that failed to load: {}",
            failed.len(),
            failed.join(", ")
        ));
    }

    if !gaps.is_empty() {
        recs.high_priority.push(format!(
            "Align {} CSS custom propert{} drifting from the \"{}\" baseline across {} page(s)",
            total_drift(gaps),
            if total_drift(gaps) == 1 { "y" } else { "ies" },
            baseline_label,
            gaps.len()
        ));
    }

    // Login affordances, judged on the first observed login page.
    if let Some(auth) = pages
        .values()
        .find(|o| o.is_login_page)
        .and_then(|o| o.auth.as_ref())
    {
        if !auth.enterprise_sso {
            recs.high_priority
                .push("Add enterprise SSO (SAML or OIDC) to the login page".to_string());
        }
        if !auth.mfa_hint {
            recs.high_priority
                .push("Offer multi-factor authentication at sign-in".to_string());
        }
        if !auth.password_recovery {
            recs.medium_priority
                .push("Add a password recovery link to the login page".to_string());
        }
    }

    // Static catalog.
    recs.medium_priority
        .push("Document shared UI tokens in a design-system reference".to_string());
    recs.medium_priority
        .push("Add empty states for tables and dashboards".to_string());
    recs.low_priority
        .push("Consider dark-mode support via CSS custom properties".to_string());
    recs.low_priority
        .push("Review button labels for consistent casing".to_string());

    recs
}
