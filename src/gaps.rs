//! Design gap detection: CSS custom property drift against a baseline page.
//!
//! One page in the plan anchors the comparison. Every other page that
//! produced design tokens is diffed against it: variables the baseline
//! defines but the page lacks are *missing*, variables defined on both with
//! different values are *changed*. Pages without tokens (failed loads,
//! rejected evaluation) are skipped rather than reported as all-missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::Observation;

/// A variable defined on both pages with different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDrift {
    /// Value on the baseline page.
    pub baseline: String,
    /// Value on the drifting page.
    pub observed: String,
}

/// Token drift of one page against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignGap {
    /// Label of the drifting page.
    pub page: String,
    /// Variables the baseline defines and this page lacks, sorted.
    pub missing_variables: Vec<String>,
    /// Variables whose values differ, keyed by variable name.
    pub changed_variables: BTreeMap<String, VariableDrift>,
}

impl DesignGap {
    pub fn drift_count(&self) -> usize {
        self.missing_variables.len() + self.changed_variables.len()
    }
}

/// Diff every page's CSS variables against the baseline page.
///
/// Returns one gap per page with any drift, sorted by page label. Empty when
/// the baseline itself has no tokens to compare against.
pub fn find_design_gaps(
    baseline_label: &str,
    pages: &BTreeMap<String, Observation>,
) -> Vec<DesignGap> {
    let baseline_vars = match pages
        .get(baseline_label)
        .and_then(|o| o.design_tokens.as_ref())
    {
        Some(tokens) => &tokens.css_variables,
        None => return Vec::new(),
    };

    let mut gaps = Vec::new();
    for (label, obs) in pages {
        if label == baseline_label {
            continue;
        }
        let Some(tokens) = &obs.design_tokens else {
            continue;
        };
        let page_vars = &tokens.css_variables;

        let mut missing = Vec::new();
        let mut changed = BTreeMap::new();
        for (name, baseline_value) in baseline_vars {
            match page_vars.get(name) {
                None => missing.push(name.clone()),
                Some(observed) if observed != baseline_value => {
                    changed.insert(
                        name.clone(),
                        VariableDrift {
                            baseline: baseline_value.clone(),
                            observed: observed.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        if !missing.is_empty() || !changed.is_empty() {
            gaps.push(DesignGap {
                page: label.clone(),
                missing_variables: missing,
                changed_variables: changed,
            });
        }
    }
    gaps
}

/// Total number of drifting variables across all gaps.
pub fn total_drift(gaps: &[DesignGap]) -> usize {
    gaps.iter().map(|g| g.drift_count()).sum()
}
