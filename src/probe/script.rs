//! In-page JavaScript payloads and their typed results.
//!
//! Two things cannot be read from an HTML snapshot: the rendered text a user
//! actually sees, and computed styles. Both are collected with small
//! `evaluate` payloads that return plain JSON. The payloads emit snake_case
//! keys so the results deserialize straight into the report types without a
//! rename layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProbeError, ProbeResult};

/// Returns rendered-text metrics for the current page.
pub const PAGE_METRICS_JS: &str = r#"
(() => {
    const body = document.body;
    return {
        text_length: body ? body.innerText.trim().length : 0,
        color_scheme: (getComputedStyle(document.documentElement)
            .getPropertyValue('color-scheme').trim()) || 'auto',
    };
})()
"#;

/// Returns CSS custom properties on `:root` plus a bounded sample of
/// computed styles from key elements.
pub const DESIGN_TOKENS_JS: &str = r#"
(() => {
    const vars = {};
    const rootStyle = getComputedStyle(document.documentElement);
    for (let i = 0; i < rootStyle.length; i++) {
        const prop = rootStyle[i];
        if (prop.startsWith('--')) {
            vars[prop] = rootStyle.getPropertyValue(prop).trim();
        }
    }

    const styles = {};
    const keyElements = document.querySelectorAll(
        'button, .MuiCard-root, .MuiAppBar-root, h1, h2, h3');
    let index = 0;
    for (const el of keyElements) {
        if (index >= 24) break;
        const cs = getComputedStyle(el);
        styles[el.tagName.toLowerCase() + '_' + index] = {
            background_color: cs.backgroundColor,
            color: cs.color,
            font_family: cs.fontFamily,
            font_size: cs.fontSize,
            font_weight: cs.fontWeight,
            border_radius: cs.borderRadius,
        };
        index += 1;
    }

    return { css_variables: vars, element_styles: styles };
})()
"#;

/// Rendered-text metrics from [`PAGE_METRICS_JS`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetrics {
    /// Length of `document.body.innerText` after trimming.
    #[serde(default)]
    pub text_length: u64,
    /// Resolved `color-scheme` of the root element.
    #[serde(default)]
    pub color_scheme: String,
}

/// Computed style sample for one key element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub font_size: String,
    #[serde(default)]
    pub font_weight: String,
    #[serde(default)]
    pub border_radius: String,
}

/// Design tokens from [`DESIGN_TOKENS_JS`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignTokens {
    /// CSS custom properties (`--name` to value) on the root element.
    #[serde(default)]
    pub css_variables: BTreeMap<String, String>,
    /// Computed styles for a bounded sample of key elements, keyed by
    /// `tag_index`.
    #[serde(default)]
    pub element_styles: BTreeMap<String, ElementStyle>,
}

pub fn parse_page_metrics(value: Value) -> ProbeResult<PageMetrics> {
    serde_json::from_value(value)
        .map_err(|e| ProbeError::Evaluation(format!("unexpected page metrics shape: {e}")))
}

pub fn parse_design_tokens(value: Value) -> ProbeResult<DesignTokens> {
    serde_json::from_value(value)
        .map_err(|e| ProbeError::Evaluation(format!("unexpected design tokens shape: {e}")))
}
