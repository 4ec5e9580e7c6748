//! Error types for per-target probing.
//!
//! A [`ProbeError`] never aborts a survey run: the pipeline converts it into
//! an error observation (or a warning for non-essential stages) and moves on
//! to the next target. Run-level failures (bad plan, browser launch) use
//! `anyhow` at the call sites instead.

/// All errors that can occur while probing a single target page.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    #[error("preflight request failed: {0}")]
    Preflight(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("snapshot capture failed: {0}")]
    Snapshot(String),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

impl ProbeError {
    /// Pipeline stage the error belongs to, for logging and warning labels.
    pub fn stage(&self) -> &'static str {
        match self {
            ProbeError::InvalidUrl(_) => "resolve",
            ProbeError::Preflight(_) => "preflight",
            ProbeError::Navigation(_) => "navigate",
            ProbeError::Snapshot(_) => "snapshot",
            ProbeError::Evaluation(_) => "evaluate",
            ProbeError::Screenshot(_) => "screenshot",
        }
    }

    /// True for stages that leave nothing worth recording about the page.
    ///
    /// Preflight connection failures and navigation failures mean the page
    /// never rendered; later stages degrade to warnings instead.
    pub fn is_fatal_for_target(&self) -> bool {
        matches!(
            self,
            ProbeError::InvalidUrl(_) | ProbeError::Preflight(_) | ProbeError::Navigation(_)
        )
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_stable() {
        assert_eq!(ProbeError::Preflight("x".into()).stage(), "preflight");
        assert_eq!(ProbeError::Screenshot("x".into()).stage(), "screenshot");
    }

    #[test]
    fn only_early_stages_are_fatal() {
        assert!(ProbeError::Navigation("timeout".into()).is_fatal_for_target());
        assert!(!ProbeError::Evaluation("bad script".into()).is_fatal_for_target());
        assert!(!ProbeError::Screenshot("io".into()).is_fatal_for_target());
    }
}
