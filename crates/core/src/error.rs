use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {url}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("javascript evaluation failed: {0}")]
    JsEval(String),

    #[error("screenshot failed: {path}")]
    Screenshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout after {ms}ms waiting for: {condition}")]
    Timeout { ms: u64, condition: String },

    #[error("metric not supported by {site}: {metric}")]
    UnsupportedMetric { site: String, metric: String },

    #[error("could not parse metric value from {text:?}")]
    Parse { text: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ProbeError {
    /// Timeout with the condition described and the deadline in millis.
    pub fn timeout(deadline: std::time::Duration, condition: impl Into<String>) -> Self {
        ProbeError::Timeout {
            ms: deadline.as_millis() as u64,
            condition: condition.into(),
        }
    }
}
