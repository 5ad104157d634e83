//! Dashboard integrations.
//!
//! One module per site. Each integration owns its selectors and URLs,
//! shares the [`SessionCache`](crate::session::SessionCache) login
//! choreography (restore, fall back to the form, save), and exposes the
//! common [`Dashboard`] surface so callers can drive any site the same
//! way.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::capture;
use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use crate::poll::poll_until;

pub mod fabric;
pub mod newrelic;
pub mod pagerduty;

pub use fabric::Fabric;
pub use newrelic::{AppPerformance, Newrelic};
pub use pagerduty::Pagerduty;

/// Interval between condition re-evaluations while waiting for
/// client-side rendering.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on an interactive login form flow.
pub(crate) const LOGIN_DEADLINE: Duration = Duration::from_secs(5);

/// Upper bound on a single dynamic-content wait during a scrape.
pub(crate) const SCRAPE_DEADLINE: Duration = Duration::from_secs(10);

/// Settle time after submitting a login form, before the jar is read.
pub(crate) const POST_LOGIN_SETTLE: Duration = Duration::from_secs(1);

/// Login credentials for a dashboard account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Mobile platform a crash metric is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// URL path segment for the platform.
    pub(crate) fn path_segment(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A scrapeable number. Each site implements the variants it serves
/// and rejects the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    /// Percentage of crash-free users over the last seven days.
    CrashFreeUsers { platform: Platform },
    /// Application error rate over the last seven days, in percent.
    ErrorRate,
    /// Incident count for the last full on-call week.
    OncallVolume,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::CrashFreeUsers { platform } => write!(f, "crash-free-users/{platform}"),
            Metric::ErrorRate => f.write_str("error-rate"),
            Metric::OncallVolume => f.write_str("oncall-volume"),
        }
    }
}

/// Common surface of a dashboard integration.
///
/// `login` must be idempotent for an already-authenticated session:
/// a successful cookie restore returns without touching the login
/// form. The session cache is an injected dependency of each
/// implementation, not shared state.
#[async_trait]
pub trait Dashboard: Send + Sync {
    /// Site identifier, also the session cache key.
    fn site(&self) -> &str;

    /// Authenticates the driver's session, preferring a cached session
    /// over the interactive form.
    async fn login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()>;

    /// Reads one metric from the authenticated dashboard.
    async fn scrape(&self, driver: &dyn Driver, metric: &Metric) -> Result<f64>;
}

pub(crate) fn unsupported(site: &str, metric: &Metric) -> ProbeError {
    ProbeError::UnsupportedMetric {
        site: site.to_string(),
        metric: metric.to_string(),
    }
}

/// Runs `op`, capturing the page state to `error.png` before
/// propagating any failure.
pub(crate) async fn with_failure_capture<T>(
    driver: &dyn Driver,
    op: impl Future<Output = Result<T>>,
) -> Result<T> {
    match op.await {
        Ok(value) => Ok(value),
        Err(err) => {
            capture::capture_failure(driver).await;
            Err(err)
        }
    }
}

/// Polls `selector` until its rendered text passes `accept`, then
/// returns the text.
pub(crate) async fn wait_for_text(
    driver: &dyn Driver,
    selector: &str,
    accept: impl Fn(&str) -> bool + Copy,
    what: &str,
) -> Result<String> {
    poll_until(
        || async move {
            Ok(driver
                .text(selector)
                .await?
                .filter(|text| accept(text.trim())))
        },
        POLL_INTERVAL,
        SCRAPE_DEADLINE,
        what,
    )
    .await
}

/// Clicks `selector` as soon as it exists; retries while the element
/// has not rendered yet.
pub(crate) async fn click_when_present(
    driver: &dyn Driver,
    selector: &str,
    what: &str,
) -> Result<()> {
    poll_until(
        || async move {
            match driver.click(selector).await {
                Ok(()) => Ok(Some(())),
                Err(ProbeError::ElementNotFound { .. }) => Ok(None),
                Err(err) => Err(err),
            }
        },
        POLL_INTERVAL,
        SCRAPE_DEADLINE,
        what,
    )
    .await
}

/// Parses a percentage reading like `"99.38%"` or `"0.12 %"`.
pub(crate) fn parse_percent(text: &str) -> Result<f64> {
    text.trim()
        .trim_end_matches(['%', ' '])
        .parse()
        .map_err(|_| ProbeError::Parse {
            text: text.to_string(),
        })
}

/// Parses a millisecond reading like `"245 ms"`.
pub(crate) fn parse_millis(text: &str) -> Result<i64> {
    text.trim()
        .trim_end_matches(['m', 's', ' '])
        .parse()
        .map_err(|_| ProbeError::Parse {
            text: text.to_string(),
        })
}

/// Parses a plain integer reading.
pub(crate) fn parse_count(text: &str) -> Result<i64> {
    text.trim().parse().map_err(|_| ProbeError::Parse {
        text: text.to_string(),
    })
}
