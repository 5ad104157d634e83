//! APM dashboard (rpm.newrelic.com).
//!
//! Beyond the shared error-rate metric this module reads the
//! per-transaction performance breakdown: the response-time stat, the
//! response-time histogram, and the percentile chart. The latter two
//! are only rendered as SVG, so their numbers are reconstructed from
//! chart geometry the same way the dashboard draws it.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{
    click_when_present, parse_millis, parse_percent, unsupported, wait_for_text,
    with_failure_capture, Credentials, Dashboard, Metric, LOGIN_DEADLINE, POLL_INTERVAL,
    POST_LOGIN_SETTLE, SCRAPE_DEADLINE,
};
use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use crate::poll::poll_until;
use crate::session::SessionCache;

const SITE: &str = "newrelic";

const LANDING_URL: &str = "https://rpm.newrelic.com/applications";
const LOGIN_URL: &str = "https://login.newrelic.com/login";

const EMAIL_INPUT: &str = "#login_email";
const PASSWORD_INPUT: &str = "#login_password";
const SUBMIT_BUTTON: &str = "#login_submit";

// Account and application every report URL is scoped to.
const ACCOUNT_ID: &str = "459517";
const APPLICATION_ID: &str = "11120465";

const ERROR_RATE_VALUE: &str = "#hosts_content_container > section > h3 > div > p";
const APP_RESPONSE_VALUE: &str = "#tab_content_app_server_performance_breakdown > \
     div.selectable_chart.response_chart > h2 > div:nth-child(1) > p.value";
const HISTOGRAM_TAB: &str = "#tab_content_app_server_performance_breakdown > \
     div.selectable_chart.response_chart > h2 > ul > li > ul > li.app_histogram";
const PERCENTILE_TAB: &str = "#app_transaction_histogram > h2 > ul > li > ul > li.app_percentiles";

const JQUERY_LOADED: &str = "(typeof $ !== 'undefined' && typeof $.post === 'function')";

/// Width of one histogram bucket, in milliseconds, as drawn by the
/// dashboard.
const HISTOGRAM_BUCKET_MS: i64 = 25;

/// Per-transaction performance breakdown, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPerformance {
    /// Average app server response time.
    pub response_ms: i64,
    /// Midpoint of the most populated histogram bucket.
    pub histogram_ms: i64,
    /// Response time at the charted percentile.
    pub percentile_ms: i64,
}

pub struct Newrelic {
    cache: SessionCache,
}

impl Newrelic {
    pub fn new() -> Self {
        Self::with_cache(SessionCache::new(SITE))
    }

    /// Uses an explicit session cache (tests, alternate cache dirs).
    pub fn with_cache(cache: SessionCache) -> Self {
        Self { cache }
    }

    fn application_url() -> String {
        format!("https://rpm.newrelic.com/accounts/{ACCOUNT_ID}/applications/{APPLICATION_ID}")
    }

    fn time_window_url(back: &str) -> String {
        format!(
            "https://rpm.newrelic.com/set_time_window?back={back}&tw%5Bfrom_local%5D=true&\
             tw%5Bdur%5D=last_7_days"
        )
    }

    async fn interactive_login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()> {
        let form = async {
            driver.navigate(LOGIN_URL).await?;
            driver.fill(EMAIL_INPUT, &credentials.email).await?;
            driver.fill(PASSWORD_INPUT, &credentials.password).await?;
            driver.click(SUBMIT_BUTTON).await?;
            tokio::time::sleep(POST_LOGIN_SETTLE).await;
            Ok::<(), ProbeError>(())
        };
        tokio::time::timeout(LOGIN_DEADLINE, form)
            .await
            .map_err(|_| ProbeError::timeout(LOGIN_DEADLINE, "newrelic.com login form"))??;

        self.cache.save(driver).await
    }

    async fn error_rate(&self, driver: &dyn Driver) -> Result<f64> {
        let back = format!(
            "https%3A%2F%2Frpm.newrelic.com%2Faccounts%2F{ACCOUNT_ID}%2Fapplications%2F{APPLICATION_ID}"
        );
        driver.navigate(&Self::time_window_url(&back)).await?;

        let text = wait_for_text(
            driver,
            ERROR_RATE_VALUE,
            |text| !text.is_empty(),
            "error rate to render",
        )
        .await?;
        parse_percent(&text)
    }

    /// Reads the full performance breakdown for `transaction`.
    pub async fn app_performance(
        &self,
        driver: &dyn Driver,
        transaction: &str,
    ) -> Result<AppPerformance> {
        with_failure_capture(driver, async {
            self.select_response_chart(driver, transaction).await?;
            let response_ms = self.app_response(driver).await?;
            let histogram_ms = self.app_histogram(driver, transaction).await?;
            let percentile_ms = self.app_percentile(driver, transaction).await?;
            Ok(AppPerformance {
                response_ms,
                histogram_ms,
                percentile_ms,
            })
        })
        .await
    }

    /// Forces the app-response chart selection (a jQuery POST the page
    /// itself would make), then scopes the time window to the
    /// transaction.
    async fn select_response_chart(&self, driver: &dyn Driver, transaction: &str) -> Result<()> {
        driver.navigate(&Self::application_url()).await?;

        poll_until(
            || async move {
                let loaded = driver.evaluate(JQUERY_LOADED).await?;
                Ok(loaded.as_bool().unwrap_or(false).then_some(()))
            },
            POLL_INTERVAL,
            LOGIN_DEADLINE,
            "jquery to load",
        )
        .await?;

        driver
            .evaluate(&format!(
                "$.post(\"{}/save_selected_charts\", {{selected: \"app_response\"}})",
                Self::application_url()
            ))
            .await?;

        let back = format!(
            "https%3A%2F%2Frpm.newrelic.com%2Faccounts%2F{ACCOUNT_ID}%2Fapplications%2F{APPLICATION_ID}%2Ftransactions%23id%3D{transaction}"
        );
        driver.navigate(&Self::time_window_url(&back)).await
    }

    async fn app_response(&self, driver: &dyn Driver) -> Result<i64> {
        let text = wait_for_text(
            driver,
            APP_RESPONSE_VALUE,
            |text| !text.is_empty(),
            "app response to render",
        )
        .await?;
        parse_millis(&text)
    }

    async fn app_histogram(&self, driver: &dyn Driver, transaction: &str) -> Result<i64> {
        click_when_present(driver, HISTOGRAM_TAB, "histogram tab").await?;

        let expression = histogram_expression(transaction);
        let heights: Vec<f64> = poll_until(
            || {
                let expression = expression.clone();
                async move {
                    let value = driver.evaluate(&expression).await?;
                    let heights: Vec<f64> = serde_json::from_value(value).unwrap_or_default();
                    Ok((!heights.is_empty()).then_some(heights))
                }
            },
            POLL_INTERVAL,
            SCRAPE_DEADLINE,
            "histogram bars to render",
        )
        .await?;

        Ok(histogram_bucket_midpoint(&heights))
    }

    async fn app_percentile(&self, driver: &dyn Driver, transaction: &str) -> Result<i64> {
        click_when_present(driver, PERCENTILE_TAB, "percentile tab").await?;

        let expression = percentile_expression(transaction);
        poll_until(
            || {
                let expression = expression.clone();
                async move {
                    let value = driver.evaluate(&expression).await?;
                    if value.is_null() {
                        return Ok(None);
                    }
                    let chart: PercentileChart = serde_json::from_value(value)?;
                    Ok(percentile_from_chart(&chart).filter(|ms| *ms > 0))
                }
            },
            POLL_INTERVAL,
            SCRAPE_DEADLINE,
            "percentile chart to render",
        )
        .await
    }
}

impl Default for Newrelic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dashboard for Newrelic {
    fn site(&self) -> &str {
        SITE
    }

    async fn login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()> {
        if self.cache.restore(driver, LANDING_URL).await {
            return Ok(());
        }

        info!(target = "dashprobe", "logging in to newrelic.com");
        with_failure_capture(driver, self.interactive_login(driver, credentials)).await
    }

    async fn scrape(&self, driver: &dyn Driver, metric: &Metric) -> Result<f64> {
        match metric {
            Metric::ErrorRate => {
                with_failure_capture(driver, self.error_rate(driver)).await
            }
            other => Err(unsupported(SITE, other)),
        }
    }
}

/// Collects every histogram bar height, in rendered order.
fn histogram_expression(transaction: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll(\
         \"#current_app_transaction_histogram_{transaction} g.highcharts-tracker > g > rect\"\
         )).map(r => Number(r.getAttribute(\"height\")) || 0)"
    )
}

/// Reads the percentile chart's axis labels and line path, or null
/// while the chart has not rendered.
fn percentile_expression(transaction: &str) -> String {
    format!(
        "(function() {{\
           const labels = Array.from(document.querySelectorAll(\
           \"#app_server_percentiles_{transaction} g.highcharts-axis-labels > text[x='0']\"\
           )).map(t => ({{ y: Number(t.getAttribute(\"y\")) || 0, text: t.textContent }}));\
           const path = document.querySelector(\
           \"#app_server_percentiles_{transaction} g.highcharts-tracker > g > path\");\
           if (labels.length === 0 || !path) return null;\
           return {{ labels: labels, d: path.getAttribute(\"d\") || \"\" }};\
         }})()"
    )
}

/// Percentile chart geometry as read from the page.
#[derive(Debug, Deserialize)]
struct PercentileChart {
    labels: Vec<AxisLabel>,
    d: String,
}

#[derive(Debug, Deserialize)]
struct AxisLabel {
    y: f64,
    text: String,
}

/// Midpoint of the most populated bucket. Buckets are drawn
/// right-to-left, so the last rect covers the lowest range.
fn histogram_bucket_midpoint(heights: &[f64]) -> i64 {
    let mut tallest = 0usize;
    let mut tallest_height = 0.0;
    for (i, height) in heights.iter().enumerate() {
        if *height > tallest_height {
            tallest = i;
            tallest_height = *height;
        }
    }
    let low = HISTOGRAM_BUCKET_MS * (heights.len() as i64 - tallest as i64 - 1);
    low + HISTOGRAM_BUCKET_MS / 2
}

/// Axis label value: `"50 ms"` → 50, `"1k ms"` → 1000.
fn axis_value(text: &str) -> Option<i64> {
    text.trim()
        .trim_end_matches(['m', 's', ' '])
        .replacen('k', "000", 1)
        .parse()
        .ok()
}

/// Lowest Y coordinate of the chart line, from the SVG path data.
fn path_min_y(d: &str) -> Option<f64> {
    let d = d.trim();
    let line_segments = &d[d.find(" L ")?..];
    let mut min_y = f64::INFINITY;
    for segment in line_segments.split(" L ").skip(1) {
        let y: f64 = segment.split_whitespace().nth(1)?.parse().ok()?;
        if y < min_y {
            min_y = y;
        }
    }
    min_y.is_finite().then_some(min_y)
}

/// Projects the chart line's peak back onto the value axis.
///
/// The first axis label is the zero baseline and carries no value, so
/// interpolation runs over the remaining labels: value grows linearly
/// as Y shrinks toward the top of the chart.
fn percentile_from_chart(chart: &PercentileChart) -> Option<i64> {
    let axis: Vec<(f64, i64)> = chart
        .labels
        .iter()
        .skip(1)
        .filter_map(|label| axis_value(&label.text).map(|value| (label.y, value)))
        .collect();
    let (first_y, first_value) = *axis.first()?;
    let (last_y, last_value) = *axis.last()?;
    if axis.len() < 2 || first_y == last_y {
        return None;
    }

    let min_y = path_min_y(&chart.d)?;
    let scale = (last_value - first_value) as f64 / (first_y - last_y);
    Some(first_value + (scale * (first_y - min_y)) as i64)
}
