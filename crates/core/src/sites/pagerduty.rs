//! On-call scheduler (pagerduty.com).

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::info;

use super::{
    parse_count, unsupported, wait_for_text, with_failure_capture, Credentials, Dashboard, Metric,
    LOGIN_DEADLINE, POST_LOGIN_SETTLE,
};
use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use crate::session::SessionCache;

const SITE: &str = "pagerduty";

const EMAIL_INPUT: &str = "#user_email";
const PASSWORD_INPUT: &str = "#user_password";
const SUBMIT_BUTTON: &str = "#login_form > fieldset > div:nth-child(4) > div > div > input";

const ONCALL_COUNT: &str = "#reports_index_page > div > div > div > div > \
     div.pd-row.x-main-report > div > div:nth-child(3) > div.pd-col.pd-col-2 > div > \
     div.report-comparison-widget > div > div > div.pd-widget-content.pd-widget-padded > \
     div:nth-child(1) > p > span";

pub struct Pagerduty {
    organization: String,
    escalation_policy: String,
    cache: SessionCache,
}

impl Pagerduty {
    pub fn new(organization: impl Into<String>, escalation_policy: impl Into<String>) -> Self {
        Self::with_cache(organization, escalation_policy, SessionCache::new(SITE))
    }

    /// Uses an explicit session cache (tests, alternate cache dirs).
    pub fn with_cache(
        organization: impl Into<String>,
        escalation_policy: impl Into<String>,
        cache: SessionCache,
    ) -> Self {
        Self {
            organization: organization.into(),
            escalation_policy: escalation_policy.into(),
            cache,
        }
    }

    fn incidents_url(&self) -> String {
        format!("https://{}.pagerduty.com/incidents", self.organization)
    }

    fn sign_in_url(&self) -> String {
        format!("https://{}.pagerduty.com/sign_in", self.organization)
    }

    fn report_url(&self, since: &str, until: &str) -> String {
        format!(
            "https://{}.pagerduty.com/reports#team?since={since}T00%3A00%3A00&\
             until={until}T00%3A00%3A00&filters[escalation_policy_ids][]={}&\
             grouped_by[]=service&grouped_by[]=daily&time_zone=Asia%2FTokyo",
            self.organization, self.escalation_policy,
        )
    }

    async fn interactive_login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()> {
        let form = async {
            driver.navigate(&self.sign_in_url()).await?;
            driver.fill(EMAIL_INPUT, &credentials.email).await?;
            driver.fill(PASSWORD_INPUT, &credentials.password).await?;
            driver.click(SUBMIT_BUTTON).await?;
            tokio::time::sleep(POST_LOGIN_SETTLE).await;
            Ok::<(), ProbeError>(())
        };
        tokio::time::timeout(LOGIN_DEADLINE, form)
            .await
            .map_err(|_| ProbeError::timeout(LOGIN_DEADLINE, "pagerduty.com login form"))??;

        self.cache.save(driver).await
    }

    async fn oncall_volume(&self, driver: &dyn Driver) -> Result<f64> {
        let today = chrono::Local::now().date_naive();
        let (since, until) = report_window(today);
        driver.navigate(&self.report_url(&since, &until)).await?;

        let text = wait_for_text(
            driver,
            ONCALL_COUNT,
            |text| !text.is_empty(),
            "incident count to render",
        )
        .await?;
        Ok(parse_count(&text)? as f64)
    }
}

#[async_trait]
impl Dashboard for Pagerduty {
    fn site(&self) -> &str {
        SITE
    }

    async fn login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()> {
        if self.cache.restore(driver, &self.incidents_url()).await {
            return Ok(());
        }

        info!(target = "dashprobe", organization = %self.organization, "logging in to pagerduty.com");
        with_failure_capture(driver, self.interactive_login(driver, credentials)).await
    }

    async fn scrape(&self, driver: &dyn Driver, metric: &Metric) -> Result<f64> {
        match metric {
            Metric::OncallVolume => {
                with_failure_capture(driver, self.oncall_volume(driver)).await
            }
            other => Err(unsupported(SITE, other)),
        }
    }
}

/// The last full Sunday-to-Sunday week before `today`.
///
/// `until` is the most recent Sunday (today, when today is a Sunday);
/// `since` is the Sunday a week before that.
fn report_window(today: NaiveDate) -> (String, String) {
    let days_past_sunday = today.weekday().num_days_from_sunday() as i64;
    let until = today - chrono::Duration::days(days_past_sunday);
    let since = until - chrono::Duration::days(7);
    (
        since.format("%Y-%m-%d").to_string(),
        until.format("%Y-%m-%d").to_string(),
    )
}
