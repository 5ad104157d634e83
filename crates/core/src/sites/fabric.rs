//! Crash reporting dashboard (fabric.io).

use async_trait::async_trait;
use tracing::info;

use super::{
    parse_percent, unsupported, wait_for_text, with_failure_capture, Credentials, Dashboard,
    Metric, Platform, LOGIN_DEADLINE, POST_LOGIN_SETTLE,
};
use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use crate::session::SessionCache;

const SITE: &str = "fabric";

const HOME_URL: &str = "https://fabric.io/home";
const LOGIN_URL: &str = "https://fabric.io/login";

const EMAIL_INPUT: &str = "#email";
const PASSWORD_INPUT: &str = "#password";
const SUBMIT_BUTTON: &str =
    "#l_sdk-chrome > div.relative.stage > div:nth-child(1) > div > form > button";

// Big stat value in the issues header; renders an ellipsis until the
// dashboard has computed the number client-side.
const CRASH_FREE_VALUE: &str = "#l_dashboard > article > div.flex-1.flex-box > section > div > \
     div > div.header-wrap > div.issues_metrics > div.stat-row.flex-box.top-bar > div > span > \
     div:nth-child(1) > div > div.value > span:nth-child(1)";
const LOADING_PLACEHOLDER: &str = "…";

pub struct Fabric {
    organization: String,
    app: String,
    cache: SessionCache,
}

impl Fabric {
    pub fn new(organization: impl Into<String>, app: impl Into<String>) -> Self {
        Self::with_cache(organization, app, SessionCache::new(SITE))
    }

    /// Uses an explicit session cache (tests, alternate cache dirs).
    pub fn with_cache(
        organization: impl Into<String>,
        app: impl Into<String>,
        cache: SessionCache,
    ) -> Self {
        Self {
            organization: organization.into(),
            app: app.into(),
            cache,
        }
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
            .map_err(|_| ProbeError::timeout(LOGIN_DEADLINE, "fabric.io login form"))??;

        self.cache.save(driver).await
    }

    async fn crash_free_users(&self, driver: &dyn Driver, platform: Platform) -> Result<f64> {
        let url = format!(
            "https://fabric.io/{}/{}/apps/{}/issues?time=last-seven-days&event_type=crash&\
             subFilter=state&state=open&build%5B0%5D=top-builds",
            self.organization,
            platform.path_segment(),
            self.app,
        );
        driver.navigate(&url).await?;

        let text = wait_for_text(
            driver,
            CRASH_FREE_VALUE,
            |text| text != LOADING_PLACEHOLDER,
            "crash-free users to render",
        )
        .await?;
        parse_percent(&text)
    }
}

#[async_trait]
impl Dashboard for Fabric {
    fn site(&self) -> &str {
        SITE
    }

    async fn login(&self, driver: &dyn Driver, credentials: &Credentials) -> Result<()> {
        if self.cache.restore(driver, HOME_URL).await {
            return Ok(());
        }

        info!(target = "dashprobe", "logging in to fabric.io");
        with_failure_capture(driver, self.interactive_login(driver, credentials)).await
    }

    async fn scrape(&self, driver: &dyn Driver, metric: &Metric) -> Result<f64> {
        match metric {
            Metric::CrashFreeUsers { platform } => {
                with_failure_capture(driver, self.crash_free_users(driver, *platform)).await
            }
            other => Err(unsupported(SITE, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAction, MockDriver};

    fn fabric_in(dir: &std::path::Path) -> Fabric {
        Fabric::with_cache("acme", "games", SessionCache::with_dir(SITE, dir))
    }

    #[tokio::test]
    async fn login_skips_form_when_cached_session_holds() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = fabric_in(dir.path());

        let jar = vec![dashprobe_protocol::Cookie::new("sid", "abc", ".fabric.io")];
        std::fs::write(
            dir.path().join("fabric_cookies.json"),
            serde_json::to_vec(&jar).unwrap(),
        )
        .unwrap();

        let driver = MockDriver::new();
        fabric
            .login(&driver, &Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();

        // Cookies applied, probe navigated, and nothing was typed.
        let actions = driver.actions();
        assert!(actions.contains(&MockAction::SetCookies { count: 1 }));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, MockAction::Fill { .. } | MockAction::Click { .. })));
    }

    #[tokio::test]
    async fn login_without_cache_fills_the_form_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = fabric_in(dir.path());

        let driver = MockDriver::new();
        driver.set_jar(vec![dashprobe_protocol::Cookie::new(
            "sid",
            "fresh",
            ".fabric.io",
        )]);

        fabric
            .login(&driver, &Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();

        let actions = driver.actions();
        assert_eq!(
            actions,
            vec![
                MockAction::Navigate {
                    url: LOGIN_URL.to_string()
                },
                MockAction::Fill {
                    selector: EMAIL_INPUT.to_string(),
                    text: "a@b.c".to_string()
                },
                MockAction::Fill {
                    selector: PASSWORD_INPUT.to_string(),
                    text: "pw".to_string()
                },
                MockAction::Click {
                    selector: SUBMIT_BUTTON.to_string()
                },
                MockAction::ReadCookies,
            ]
        );
        assert!(dir.path().join("fabric_cookies.json").exists());
    }

    #[tokio::test]
    async fn login_failure_captures_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = fabric_in(dir.path());

        let driver = MockDriver::new();
        driver.fail_navigation("connection refused");

        let err = fabric
            .login(&driver, &Credentials::new("a@b.c", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Navigation { .. }));
        assert!(driver.actions().contains(&MockAction::Screenshot));

        std::fs::remove_file(crate::capture::FAILURE_SCREENSHOT).ok();
    }

    #[tokio::test]
    async fn crash_free_users_polls_past_the_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = fabric_in(dir.path());

        let driver = MockDriver::new();
        driver.push_text(CRASH_FREE_VALUE, Some("…"));
        driver.push_text(CRASH_FREE_VALUE, Some("99.38%"));

        let value = fabric
            .scrape(
                &driver,
                &Metric::CrashFreeUsers {
                    platform: Platform::Ios,
                },
            )
            .await
            .unwrap();
        assert_eq!(value, 99.38);

        let actions = driver.actions();
        assert_eq!(
            actions[0],
            MockAction::Navigate {
                url: "https://fabric.io/acme/ios/apps/games/issues?time=last-seven-days&\
                      event_type=crash&subFilter=state&state=open&build%5B0%5D=top-builds"
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn foreign_metric_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = fabric_in(dir.path());
        let driver = MockDriver::new();

        let err = fabric
            .scrape(&driver, &Metric::ErrorRate)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedMetric { .. }));
        assert!(driver.actions().is_empty());
    }
}
