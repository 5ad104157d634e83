//! Per-site cookie persistence.
//!
//! A login flow asks the cache to restore a previous session before
//! touching any login form. A restored session is only trusted after a
//! live probe: navigate to a URL that requires authentication and check
//! the browser was not redirected away from it. On every successful
//! interactive login the full jar is saved back, replacing whatever was
//! stored before.
//!
//! One JSON file per site, named from the site identifier. There is no
//! expiry and no locking; concurrent runs against the same site are not
//! supported.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::driver::Driver;
use crate::error::Result;
use dashprobe_protocol::{Cookie, CookieParam};

pub struct SessionCache {
    site: String,
    dir: PathBuf,
}

impl SessionCache {
    /// Cache for `site`, stored in the system temp directory.
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            dir: std::env::temp_dir(),
        }
    }

    /// Cache for `site` under an explicit directory.
    pub fn with_dir(site: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            site: site.into(),
            dir: dir.into(),
        }
    }

    /// Path of the cookie file for this site.
    pub fn cookie_file(&self) -> PathBuf {
        self.dir.join(format!("{}_cookies.json", self.site))
    }

    fn load(&self) -> Result<Option<Vec<Cookie>>> {
        let buf = match fs::read(self.cookie_file()) {
            Ok(buf) => buf,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let cookies = serde_json::from_slice(&buf)?;
        Ok(Some(cookies))
    }

    /// Restores the saved session, if any, and verifies it is still
    /// authenticated.
    ///
    /// Returns `true` only when saved cookies exist, were applied, and
    /// navigating to `verification_url` ended up at exactly that URL
    /// (no redirect to a login page). Every failure along the way is
    /// logged and degrades to `false`; the caller falls back to an
    /// interactive login. Applying the cookies mutates the live jar
    /// whether or not verification passes.
    pub async fn restore(&self, driver: &dyn Driver, verification_url: &str) -> bool {
        let cookies = match self.load() {
            Ok(Some(cookies)) => cookies,
            Ok(None) => return false,
            Err(err) => {
                warn!(target = "dashprobe", site = %self.site, error = %err, "failed to load cached session");
                return false;
            }
        };

        info!(target = "dashprobe", site = %self.site, cookies = cookies.len(), "restoring cached session");

        let params = cookies.iter().map(CookieParam::from).collect();
        let landed = match self.apply_and_probe(driver, params, verification_url).await {
            Ok(url) => url,
            Err(err) => {
                warn!(target = "dashprobe", site = %self.site, error = %err, "cached session probe failed");
                return false;
            }
        };

        landed == verification_url
    }

    async fn apply_and_probe(
        &self,
        driver: &dyn Driver,
        params: Vec<CookieParam>,
        verification_url: &str,
    ) -> Result<String> {
        driver.set_cookies(params).await?;
        driver.navigate(verification_url).await?;
        driver.current_url().await
    }

    /// Serializes the live cookie jar and overwrites the stored session.
    ///
    /// Unlike [`restore`](Self::restore), failures here are hard: a
    /// login whose cookies cannot be persisted is not complete for
    /// future reuse, even though the live session keeps working.
    pub async fn save(&self, driver: &dyn Driver) -> Result<()> {
        let cookies = driver.cookies().await?;

        info!(target = "dashprobe", site = %self.site, cookies = cookies.len(), "saving session");

        let buf = serde_json::to_vec(&cookies)?;
        fs::write(self.cookie_file(), buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAction, MockDriver};

    #[tokio::test]
    async fn restore_without_cache_skips_browser() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::with_dir("nosite", dir.path());
        let driver = MockDriver::new();

        assert!(!cache.restore(&driver, "https://x/dashboard").await);
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn restore_applies_cookies_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::with_dir("site", dir.path());

        let cookies = vec![dashprobe_protocol::Cookie::new("sid", "abc", ".x")];
        fs::write(
            cache.cookie_file(),
            serde_json::to_vec(&cookies).unwrap(),
        )
        .unwrap();

        let driver = MockDriver::new();
        assert!(cache.restore(&driver, "https://x/dashboard").await);

        let actions = driver.actions();
        assert_eq!(
            actions,
            vec![
                MockAction::SetCookies { count: 1 },
                MockAction::Navigate {
                    url: "https://x/dashboard".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn restore_rejects_redirected_probe() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::with_dir("site", dir.path());

        let cookies = vec![dashprobe_protocol::Cookie::new("sid", "stale", ".x")];
        fs::write(
            cache.cookie_file(),
            serde_json::to_vec(&cookies).unwrap(),
        )
        .unwrap();

        let driver = MockDriver::new();
        driver.set_redirect("https://x/dashboard", "https://x/login");

        assert!(!cache.restore(&driver, "https://x/dashboard").await);
        // The jar was still mutated by the attempt.
        assert!(driver
            .actions()
            .contains(&MockAction::SetCookies { count: 1 }));
    }

    #[tokio::test]
    async fn corrupted_cache_degrades_to_false() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::with_dir("site", dir.path());
        fs::write(cache.cookie_file(), b"{not json").unwrap();

        let driver = MockDriver::new();
        assert!(!cache.restore(&driver, "https://x/dashboard").await);
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn save_writes_the_live_jar() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::with_dir("site", dir.path());

        let driver = MockDriver::new();
        driver.set_jar(vec![
            dashprobe_protocol::Cookie::new("a", "1", ".x"),
            dashprobe_protocol::Cookie::new("b", "2", ".x"),
        ]);

        cache.save(&driver).await.unwrap();

        let stored: Vec<dashprobe_protocol::Cookie> =
            serde_json::from_slice(&fs::read(cache.cookie_file()).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "a");
        assert_eq!(stored[1].name, "b");
    }

    #[tokio::test]
    async fn save_to_unwritable_dir_fails_without_touching_session() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let cache = SessionCache::with_dir("site", missing);

        let driver = MockDriver::new();
        driver.set_jar(vec![dashprobe_protocol::Cookie::new("a", "1", ".x")]);

        assert!(cache.save(&driver).await.is_err());
        // Reading the jar is the only browser interaction.
        assert_eq!(driver.actions(), vec![MockAction::ReadCookies]);
    }
}
