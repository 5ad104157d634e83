// Session cache integration tests
//
// Exercise the save/restore lifecycle against the mock driver the way
// the login flows use it: a fresh process restores what the previous
// one saved, verified by a live probe.

use dashprobe::testing::{MockAction, MockDriver};
use dashprobe::SessionCache;
use dashprobe_protocol::Cookie;

const DASHBOARD_URL: &str = "https://x/dashboard";

#[tokio::test]
async fn missing_cache_returns_false_without_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path());

    let driver = MockDriver::new();
    assert!(!cache.restore(&driver, DASHBOARD_URL).await);
    assert!(driver.actions().is_empty());
}

#[tokio::test]
async fn save_then_restore_round_trips_the_jar() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path());

    let driver = MockDriver::new();
    driver.set_jar(vec![
        Cookie::new("sid", "secret", ".x").http_only(true),
        Cookie::new("csrf", "tok", ".x"),
    ]);
    cache.save(&driver).await.unwrap();

    assert!(cache.restore(&driver, DASHBOARD_URL).await);

    let applied = driver.applied_cookies();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].name, "sid");
    assert_eq!(applied[0].value, "secret");
    assert_eq!(applied[0].domain.as_deref(), Some(".x"));
    assert_eq!(applied[0].http_only, Some(true));
    assert_eq!(applied[1].name, "csrf");
}

#[tokio::test]
async fn restore_accepts_only_the_exact_url() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path());

    let driver = MockDriver::new();
    driver.set_jar(vec![Cookie::new("sid", "old", ".x")]);
    cache.save(&driver).await.unwrap();

    // An expired session redirects to the login page.
    driver.set_redirect(DASHBOARD_URL, "https://x/login?next=%2Fdashboard");
    assert!(!cache.restore(&driver, DASHBOARD_URL).await);
}

#[tokio::test]
async fn corrupted_cache_never_crashes_the_flow() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path());

    std::fs::write(cache.cookie_file(), b"[{\"name\": \"trunc").unwrap();

    let driver = MockDriver::new();
    assert!(!cache.restore(&driver, DASHBOARD_URL).await);
    assert!(driver.actions().is_empty());
}

#[tokio::test]
async fn failed_save_is_distinguishable_and_leaves_session_alone() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path().join("nope"));

    let driver = MockDriver::new();
    driver.set_jar(vec![Cookie::new("sid", "live", ".x")]);

    assert!(cache.save(&driver).await.is_err());
    assert_eq!(driver.actions(), vec![MockAction::ReadCookies]);
}

#[tokio::test]
async fn fresh_process_restores_what_the_last_one_saved() {
    let dir = tempfile::tempdir().unwrap();

    // First run: no cache, interactive login happens, jar is saved.
    {
        let cache = SessionCache::with_dir("site", dir.path());
        let driver = MockDriver::new();

        assert!(!cache.restore(&driver, DASHBOARD_URL).await);

        driver.set_jar(vec![
            Cookie::new("a", "1", ".x"),
            Cookie::new("b", "2", ".x"),
            Cookie::new("c", "3", ".x"),
        ]);
        cache.save(&driver).await.unwrap();
    }

    // Second run: new cache value, new driver; cookies come back and
    // the probe passes.
    {
        let cache = SessionCache::with_dir("site", dir.path());
        let driver = MockDriver::new();

        assert!(cache.restore(&driver, DASHBOARD_URL).await);

        let names: Vec<String> = driver
            .applied_cookies()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(
            driver.actions(),
            vec![
                MockAction::SetCookies { count: 3 },
                MockAction::Navigate {
                    url: DASHBOARD_URL.to_string()
                },
            ]
        );
    }
}

#[tokio::test]
async fn stored_file_is_the_protocol_wire_shape() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::with_dir("site", dir.path());

    let driver = MockDriver::new();
    driver.set_jar(vec![Cookie::new("sid", "abc", ".x").http_only(true)]);
    cache.save(&driver).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(cache.cookie_file()).unwrap()).unwrap();
    let first = &raw.as_array().unwrap()[0];
    assert_eq!(first["name"], "sid");
    assert_eq!(first["value"], "abc");
    assert_eq!(first["domain"], ".x");
    assert_eq!(first["httpOnly"], true);
}
