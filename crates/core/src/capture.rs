//! Diagnostic screenshots.
//!
//! When a flow dies, the page state at the moment of failure is worth
//! more than the error string. [`capture_failure`] grabs a full-page
//! PNG to a fixed path; it is strictly best-effort and never turns a
//! failing flow into a different failure.

use std::path::Path;

use tracing::{info, warn};

use crate::driver::Driver;
use crate::error::{ProbeError, Result};

/// Fixed path for the failure artifact.
pub const FAILURE_SCREENSHOT: &str = "error.png";

/// Captures a full-page screenshot of the current page to `path`.
pub async fn capture_to(driver: &dyn Driver, path: &Path) -> Result<()> {
    let bytes = driver.screenshot().await?;
    std::fs::write(path, bytes).map_err(|source| ProbeError::Screenshot {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Best-effort capture of the page state to [`FAILURE_SCREENSHOT`].
///
/// Called on the error path of a flow; its own failure is only logged.
pub async fn capture_failure(driver: &dyn Driver) {
    match capture_to(driver, Path::new(FAILURE_SCREENSHOT)).await {
        Ok(()) => {
            info!(target = "dashprobe", path = FAILURE_SCREENSHOT, "failure screenshot captured")
        }
        Err(err) => {
            warn!(target = "dashprobe", error = %err, "failure screenshot could not be captured")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;

    #[tokio::test]
    async fn capture_writes_screenshot_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");

        let driver = MockDriver::new();
        capture_to(&driver, &path).await.unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn capture_to_bad_path_reports_screenshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("shot.png");

        let driver = MockDriver::new();
        let err = capture_to(&driver, &path).await.unwrap_err();
        assert!(matches!(err, ProbeError::Screenshot { .. }));
    }
}
