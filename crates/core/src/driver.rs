//! Browser driver capability seam.
//!
//! Flows drive the browser through [`Driver`] only; the protocol
//! implementation behind it is interchangeable. [`crate::chrome::Chrome`]
//! is the real implementation, [`crate::testing::MockDriver`] the test
//! double.

use async_trait::async_trait;

use crate::error::Result;
use dashprobe_protocol::{Cookie, CookieParam};

/// Capability set a login/scrape flow needs from a browser.
///
/// Mirrors what the sites actually consume: navigation, the current
/// location, script evaluation, form input, the cookie jar, and a
/// diagnostic screenshot. Nothing here implements protocol mechanics.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigates the active page to `url` and waits for the load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the URL the page ended up at.
    async fn current_url(&self) -> Result<String>;

    /// Evaluates a JavaScript `expression` and returns its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value>;

    /// Types `text` into the first element matching `selector`.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Clicks the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Returns the rendered text of the first element matching
    /// `selector`, or [`None`] while no such element exists.
    async fn text(&self, selector: &str) -> Result<Option<String>>;

    /// Reads the full cookie jar of the active session.
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Applies `cookies` to the active session.
    async fn set_cookies(&self, cookies: Vec<CookieParam>) -> Result<()>;

    /// Captures a full-page PNG of the current page state.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
