//! Testing infrastructure for dashprobe.
//!
//! Provides a mock [`Driver`] so login and scrape flows can be tested
//! without spawning a browser. Configure expected responses with the
//! `set_*`/`push_*` methods, then assert on the recorded actions.
//!
//! # Example
//!
//! ```ignore
//! use dashprobe::testing::MockDriver;
//!
//! #[tokio::test]
//! async fn test_scrape() {
//!     let driver = MockDriver::new();
//!     driver.set_text("#value", "42%");
//!     // ... run flow against &driver, then inspect driver.actions()
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use dashprobe_protocol::{Cookie, CookieParam};

/// Action recorded by [`MockDriver`] for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
    /// Navigation was performed.
    Navigate { url: String },
    /// Text was typed into an element.
    Fill { selector: String, text: String },
    /// A click was performed.
    Click { selector: String },
    /// JavaScript was evaluated.
    Evaluate { expression: String },
    /// The cookie jar was read.
    ReadCookies,
    /// Cookies were applied to the session.
    SetCookies { count: usize },
    /// A screenshot was taken.
    Screenshot,
}

/// Mock driver with scripted responses.
///
/// Navigation lands on the requested URL unless a redirect is
/// configured for it. Text and eval responses can be scripted as
/// sequences; the last entry sticks, so a poll loop settles on it.
#[derive(Default)]
pub struct MockDriver {
    url: Mutex<String>,
    redirects: Mutex<HashMap<String, String>>,
    texts: Mutex<HashMap<String, VecDeque<Option<String>>>>,
    evals: Mutex<HashMap<String, VecDeque<serde_json::Value>>>,
    jar: Mutex<Vec<Cookie>>,
    applied: Mutex<Vec<CookieParam>>,
    screenshot_bytes: Mutex<Vec<u8>>,
    navigate_error: Mutex<Option<String>>,
    actions: Mutex<Vec<MockAction>>,
}

impl MockDriver {
    /// Creates a mock driver at `about:blank` returning a PNG header
    /// for screenshots.
    pub fn new() -> Self {
        Self {
            url: Mutex::new("about:blank".to_string()),
            screenshot_bytes: Mutex::new(vec![0x89, b'P', b'N', b'G']),
            ..Self::default()
        }
    }

    /// Navigating to `from` lands on `to` (an unauthenticated redirect).
    pub fn set_redirect(&self, from: &str, to: &str) {
        self.redirects
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
    }

    /// Every `text()` call for `selector` returns `text`.
    pub fn set_text(&self, selector: &str, text: &str) {
        self.push_text(selector, Some(text));
    }

    /// Appends one scripted `text()` response for `selector`;
    /// [`None`] means the element is absent for that poll.
    pub fn push_text(&self, selector: &str, text: Option<&str>) {
        self.texts
            .lock()
            .unwrap()
            .entry(selector.to_string())
            .or_default()
            .push_back(text.map(str::to_string));
    }

    /// Every `evaluate()` call for `expression` returns `value`.
    pub fn set_eval(&self, expression: &str, value: serde_json::Value) {
        self.push_eval(expression, value);
    }

    /// Appends one scripted `evaluate()` response for `expression`.
    pub fn push_eval(&self, expression: &str, value: serde_json::Value) {
        self.evals
            .lock()
            .unwrap()
            .entry(expression.to_string())
            .or_default()
            .push_back(value);
    }

    /// Replaces the live cookie jar.
    pub fn set_jar(&self, cookies: Vec<Cookie>) {
        *self.jar.lock().unwrap() = cookies;
    }

    /// Makes every `navigate()` call fail with the given message.
    pub fn fail_navigation(&self, message: &str) {
        *self.navigate_error.lock().unwrap() = Some(message.to_string());
    }

    /// Cookie params applied via `set_cookies`, in order.
    pub fn applied_cookies(&self) -> Vec<CookieParam> {
        self.applied.lock().unwrap().clone()
    }

    /// Returns all recorded actions (for test assertions).
    pub fn actions(&self) -> Vec<MockAction> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: MockAction) {
        self.actions.lock().unwrap().push(action);
    }

    fn next_scripted<T: Clone>(map: &mut HashMap<String, VecDeque<T>>, key: &str) -> Option<T> {
        let queue = map.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(MockAction::Navigate {
            url: url.to_string(),
        });

        if let Some(message) = self.navigate_error.lock().unwrap().clone() {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                source: anyhow::anyhow!(message),
            });
        }

        let landed = self
            .redirects
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.url.lock().unwrap() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        self.record(MockAction::Evaluate {
            expression: expression.to_string(),
        });
        let mut evals = self.evals.lock().unwrap();
        Ok(Self::next_scripted(&mut evals, expression).unwrap_or(serde_json::Value::Null))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.record(MockAction::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(MockAction::Click {
            selector: selector.to_string(),
        });
        Ok(())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        let mut texts = self.texts.lock().unwrap();
        Ok(Self::next_scripted(&mut texts, selector).flatten())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        self.record(MockAction::ReadCookies);
        Ok(self.jar.lock().unwrap().clone())
    }

    async fn set_cookies(&self, cookies: Vec<CookieParam>) -> Result<()> {
        self.record(MockAction::SetCookies {
            count: cookies.len(),
        });
        self.applied.lock().unwrap().extend(cookies);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.record(MockAction::Screenshot);
        Ok(self.screenshot_bytes.lock().unwrap().clone())
    }
}
