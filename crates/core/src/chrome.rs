//! Chromium-backed [`Driver`] implementation.
//!
//! Owns the browser process, the CDP handler loop, and a single page.
//! One `Chrome` drives one login-then-scrape flow to completion.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::driver::Driver;
use crate::error::{ProbeError, Result};
use dashprobe_protocol::{Cookie, CookieParam};

pub struct Chrome {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Chrome {
    /// Launches a Chromium instance and opens a blank page.
    pub async fn launch(headless: bool) -> Result<Self> {
        debug!(target = "dashprobe", headless, "launching chromium");

        let mut config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(1280, 720);
        if !headless {
            config = config.with_head();
        }
        let config = config.build().map_err(ProbeError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ProbeError::Launch(e.to_string()))?;

        // The handler task pumps CDP websocket traffic until the
        // browser goes away.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Shuts the browser down and joins the handler loop.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = self.handler.await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Driver for Chrome {
    async fn navigate(&self, url: &str) -> Result<()> {
        let wrap = |e: chromiumoxide::error::CdpError| ProbeError::Navigation {
            url: url.to_string(),
            source: anyhow::Error::new(e),
        };

        self.page.goto(url).await.map_err(wrap)?;
        self.page.wait_for_navigation().await.map_err(wrap)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| ProbeError::JsEval(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element =
            self.page
                .find_element(selector)
                .await
                .map_err(|_| ProbeError::ElementNotFound {
                    selector: selector.to_string(),
                })?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element =
            self.page
                .find_element(selector)
                .await
                .map_err(|_| ProbeError::ElementNotFound {
                    selector: selector.to_string(),
                })?;
        element.click().await?;
        Ok(())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        // Absence is not an error here: scrapes poll for elements that
        // only exist once client-side rendering finishes.
        match self.page.find_element(selector).await {
            Ok(element) => Ok(element.inner_text().await?),
            Err(_) => Ok(None),
        }
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let raw: Vec<network::Cookie> = self.page.get_cookies().await?;
        // The cached file must hold the browser's own wire shape, so
        // conversion goes through the shared JSON representation.
        let cookies = serde_json::from_value(serde_json::to_value(raw)?)?;
        Ok(cookies)
    }

    async fn set_cookies(&self, cookies: Vec<CookieParam>) -> Result<()> {
        let params: Vec<network::CookieParam> =
            serde_json::from_value(serde_json::to_value(cookies)?)?;
        self.page.set_cookies(params).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await?;
        Ok(bytes)
    }
}
