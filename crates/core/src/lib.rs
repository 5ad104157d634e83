//! dashprobe: scrape dashboard metrics over the DevTools protocol.
//!
//! Drives a headless Chromium through CDP to log into third-party
//! dashboards and read numbers out of rendered HTML/SVG. Interactive
//! logins are avoided where possible: each site persists its cookie
//! jar through [`session::SessionCache`] and verifies a restored
//! session with a live probe before trusting it.
//!
//! # Example
//!
//! ```ignore
//! use dashprobe::chrome::Chrome;
//! use dashprobe::sites::{Credentials, Dashboard, Metric, Pagerduty};
//!
//! #[tokio::main]
//! async fn main() -> dashprobe::Result<()> {
//!     let chrome = Chrome::launch(true).await?;
//!     let pagerduty = Pagerduty::new("acme", "P45K6JU");
//!
//!     pagerduty
//!         .login(&chrome, &Credentials::new("ops@acme.io", "secret"))
//!         .await?;
//!     let count = pagerduty.scrape(&chrome, &Metric::OncallVolume).await?;
//!     println!("{count}");
//!
//!     chrome.close().await
//! }
//! ```

pub mod capture;
pub mod chrome;
pub mod driver;
pub mod error;
pub mod poll;
pub mod session;
pub mod sites;
pub mod testing;

pub use driver::Driver;
pub use error::{ProbeError, Result};
pub use session::SessionCache;
