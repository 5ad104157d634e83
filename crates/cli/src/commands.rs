//! Command dispatch: launch the browser, run one login-then-scrape
//! flow, print the value.

use std::path::PathBuf;

use tracing::info;

use crate::cli::{Cli, Commands, CredentialArgs, NewrelicMetric};
use dashprobe::chrome::Chrome;
use dashprobe::sites::{Credentials, Dashboard, Fabric, Metric, Newrelic, Pagerduty};
use dashprobe::{Result, SessionCache};

pub async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        verbose: _,
        headful,
        cookie_dir,
        command,
    } = cli;

    let chrome = Chrome::launch(!headful).await?;
    let outcome = run(command, &cookie_dir, &chrome).await;

    // Shut the browser down even when the flow failed; a close error
    // only surfaces if the flow itself succeeded.
    let closed = chrome.close().await;
    outcome?;
    closed
}

async fn run(command: Commands, cookie_dir: &Option<PathBuf>, driver: &Chrome) -> Result<()> {
    match command {
        Commands::Fabric {
            credentials,
            organization,
            app,
            platform,
        } => {
            info!(target = "dashprobe", %organization, %app, "fabric crash-free users");

            let fabric =
                Fabric::with_cache(organization, app, session_cache("fabric", cookie_dir));
            fabric.login(driver, &creds(credentials)).await?;
            let value = fabric
                .scrape(
                    driver,
                    &Metric::CrashFreeUsers {
                        platform: platform.into(),
                    },
                )
                .await?;
            println!("{value}");
        }

        Commands::Newrelic {
            credentials,
            metric,
        } => {
            let newrelic = Newrelic::with_cache(session_cache("newrelic", cookie_dir));
            newrelic.login(driver, &creds(credentials)).await?;

            match metric {
                NewrelicMetric::ErrorRate => {
                    info!(target = "dashprobe", "newrelic error rate");
                    let value = newrelic.scrape(driver, &Metric::ErrorRate).await?;
                    println!("{value}");
                }
                NewrelicMetric::AppPerformance { transaction } => {
                    info!(target = "dashprobe", %transaction, "newrelic app performance");
                    let perf = newrelic.app_performance(driver, &transaction).await?;
                    println!("app_response_ms: {}", perf.response_ms);
                    println!("app_histogram_ms: {}", perf.histogram_ms);
                    println!("app_percentile_ms: {}", perf.percentile_ms);
                }
            }
        }

        Commands::Pagerduty {
            credentials,
            organization,
            escalation_policy,
        } => {
            info!(target = "dashprobe", %organization, "pagerduty oncall volume");

            let pagerduty = Pagerduty::with_cache(
                organization,
                escalation_policy,
                session_cache("pagerduty", cookie_dir),
            );
            pagerduty.login(driver, &creds(credentials)).await?;
            let value = pagerduty.scrape(driver, &Metric::OncallVolume).await?;
            println!("{value}");
        }
    }

    Ok(())
}

fn session_cache(site: &str, dir: &Option<PathBuf>) -> SessionCache {
    match dir {
        Some(dir) => SessionCache::with_dir(site, dir),
        None => SessionCache::new(site),
    }
}

fn creds(args: CredentialArgs) -> Credentials {
    Credentials::new(args.email, args.password)
}
