use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use dashprobe::sites::Platform;

#[derive(Parser, Debug)]
#[command(name = "dashprobe")]
#[command(about = "Scrape dashboard metrics through a headless browser")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run with a visible browser window instead of headless
    #[arg(long, global = true)]
    pub headful: bool,

    /// Directory for cached session cookies (defaults to the system temp dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub cookie_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Account credentials shared by every integration.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Account email
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Account password
    #[arg(long, value_name = "PASSWORD")]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crash-free users from the fabric.io issues dashboard
    Fabric {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Organization slug in dashboard URLs
        #[arg(long)]
        organization: String,

        /// Application slug in dashboard URLs
        #[arg(long)]
        app: String,

        /// Mobile platform to report on
        #[arg(long, value_enum, default_value = "ios")]
        platform: PlatformArg,
    },

    /// Metrics from the newrelic APM dashboard
    Newrelic {
        #[command(flatten)]
        credentials: CredentialArgs,

        #[command(subcommand)]
        metric: NewrelicMetric,
    },

    /// Weekly incident count from the pagerduty team report
    Pagerduty {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Organization subdomain
        #[arg(long)]
        organization: String,

        /// Escalation policy id the report is filtered to
        #[arg(long, value_name = "ID")]
        escalation_policy: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewrelicMetric {
    /// Application error rate over the last seven days
    ErrorRate,

    /// Response-time breakdown for one transaction
    AppPerformance {
        /// Transaction id
        #[arg(long, value_name = "ID")]
        transaction: String,
    },
}

/// Mobile platform (clap-compatible enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fabric_command() {
        let args = vec![
            "dashprobe",
            "fabric",
            "--email",
            "ops@acme.io",
            "--password",
            "pw",
            "--organization",
            "acme",
            "--app",
            "games",
            "--platform",
            "android",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Fabric {
                credentials,
                organization,
                app,
                platform,
            } => {
                assert_eq!(credentials.email, "ops@acme.io");
                assert_eq!(organization, "acme");
                assert_eq!(app, "games");
                assert!(matches!(platform, PlatformArg::Android));
            }
            _ => panic!("Expected Fabric command"),
        }
    }

    #[test]
    fn fabric_platform_defaults_to_ios() {
        let args = vec![
            "dashprobe",
            "fabric",
            "--email",
            "a@b.c",
            "--password",
            "pw",
            "--organization",
            "acme",
            "--app",
            "games",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Fabric { platform, .. } => assert!(matches!(platform, PlatformArg::Ios)),
            _ => panic!("Expected Fabric command"),
        }
    }

    #[test]
    fn parse_newrelic_app_performance() {
        let args = vec![
            "dashprobe",
            "newrelic",
            "--email",
            "a@b.c",
            "--password",
            "pw",
            "app-performance",
            "--transaction",
            "4242",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Newrelic { metric, .. } => match metric {
                NewrelicMetric::AppPerformance { transaction } => {
                    assert_eq!(transaction, "4242");
                }
                _ => panic!("Expected AppPerformance metric"),
            },
            _ => panic!("Expected Newrelic command"),
        }
    }

    #[test]
    fn parse_pagerduty_command() {
        let args = vec![
            "dashprobe",
            "pagerduty",
            "--email",
            "a@b.c",
            "--password",
            "pw",
            "--organization",
            "acme",
            "--escalation-policy",
            "P45K6JU",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Pagerduty {
                organization,
                escalation_policy,
                ..
            } => {
                assert_eq!(organization, "acme");
                assert_eq!(escalation_policy, "P45K6JU");
            }
            _ => panic!("Expected Pagerduty command"),
        }
    }

    #[test]
    fn global_flags_before_subcommand() {
        let args = vec![
            "dashprobe",
            "-vv",
            "--headful",
            "--cookie-dir",
            "/tmp/probe",
            "newrelic",
            "--email",
            "a@b.c",
            "--password",
            "pw",
            "error-rate",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.headful);
        assert_eq!(cli.cookie_dir, Some(PathBuf::from("/tmp/probe")));
    }

    #[test]
    fn missing_credentials_fail() {
        let args = vec!["dashprobe", "pagerduty", "--organization", "acme"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn invalid_command_fails() {
        let args = vec!["dashprobe", "slack"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
