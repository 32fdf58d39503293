use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use poolfix::fetcher::ProxyCredentials;
use poolfix::{FailurePolicy, FetcherOptions};

#[derive(Debug, Clone, Parser)]
#[command(name = "poolfix-api")]
#[command(about = "Serves ablefast.com pool fixtures as JSON, caching every scraped week", long_about = None)]
pub struct Config {
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0", help = "Address to listen on")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 4000, help = "Port to listen on")]
    pub port: u16,

    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://fixtures.db",
        help = "Connection string of the fixture cache database"
    )]
    pub database_url: String,

    #[arg(
        long,
        env = "UPSTREAM_URL",
        default_value = poolfix::BASE_URL,
        help = "Base URL of the fixtures site"
    )]
    pub upstream_url: String,

    #[arg(long, env = "PROXY", help = "Forward proxy for upstream requests")]
    pub proxy: Option<String>,

    #[arg(long, env = "PROXY_USERNAME")]
    pub proxy_username: Option<String>,

    #[arg(long, env = "PROXY_PASSWORD", hide_env_values = true)]
    pub proxy_password: Option<String>,

    #[arg(
        long = "fetch-timeout",
        env = "FETCH_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Upstream request timeout in seconds"
    )]
    pub fetch_timeout_secs: u64,

    #[arg(
        long,
        env = "FAILURE_POLICY",
        default_value = "strict",
        help = "How upstream failures are answered: 'strict' (5xx) or 'lenient' (empty list)"
    )]
    pub failure_policy: FailurePolicy,

    #[arg(
        short = 'l',
        long = "log-level",
        env = "LOG_LEVEL",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy credentials are only used when both halves are present.
    pub fn fetcher_options(&self) -> FetcherOptions {
        let proxy_credentials = match (&self.proxy_username, &self.proxy_password) {
            (Some(username), Some(password)) => Some(ProxyCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        FetcherOptions {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            proxy: self.proxy.clone(),
            proxy_credentials,
        }
    }
}
