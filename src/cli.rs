//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use clipstream::AppConfig;
use clipstream::browser::DEFAULT_WEBDRIVER_URL;
use clipstream::config::DEFAULT_ELEMENT_TIMEOUT_SECS;
use clipstream::extractor::DEFAULT_YTDLP_BINARY;
use clipstream::http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts,
};

/// Resolve video page URLs into downloadable formats and stream them.
///
/// Serves `POST /process-video` and `GET /download` over HTTP.
#[derive(Parser, Debug)]
#[command(name = "clipstream")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Address to listen on
    #[arg(long, env = "CLIPSTREAM_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Origin allowed to call the API (repeatable; any origin when omitted)
    #[arg(
        long = "allowed-origin",
        env = "CLIPSTREAM_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,

    /// yt-dlp executable used for extraction and downloads
    #[arg(long, env = "CLIPSTREAM_YTDLP", default_value = DEFAULT_YTDLP_BINARY)]
    pub ytdlp_path: PathBuf,

    /// WebDriver endpoint for browser-rendered pages
    #[arg(long, env = "CLIPSTREAM_WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver_url: String,

    /// Maximum concurrent browser sessions (1-16)
    #[arg(long, env = "CLIPSTREAM_BROWSER_SESSIONS", default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub browser_sessions: u8,

    /// Seconds to wait for a page's video element (1-120)
    #[arg(long, env = "CLIPSTREAM_ELEMENT_TIMEOUT_SECS", default_value_t = DEFAULT_ELEMENT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=120))]
    pub element_timeout_secs: u64,

    /// HTTP connect timeout in seconds (1-300)
    #[arg(long, env = "CLIPSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub connect_timeout_secs: u64,

    /// HTTP read timeout between body chunks in seconds (1-3600)
    #[arg(long, env = "CLIPSTREAM_READ_TIMEOUT_SECS", default_value_t = DEFAULT_READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout_secs: u64,
}

impl Args {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Library settings derived from the arguments.
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            ytdlp_path: self.ytdlp_path.clone(),
            webdriver_url: self.webdriver_url.clone(),
            element_timeout: Duration::from_secs(self.element_timeout_secs),
            http_timeouts: HttpTimeouts {
                connect_secs: self.connect_timeout_secs,
                read_secs: self.read_timeout_secs,
            },
            ..AppConfig::default()
        }
        .with_max_browser_sessions(usize::from(self.browser_sessions))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["clipstream"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert!(args.allowed_origins.is_empty());
        assert_eq!(args.browser_sessions, 2);
        assert_eq!(args.element_timeout_secs, 10);

        let config = args.app_config();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["clipstream", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);
        assert_eq!(args.default_log_level(), "debug");

        let args = Args::try_parse_from(["clipstream", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_flag_wins_over_verbose() {
        let args = Args::try_parse_from(["clipstream", "-q", "-v"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["clipstream", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["clipstream", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["clipstream", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_allowed_origins_repeat_and_split() {
        let args = Args::try_parse_from([
            "clipstream",
            "--allowed-origin",
            "http://localhost:5173",
            "--allowed-origin",
            "https://a.example,https://b.example",
        ])
        .unwrap();
        assert_eq!(
            args.allowed_origins,
            vec![
                "http://localhost:5173",
                "https://a.example",
                "https://b.example"
            ]
        );
    }

    #[test]
    fn test_cli_browser_sessions_range() {
        assert!(Args::try_parse_from(["clipstream", "--browser-sessions", "0"]).is_err());
        assert!(Args::try_parse_from(["clipstream", "--browser-sessions", "17"]).is_err());
        let args = Args::try_parse_from(["clipstream", "--browser-sessions", "16"]).unwrap();
        assert_eq!(args.app_config().max_browser_sessions, 16);
    }

    #[test]
    fn test_cli_browser_sessions_flow_into_config() {
        let args = Args::try_parse_from(["clipstream", "--browser-sessions", "5"]).unwrap();
        assert_eq!(args.app_config().max_browser_sessions, 5);
    }

    #[test]
    fn test_cli_timeouts_flow_into_config() {
        let args = Args::try_parse_from([
            "clipstream",
            "--element-timeout-secs",
            "3",
            "--connect-timeout-secs",
            "5",
            "--read-timeout-secs",
            "60",
            "--ytdlp-path",
            "/opt/bin/yt-dlp",
        ])
        .unwrap();
        let config = args.app_config();
        assert_eq!(config.element_timeout, Duration::from_secs(3));
        assert_eq!(config.http_timeouts.connect_secs, 5);
        assert_eq!(config.http_timeouts.read_secs, 60);
        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
    }

    #[test]
    fn test_cli_invalid_bind_is_rejected() {
        assert!(Args::try_parse_from(["clipstream", "--bind", "localhost"]).is_err());
    }
}
