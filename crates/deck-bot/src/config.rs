//! Runtime configuration, read from the environment or command line.

use std::fmt;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use thiserror::Error;
use url::Url;

use crate::retry::RetryConfig;

/// Errors in otherwise well-formed configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL setting could not be parsed.
    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    /// A setting is out of its allowed range.
    #[error("{key} {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Deck Bot - posts Nextcloud Deck card changes to Discord.
#[derive(Parser)]
#[command(name = "deck-bot", version)]
#[command(about = "Poll a Nextcloud Deck board and post card changes to a Discord webhook")]
pub struct Args {
    /// Nextcloud base URL (or set `NEXTCLOUD_URL` env var).
    #[arg(long, env = "NEXTCLOUD_URL")]
    pub nextcloud_url: String,

    /// Nextcloud username.
    #[arg(long, env = "NEXTCLOUD_USERNAME")]
    pub nextcloud_username: String,

    /// Nextcloud password or app token.
    #[arg(long, env = "NEXTCLOUD_PASSWORD", hide_env_values = true)]
    pub nextcloud_password: String,

    /// Discord webhook URL.
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub discord_webhook_url: String,

    /// Deck board ID to monitor.
    #[arg(long, env = "BOARD_ID")]
    pub board_id: u64,

    /// Discord thread to post into.
    #[arg(long, env = "DISCORD_THREAD_ID")]
    pub discord_thread_id: Option<String>,

    /// Seconds between polls.
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 60)]
    pub check_interval: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = deck::DEFAULT_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Attempts per outbound request before giving up.
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value_t = 3)]
    pub retry_max_attempts: u32,

    /// Notify every existing card on the first poll.
    #[arg(long, env = "NOTIFY_ON_STARTUP", default_value_t = false, action = ArgAction::Set)]
    pub notify_on_startup: bool,

    /// Notify when a card disappears from the board.
    #[arg(long, env = "NOTIFY_REMOVED_CARDS", default_value_t = false, action = ArgAction::Set)]
    pub notify_removed_cards: bool,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Validated settings.
#[derive(Clone)]
pub struct Settings {
    pub nextcloud_url: Url,
    pub username: String,
    pub password: String,
    pub webhook_url: Url,
    pub board_id: u64,
    pub thread_id: Option<String>,
    pub check_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub notify_on_startup: bool,
    pub notify_removed_cards: bool,
    pub log_format: LogFormat,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("nextcloud_url", &self.nextcloud_url.as_str())
            .field("username", &self.username)
            .field("board_id", &self.board_id)
            .field("thread_id", &self.thread_id)
            .field("check_interval", &self.check_interval)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("notify_on_startup", &self.notify_on_startup)
            .field("notify_removed_cards", &self.notify_removed_cards)
            .finish_non_exhaustive()
    }
}

impl TryFrom<Args> for Settings {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let nextcloud_url = parse_http_url("NEXTCLOUD_URL", &args.nextcloud_url)?;
        let webhook_url = parse_http_url("DISCORD_WEBHOOK_URL", &args.discord_webhook_url)?;

        if args.nextcloud_username.trim().is_empty() {
            return Err(invalid("NEXTCLOUD_USERNAME", "must not be empty"));
        }
        if args.nextcloud_password.is_empty() {
            return Err(invalid("NEXTCLOUD_PASSWORD", "must not be empty"));
        }
        if args.board_id == 0 {
            return Err(invalid("BOARD_ID", "must be a positive integer"));
        }
        if args.check_interval == 0 {
            return Err(invalid("CHECK_INTERVAL", "must be at least 1 second"));
        }
        if args.request_timeout == 0 {
            return Err(invalid("REQUEST_TIMEOUT", "must be at least 1 second"));
        }
        if args.retry_max_attempts == 0 {
            return Err(invalid("RETRY_MAX_ATTEMPTS", "must be at least 1"));
        }

        Ok(Self {
            nextcloud_url,
            username: args.nextcloud_username,
            password: args.nextcloud_password,
            webhook_url,
            board_id: args.board_id,
            thread_id: args.discord_thread_id.filter(|t| !t.trim().is_empty()),
            check_interval: Duration::from_secs(args.check_interval),
            request_timeout: Duration::from_secs(args.request_timeout),
            retry: RetryConfig::default().with_max_attempts(args.retry_max_attempts),
            notify_on_startup: args.notify_on_startup,
            notify_removed_cards: args.notify_removed_cards,
            log_format: args.log_format,
        })
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("must use http or https, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const REQUIRED: [&str; 11] = [
        "deck-bot",
        "--nextcloud-url",
        "https://cloud.example.com",
        "--nextcloud-username",
        "bot",
        "--nextcloud-password",
        "app-token",
        "--discord-webhook-url",
        "https://discord.com/api/webhooks/1/abc",
        "--board-id",
        "7",
    ];

    fn parse(extra: &[&str]) -> Result<Settings, ConfigError> {
        let args = Args::try_parse_from(REQUIRED.iter().chain(extra)).unwrap();
        Settings::try_from(args)
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let settings = parse(&[]).unwrap();
        assert_eq!(settings.board_id, 7);
        assert_eq!(settings.check_interval, Duration::from_secs(60));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.retry.max_attempts, 3);
        assert!(settings.thread_id.is_none());
        assert!(!settings.notify_on_startup);
        assert!(!settings.notify_removed_cards);
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_optional_settings() {
        let settings = parse(&[
            "--discord-thread-id",
            "123",
            "--check-interval",
            "15",
            "--notify-on-startup",
            "true",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(settings.thread_id.as_deref(), Some("123"));
        assert_eq!(settings.check_interval, Duration::from_secs(15));
        assert!(settings.notify_on_startup);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_zero_interval_rejected() {
        let err = parse(&["--check-interval", "0"]).unwrap_err();
        assert!(err.to_string().contains("CHECK_INTERVAL"));
    }

    #[test]
    #[serial]
    fn test_bad_url_rejected() {
        let args = Args::try_parse_from([
            "deck-bot",
            "--nextcloud-url",
            "not a url",
            "--nextcloud-username",
            "bot",
            "--nextcloud-password",
            "pw",
            "--discord-webhook-url",
            "ftp://discord.com/hook",
            "--board-id",
            "1",
        ])
        .unwrap();
        let err = Settings::try_from(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: "NEXTCLOUD_URL", .. }));
    }

    #[test]
    #[serial]
    fn test_debug_hides_secrets() {
        let settings = parse(&[]).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("app-token"));
        assert!(!debug.contains("webhooks/1/abc"));
    }

    #[test]
    #[serial]
    fn test_missing_required_fails() {
        std::env::remove_var("BOARD_ID");
        let result = Args::try_parse_from(&REQUIRED[..9]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_reads_environment() {
        let vars = [
            ("NEXTCLOUD_URL", "https://cloud.example.com/nextcloud"),
            ("NEXTCLOUD_USERNAME", "bot"),
            ("NEXTCLOUD_PASSWORD", "pw"),
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/2/x"),
            ("BOARD_ID", "42"),
            ("CHECK_INTERVAL", "30"),
            ("NOTIFY_REMOVED_CARDS", "true"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let result = Args::try_parse_from(["deck-bot"]).map(Settings::try_from);

        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let settings = result.unwrap().unwrap();
        assert_eq!(settings.board_id, 42);
        assert_eq!(settings.check_interval, Duration::from_secs(30));
        assert!(settings.notify_removed_cards);
        assert_eq!(
            settings.nextcloud_url.as_str(),
            "https://cloud.example.com/nextcloud"
        );
    }
}
