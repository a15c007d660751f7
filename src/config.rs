//! Service configuration, sourced from the environment.
//!
//! Every knob has a default so the service starts with nothing set except
//! the sender credentials - and even those may be absent: admission then
//! answers 400 while status queries keep working.

use std::{
    fmt::{self, Debug},
    path::PathBuf,
};

use serde::Deserialize;

use crate::dispatch::RetryPolicy;

/// An opaque sender secret.
///
/// The Debug impl never prints the value.
#[derive(Clone, Deserialize)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for handing to the relay during AUTH.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(********)")
    }
}

/// The identity mail is sent as.
#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    /// Address used for MAIL FROM and the From header.
    pub email: String,

    /// Display name for the From header; plain address when empty.
    #[serde(default)]
    pub display_name: String,

    /// Relay credential, paired with `email` for AUTH.
    pub credential: Credential,
}

impl SenderConfig {
    /// The From header value: `Display Name <email>`, or the bare address.
    #[must_use]
    pub fn from_header(&self) -> String {
        if self.display_name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.display_name, self.email)
        }
    }
}

/// Timeouts applied to individual relay operations.
///
/// Each bound covers a single network operation within one delivery
/// attempt; nothing bounds the retry sequence as a whole.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RelayTimeouts {
    /// Timeout for establishing the TCP connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_secs: u64,

    /// Timeout for a single command/response round trip.
    #[serde(default = "default_command_timeout")]
    pub command_secs: u64,

    /// Timeout for transmitting the message payload.
    ///
    /// Longer than the command timeout to accommodate large bodies.
    #[serde(default = "default_data_timeout")]
    pub data_secs: u64,
}

impl Default for RelayTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_timeout(),
            command_secs: default_command_timeout(),
            data_secs: default_data_timeout(),
        }
    }
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_command_timeout() -> u64 {
    30
}

const fn default_data_timeout() -> u64 {
    120
}

/// The relay endpoint and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Relay hostname.
    #[serde(default = "default_relay_host")]
    pub host: String,

    /// Relay submission port.
    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Upgrade the connection with STARTTLS before authenticating.
    ///
    /// On by default; only tests against a plaintext relay turn this off.
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// Skip TLS certificate validation (testing only).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub timeouts: RelayTimeouts,
}

impl RelayConfig {
    /// The `host:port` address to connect to.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            starttls: true,
            accept_invalid_certs: false,
            timeouts: RelayTimeouts::default(),
        }
    }
}

fn default_relay_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_relay_port() -> u16 {
    587
}

const fn default_true() -> bool {
    true
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    /// Absent when the environment carries no credentials.
    #[serde(default)]
    pub sender: Option<SenderConfig>,

    /// Port the HTTP surface listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Path of the append-only audit log.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    /// Number of concurrent dispatch workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Capacity of the pending-job queue feeding the workers.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            sender: None,
            listen_port: default_listen_port(),
            audit_log_path: default_audit_log_path(),
            worker_count: default_worker_count(),
            queue_depth: default_queue_depth(),
            retry: RetryPolicy::default(),
        }
    }
}

const fn default_listen_port() -> u16 {
    10000
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("email_log.csv")
}

const fn default_worker_count() -> usize {
    5
}

const fn default_queue_depth() -> usize {
    32
}

impl Config {
    /// Build the configuration from environment variables.
    ///
    /// Unparseable numeric values are reported on stderr and fall back to
    /// their defaults, the same way an invalid `LOG_LEVEL` does.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self {
            relay: RelayConfig {
                host: env_or("SMTP_SERVER", default_relay_host),
                port: parsed_env("SMTP_PORT", default_relay_port()),
                starttls: parsed_env("SMTP_STARTTLS", true),
                accept_invalid_certs: parsed_env("SMTP_ACCEPT_INVALID_CERTS", false),
                timeouts: RelayTimeouts::default(),
            },
            sender: None,
            listen_port: parsed_env("PORT", default_listen_port()),
            audit_log_path: std::env::var("AUDIT_LOG_PATH")
                .map_or_else(|_| default_audit_log_path(), PathBuf::from),
            worker_count: parsed_env("WORKER_COUNT", default_worker_count()),
            queue_depth: parsed_env("QUEUE_DEPTH", default_queue_depth()),
            retry: RetryPolicy {
                max_attempts: parsed_env("MAX_ATTEMPTS", RetryPolicy::default().max_attempts),
                base_delay_secs: parsed_env(
                    "RETRY_BASE_DELAY_SECS",
                    RetryPolicy::default().base_delay_secs,
                ),
                max_delay_secs: parsed_env(
                    "RETRY_MAX_DELAY_SECS",
                    RetryPolicy::default().max_delay_secs,
                ),
            },
        };

        if let (Ok(email), Ok(password)) = (
            std::env::var("USER_EMAIL"),
            std::env::var("USER_APP_PASSWORD"),
        ) {
            config.sender = Some(SenderConfig {
                email,
                display_name: std::env::var("EMAIL_FROM_NAME").unwrap_or_default(),
                credential: Credential::new(password),
            });
        }

        config
    }

    /// The `host:port` the HTTP surface binds, open to external clients.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }
}

fn env_or(name: &str, default: fn() -> String) -> String {
    std::env::var(name).unwrap_or_else(|_| default())
}

fn parsed_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    std::env::var(name).map_or(default, |value| {
        value.parse().unwrap_or_else(|_| {
            eprintln!("Invalid value for {name}: {value}, using default");
            default
        })
    })
}
