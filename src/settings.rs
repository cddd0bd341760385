use std::{env, fmt, str::FromStr};

use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Comma-separated list of allowed CORS origins. The form is posted
    /// from the static site, so this is usually a single origin.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,

    /// Whether the first X-Forwarded-For entry is a trustworthy client
    /// address. Only enable behind a proxy that overwrites the header.
    #[serde(default = "default_trust_forwarded_for")]
    pub trust_forwarded_for: bool,

    #[serde(default)]
    pub mail: MailSettings,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Geonix-Contact-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> String {
    "*".to_string()
}
fn default_trust_forwarded_for() -> bool {
    true
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;
        // The relay variables keep their historical names without the APP
        // prefix. A missing relay is not a startup error: the handler
        // answers server_not_configured until the operator fixes it.
        config.mail = config.mail.overlay_env();

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.worker_count == 0 {
            errors.push("worker_count must be at least 1");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Mail-relay settings. All fields are optional at load time; whether the
/// relay is usable is decided per request through [`MailSettings::relay`].
#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct MailSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_mail_port")]
    pub port: u16,

    #[serde(default = "default_mail_secure")]
    pub secure: bool,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub pass: Option<String>,

    /// Recipient of the admin notification.
    #[serde(default)]
    pub to: Option<String>,
}

fn default_mail_port() -> u16 {
    465
}
fn default_mail_secure() -> bool {
    true
}

impl Default for MailSettings {
    fn default() -> Self {
        MailSettings {
            host: None,
            port: default_mail_port(),
            secure: default_mail_secure(),
            user: None,
            pass: None,
            to: None,
        }
    }
}

impl MailSettings {
    /// Overlays the MAIL_* environment variables onto whatever the config
    /// files provided. Empty values count as absent.
    fn overlay_env(mut self) -> Self {
        if let Some(v) = non_empty_env("MAIL_HOST") {
            self.host = Some(v);
        }
        if let Some(v) = non_empty_env("MAIL_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Some(v) = non_empty_env("MAIL_SECURE") {
            self.secure = !matches!(v.to_lowercase().as_str(), "false" | "0" | "no");
        }
        if let Some(v) = non_empty_env("MAIL_USER") {
            self.user = Some(v);
        }
        if let Some(v) = non_empty_env("MAIL_PASS") {
            self.pass = Some(v);
        }
        if let Some(v) = non_empty_env("MAIL_TO") {
            self.to = Some(v);
        }
        self
    }

    /// Materialises the relay settings if host, user, pass and recipient
    /// are all present. Port and secure-flag always have defaults.
    pub fn relay(&self) -> Option<RelaySettings> {
        Some(RelaySettings {
            host: required(&self.host)?,
            port: self.port,
            secure: self.secure,
            user: required(&self.user)?,
            pass: Zeroizing::new(required(&self.pass)?),
            to: required(&self.to)?,
        })
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A fully-configured relay. Only constructed when every required value is
/// present, so downstream code never re-checks individual fields.
#[derive(Clone)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: Zeroizing<String>,
    pub to: String,
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self.as_deref() {
            None | Some("") => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &self.pass.redact())
            .field("to", &self.to)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("mail", &self.mail)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_mail() -> MailSettings {
        MailSettings {
            host: Some("smtp.example.com".into()),
            port: 465,
            secure: true,
            user: Some("relay@geonix.example".into()),
            pass: Some("hunter2".into()),
            to: Some("owner@geonix.example".into()),
        }
    }

    #[test]
    fn relay_requires_host_user_pass_and_recipient() {
        assert!(full_mail().relay().is_some());

        for strip in 0..4 {
            let mut mail = full_mail();
            match strip {
                0 => mail.host = None,
                1 => mail.user = None,
                2 => mail.pass = None,
                _ => mail.to = None,
            }
            assert!(mail.relay().is_none(), "field {strip} should be required");
        }
    }

    #[test]
    fn blank_values_count_as_absent() {
        let mut mail = full_mail();
        mail.to = Some("   ".into());
        assert!(mail.relay().is_none());
    }

    #[test]
    fn defaults_keep_port_and_secure_flag() {
        let mail = MailSettings::default();
        assert_eq!(mail.port, 465);
        assert!(mail.secure);
        assert!(mail.relay().is_none());
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let rendered = format!("{:?}", full_mail());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
