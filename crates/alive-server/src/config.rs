use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::TimeDelta;

use alive_core::channels::{EmailSettings, EmailTransportSettings};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
    "alive-secret-key-change-in-production",
];

/// Upper bound for hour-valued settings (ten years).
const MAX_HOURS: i64 = 87_600;

/// How check-in emails leave the process.
#[derive(Debug, Clone)]
pub enum EmailMode {
    /// Log the message; nothing is sent.
    Log,
    Deliver(EmailSettings),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub static_dir: Option<PathBuf>,
    pub inactive_hours: i64,
    pub inactive_after: TimeDelta,
    pub renotify_after: Option<TimeDelta>,
    pub sweep_interval: Duration,
    pub dispatch_timeout: Duration,
    pub display_offset_minutes: i32,
    pub email: EmailMode,
    pub sms_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("ALIVE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ALIVE_JWT_SECRET is unset or still a placeholder; set it in your .env file and restart");
        }

        let inactive_hours: i64 = parse_or(&var, "ALIVE_INACTIVE_HOURS", 24)?;
        let inactive_after = hours("ALIVE_INACTIVE_HOURS", inactive_hours)?;
        let renotify_after = var("ALIVE_RENOTIFY_HOURS")
            .map(|v| {
                let n = v
                    .parse::<i64>()
                    .with_context(|| format!("ALIVE_RENOTIFY_HOURS has an invalid value '{v}'"))?;
                hours("ALIVE_RENOTIFY_HOURS", n)
            })
            .transpose()?;

        let sweep_secs: u64 = parse_or(&var, "ALIVE_SWEEP_INTERVAL_SECS", 3600)?;
        if sweep_secs == 0 {
            bail!("ALIVE_SWEEP_INTERVAL_SECS must be positive");
        }
        let dispatch_secs: u64 = parse_or(&var, "ALIVE_DISPATCH_TIMEOUT_SECS", 30)?;

        let display_offset_minutes: i32 = parse_or(&var, "ALIVE_DISPLAY_UTC_OFFSET_MINUTES", 480)?;
        if display_offset_minutes.abs() >= 24 * 60 {
            bail!("ALIVE_DISPLAY_UTC_OFFSET_MINUTES must be within one day");
        }

        Ok(Self {
            host: var("ALIVE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "ALIVE_PORT", 3000)?,
            db_path: var("ALIVE_DB_PATH").unwrap_or_else(|| "alive.db".into()).into(),
            jwt_secret,
            static_dir: var("ALIVE_STATIC_DIR").map(PathBuf::from),
            inactive_hours,
            inactive_after,
            renotify_after,
            sweep_interval: Duration::from_secs(sweep_secs),
            dispatch_timeout: Duration::from_secs(dispatch_secs),
            display_offset_minutes,
            email: email_mode(&var)?,
            sms_webhook_url: var("ALIVE_SMS_WEBHOOK_URL"),
        })
    }
}

/// An hour count in `1..=MAX_HOURS`, as a duration.
fn hours(key: &str, n: i64) -> anyhow::Result<TimeDelta> {
    if !(1..=MAX_HOURS).contains(&n) {
        bail!("{key} must be between 1 and {MAX_HOURS} hours, got {n}");
    }
    TimeDelta::try_hours(n).with_context(|| format!("{key} is out of range"))
}

fn email_mode(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<EmailMode> {
    let transport = match var("ALIVE_EMAIL_TRANSPORT").as_deref().unwrap_or("log") {
        "log" => return Ok(EmailMode::Log),
        "smtp" => EmailTransportSettings::Smtp {
            host: var("ALIVE_SMTP_HOST").context("ALIVE_SMTP_HOST is required for the smtp transport")?,
            port: parse_or(var, "ALIVE_SMTP_PORT", 587)?,
            username: var("ALIVE_SMTP_USERNAME").unwrap_or_default(),
            password: var("ALIVE_SMTP_PASSWORD").unwrap_or_default(),
            use_tls: parse_or(var, "ALIVE_SMTP_TLS", true)?,
        },
        "file" => EmailTransportSettings::File {
            dir: var("ALIVE_EMAIL_FILE_DIR").unwrap_or_else(|| "./emails".into()).into(),
        },
        other => bail!("unknown ALIVE_EMAIL_TRANSPORT '{other}' (expected log, smtp or file)"),
    };

    Ok(EmailMode::Deliver(EmailSettings {
        transport,
        from_email: var("ALIVE_EMAIL_FROM").unwrap_or_else(|| "noreply@alive.local".into()),
        from_name: var("ALIVE_EMAIL_FROM_NAME").unwrap_or_else(|| "Alive".into()),
    }))
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("ALIVE_JWT_SECRET", "s3cret-for-tests")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("alive.db"));
        assert_eq!(cfg.inactive_hours, 24);
        assert_eq!(cfg.inactive_after, TimeDelta::hours(24));
        assert_eq!(cfg.renotify_after, None);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(3600));
        assert_eq!(cfg.dispatch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.display_offset_minutes, 480);
        assert!(matches!(cfg.email, EmailMode::Log));
        assert!(cfg.sms_webhook_url.is_none());
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn placeholder_or_missing_secret_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("ALIVE_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn smtp_settings() {
        let cfg = config(&[
            ("ALIVE_JWT_SECRET", "s3cret-for-tests"),
            ("ALIVE_EMAIL_TRANSPORT", "smtp"),
            ("ALIVE_SMTP_HOST", "smtp.example.com"),
            ("ALIVE_SMTP_TLS", "false"),
        ])
        .unwrap();
        match cfg.email {
            EmailMode::Deliver(EmailSettings {
                transport: EmailTransportSettings::Smtp { host, port, use_tls, .. },
                ..
            }) => {
                assert_eq!(host, "smtp.example.com");
                assert_eq!(port, 587);
                assert!(!use_tls);
            }
            other => panic!("unexpected email mode {other:?}"),
        }

        assert!(config(&[("ALIVE_JWT_SECRET", "s3cret-for-tests"), ("ALIVE_EMAIL_TRANSPORT", "smtp")]).is_err());
    }

    #[test]
    fn hour_settings_are_bounded() {
        let secret = ("ALIVE_JWT_SECRET", "s3cret-for-tests");
        assert!(config(&[secret, ("ALIVE_INACTIVE_HOURS", "2500000000")]).is_err());
        assert!(config(&[secret, ("ALIVE_INACTIVE_HOURS", "87601")]).is_err());
        assert!(config(&[secret, ("ALIVE_INACTIVE_HOURS", "-3")]).is_err());
        assert!(config(&[secret, ("ALIVE_RENOTIFY_HOURS", "0")]).is_err());
        assert!(config(&[secret, ("ALIVE_RENOTIFY_HOURS", "-12")]).is_err());
        assert!(config(&[secret, ("ALIVE_RENOTIFY_HOURS", "9999999999")]).is_err());
        assert!(config(&[secret, ("ALIVE_RENOTIFY_HOURS", "soon")]).is_err());

        let cfg = config(&[
            secret,
            ("ALIVE_INACTIVE_HOURS", "87600"),
            ("ALIVE_RENOTIFY_HOURS", "12"),
        ])
        .unwrap();
        assert_eq!(cfg.inactive_after, TimeDelta::hours(87_600));
        assert_eq!(cfg.renotify_after, Some(TimeDelta::hours(12)));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        assert!(config(&[("ALIVE_JWT_SECRET", "s3cret-for-tests"), ("ALIVE_PORT", "eighty")]).is_err());
        assert!(config(&[("ALIVE_JWT_SECRET", "s3cret-for-tests"), ("ALIVE_INACTIVE_HOURS", "0")]).is_err());
        assert!(config(&[("ALIVE_JWT_SECRET", "s3cret-for-tests"), ("ALIVE_EMAIL_TRANSPORT", "pigeon")]).is_err());
    }
}
