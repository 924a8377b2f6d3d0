use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use axum::http::HeaderValue;
use tracing::{info, warn};

/// Where line item prices come from when an order is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceSource {
    /// Price as submitted by the browser
    #[default]
    Client,
    /// Current catalog price, the submitted price is ignored
    Catalog,
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "catalog" => Ok(PriceSource::Catalog),
            "client" => Ok(PriceSource::Client),
            other => Err(format!("unknown pricing mode '{other}', expected catalog or client")),
        }
    }
}

/// Assets shipped with the crate, found no matter where the binary is started.
pub const DEFAULT_PUBLIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

pub struct Mail {
    pub user: String,
    pub pass: String,
    pub smtp_host: String,
}

pub struct Config {
    pub port: u16,
    pub mongodb_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub mail: Option<Mail>,
    pub cors_origin: HeaderValue,
    pub public_dir: String,
    pub pricing: PriceSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            mongodb_uri: None,
            database_name: "omnifood".to_string(),
            jwt_secret: String::new(),
            mail: None,
            cors_origin: HeaderValue::from_static("http://localhost:4000"),
            public_dir: DEFAULT_PUBLIC_DIR.to_string(),
            pricing: PriceSource::Client,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let jwt_secret =
            read_secret("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;

        let mongodb_uri = var("MONGODB_URI").ok();
        if mongodb_uri.is_none() {
            warn!("MONGODB_URI not set, records will only live in memory");
        }

        let mail = match (var("EMAIL_USER").ok(), read_secret("EMAIL_PASS")) {
            (Some(user), Some(pass)) => Some(Mail {
                user,
                pass,
                smtp_host: try_load("SMTP_HOST", "smtp.gmail.com")?,
            }),
            _ => {
                warn!("EMAIL_USER/EMAIL_PASS not set, notifications will only be logged");
                None
            }
        };

        let cors_origin: String = try_load("CORS_ORIGIN", "http://localhost:4000")?;

        Ok(Self {
            port: try_load("PORT", "4000")?,
            mongodb_uri,
            database_name: try_load("MONGODB_DATABASE", "omnifood")?,
            jwt_secret,
            mail,
            cors_origin: HeaderValue::from_str(&cors_origin)
                .with_context(|| format!("Invalid CORS_ORIGIN value: {cors_origin}"))?,
            public_dir: try_load("PUBLIC_DIR", DEFAULT_PUBLIC_DIR)?,
            pricing: try_load("ORDER_PRICING", "client")?,
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key)
        .map(|value| value.trim().to_string())
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match value.parse() {
        Ok(parsed) => Ok(parsed),
        Err(e) => bail!("Invalid {key} value: {e}"),
    }
}

/// Env var first, then a mounted `/run/secrets/<name>` file.
fn read_secret(secret_name: &str) -> Option<String> {
    if let Ok(value) = var(secret_name) {
        return Some(value);
    }

    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_modes_parse() {
        assert_eq!("catalog".parse::<PriceSource>(), Ok(PriceSource::Catalog));
        assert_eq!(" Client ".parse::<PriceSource>(), Ok(PriceSource::Client));
        assert!("free".parse::<PriceSource>().is_err());
    }

    #[test]
    fn submitted_prices_are_used_unless_catalog_is_asked_for() {
        assert_eq!(PriceSource::default(), PriceSource::Client);
        assert_eq!(Config::default().pricing, PriceSource::Client);
    }

    #[test]
    fn public_dir_defaults_to_the_shipped_assets() {
        let dir = std::path::Path::new(&Config::default().public_dir).to_path_buf();
        assert!(dir.is_absolute());
        assert!(dir.join("js/script.js").is_file());
        assert!(dir.join("css/styles.css").is_file());
    }

    #[test]
    fn defaults_apply_to_missing_keys() {
        let port: u16 = try_load("OMNIFOOD_TEST_UNSET_PORT", "4000").unwrap();
        assert_eq!(port, 4000);

        let bad: Result<u16> = try_load("OMNIFOOD_TEST_UNSET_PORT", "not-a-port");
        assert!(bad.is_err());
    }
}
