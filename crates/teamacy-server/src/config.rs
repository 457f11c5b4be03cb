use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use axum::http::HeaderValue;
use jsonwebtoken::Algorithm;
use teamacy_api::bootstrap::AdminSeed;
use teamacy_api::token::MAX_EXPIRATION_HOURS;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret", "dev-secret-change-me"];

#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    /// Reflect whatever origin the browser sends.
    Any,
    List(Vec<HeaderValue>),
}

/// Email provider settings. Absent when `RESEND_API_KEY` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub sender: String,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub admin: AdminSeed,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_expiration_hours: i64,
    pub mail: Option<MailConfig>,
    pub cors_origins: CorsOrigins,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{} must be set", key));

        let jwt_secret = required("JWT_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JWT_SECRET is still a placeholder, set a random value");
        }

        let jwt_algorithm = match var("JWT_ALGORITHM") {
            Some(raw) => Algorithm::from_str(&raw)
                .map_err(|_| anyhow!("JWT_ALGORITHM '{}' is not a known algorithm", raw))?,
            None => Algorithm::HS256,
        };

        let jwt_expiration_hours = match var("JWT_EXPIRATION_HOURS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("JWT_EXPIRATION_HOURS '{}' is not a number", raw))?,
            None => 24,
        };
        if !(1..=MAX_EXPIRATION_HOURS).contains(&jwt_expiration_hours) {
            bail!(
                "JWT_EXPIRATION_HOURS must be between 1 and {}, got {}",
                MAX_EXPIRATION_HOURS,
                jwt_expiration_hours
            );
        }

        let port = match var("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT '{}' is not a port", raw))?,
            None => 8001,
        };

        let mail = match var("RESEND_API_KEY") {
            Some(api_key) => Some(MailConfig {
                api_key,
                sender: required("SENDER_EMAIL")?,
                recipient: required("ADMIN_EMAIL")?,
            }),
            None => None,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("DB_PATH").unwrap_or_else(|| "teamacy.db".into()).into(),
            admin: AdminSeed {
                name: var("ADMIN_NAME").unwrap_or_else(|| "Teamacy Admin".into()),
                email: required("ADMIN_LOGIN_EMAIL")?,
                password: required("ADMIN_PASSWORD")?,
            },
            jwt_secret,
            jwt_algorithm,
            jwt_expiration_hours,
            mail,
            cors_origins: parse_origins(&var("CORS_ORIGINS").unwrap_or_else(|| "*".into()))?,
        })
    }
}

/// Comma separated origins; `*` anywhere in the list allows every origin.
pub fn parse_origins(raw: &str) -> Result<CorsOrigins> {
    let entries: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if entries.is_empty() || entries.contains(&"*") {
        return Ok(CorsOrigins::Any);
    }

    let origins = entries
        .into_iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{}'", o)))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsOrigins::List(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("JWT_SECRET", "a-long-random-value"),
        ("ADMIN_LOGIN_EMAIL", "admin@teamacy.com"),
        ("ADMIN_PASSWORD", "pw"),
    ];

    #[test]
    fn defaults_fill_in_optional_settings() {
        let config = Config::from_lookup(lookup(MINIMAL)).unwrap();

        assert_eq!(config.port, 8001);
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.cors_origins, CorsOrigins::Any);
        assert_eq!(config.admin.name, "Teamacy Admin");
        assert!(config.mail.is_none());
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&MINIMAL[1..])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn placeholder_secret_is_fatal() {
        let mut pairs = MINIMAL.to_vec();
        pairs[0] = ("JWT_SECRET", "change-me");
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn mail_settings_require_sender_and_recipient() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("RESEND_API_KEY", "re_123"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("SENDER_EMAIL", "site@teamacy.com"));
        pairs.push(("ADMIN_EMAIL", "inbox@teamacy.com"));
        let mail = Config::from_lookup(lookup(&pairs)).unwrap().mail.unwrap();
        assert_eq!(mail.recipient, "inbox@teamacy.com");
    }

    #[test]
    fn jwt_settings_are_parsed() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("JWT_ALGORITHM", "HS512"));
        pairs.push(("JWT_EXPIRATION_HOURS", "2"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.jwt_expiration_hours, 2);

        pairs.push(("JWT_EXPIRATION_HOURS", "3000000000"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("JWT_EXPIRATION_HOURS", "soon"));
        // Later duplicates win in the lookup map.
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn origin_lists() {
        assert_eq!(parse_origins("*").unwrap(), CorsOrigins::Any);
        assert_eq!(parse_origins("").unwrap(), CorsOrigins::Any);
        assert_eq!(
            parse_origins("https://teamacy.com, http://localhost:3000").unwrap(),
            CorsOrigins::List(vec![
                HeaderValue::from_static("https://teamacy.com"),
                HeaderValue::from_static("http://localhost:3000"),
            ])
        );
    }
}
