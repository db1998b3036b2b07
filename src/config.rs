use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

/// One year.
pub const MAX_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Who may modify a user record once a token has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any valid token may update or delete any user.
    Any,
    /// The token subject must be the targeted user.
    SelfOnly,
}

impl FromStr for AccessPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(AccessPolicy::Any),
            "self" => Ok(AccessPolicy::SelfOnly),
            other => Err(anyhow!("unknown ACCESS_POLICY {other:?} (expected \"any\" or \"self\")")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub access_policy: AccessPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "accounts".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "accounts-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
        };
        if !(1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}");
        }

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(v) => v.parse::<u16>().with_context(|| format!("invalid port {v:?}"))?,
            None => 3000,
        };

        let access_policy = match lookup("ACCESS_POLICY") {
            Some(v) => v.parse()?,
            None => AccessPolicy::Any,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            access_policy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v
            .parse::<T>()
            .map_err(|e| anyhow!("invalid {key} {v:?}: {e}")),
        None => Ok(default),
    }
}
