use anyhow::Context;
use log::LevelFilter;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_JWT_SECRET: &str = "secret";

/// Account created at startup so a fresh database has someone who can
/// manage rooms.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub log_level: LevelFilter,
    /// `None` logs to stdout only.
    pub log_file: Option<PathBuf>,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> anyhow::Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://hostel.db".to_string()),
            port: parse_or(var("PORT"), "PORT", 5001)?,
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            jwt_ttl_hours: parse_or(var("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 24 * 7)?,
            bcrypt_cost: parse_or(var("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            log_level: parse_or(var("LOG_LEVEL"), "LOG_LEVEL", LevelFilter::Info)?,
            log_file: match lookup("LOG_FILE") {
                Some(path) if path.trim().is_empty() => None,
                Some(path) => Some(PathBuf::from(path)),
                None => Some(PathBuf::from("output.log")),
            },
            admin,
        })
    }

    /// Logs the effective settings. Call once the logger is installed.
    pub fn log_summary(&self) {
        log::info!(
            "config: database={} port={} log_level={} token_ttl={}h",
            self.database_url,
            self.port,
            self.log_level,
            self.jwt_ttl_hours
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            log::warn!("JWT_SECRET not set, signing tokens with the built-in default");
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid {} value \"{}\"", key, value)),
        None => Ok(default),
    }
}
