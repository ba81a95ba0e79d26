use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub session_idle_minutes: i64,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:studygroup.db".to_owned()),
            bind_addr: parse_var("BIND_ADDR", "0.0.0.0:8080")?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "16")?,
            session_idle_minutes: parse_var("SESSION_IDLE_MINUTES", "60")?,
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| default.to_owned());
    raw.parse()
        .with_context(|| format!("{key}: invalid value {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        let port: u32 = parse_var("STUDYGROUP_TEST_UNSET_VAR", "42").unwrap();
        assert_eq!(port, 42);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        let err = parse_var::<SocketAddr>("STUDYGROUP_TEST_UNSET_VAR", "not an address").unwrap_err();
        assert!(err.to_string().contains("STUDYGROUP_TEST_UNSET_VAR"));
    }
}
