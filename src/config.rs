use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{configuration_error, Error};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub identity_api_base: String,
    pub identity_api_key: String,
    pub identity_timeout: Duration,
    pub transaction_timeout: Duration,
    pub lock_timeout: Duration,
    pub notification_timeout: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one is present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            listen_addr: parse_or("LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            identity_api_base: env::var("IDENTITY_API_BASE")?,
            identity_api_key: env::var("IDENTITY_API_KEY")?,
            identity_timeout: millis_or("IDENTITY_TIMEOUT_MS", 5_000)?,
            transaction_timeout: millis_or("TRANSACTION_TIMEOUT_MS", 10_000)?,
            lock_timeout: millis_or("LOCK_TIMEOUT_MS", 5_000)?,
            notification_timeout: millis_or("NOTIFICATION_TIMEOUT_MS", 3_000)?,
        })
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| configuration_error(format!("{} is not valid: {:?}", name, value))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err.into()),
    }
}

fn millis_or(name: &str, default: u64) -> Result<Duration, Error> {
    parse_or(name, default).map(Duration::from_millis)
}
