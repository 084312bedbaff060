use anyhow::anyhow;
use std::{env, net::SocketAddr};

use crate::types::RoleId;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ROLE_IDS: &str = "1,2,3";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Role identifiers the `exists` check accepts.
    pub known_role_ids: Vec<RoleId>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_value = lookup("APP_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_value
            .parse()
            .map_err(|_| anyhow!("Invalid APP_ADDR value: {}", addr_value))?;

        let role_ids_value =
            lookup("KNOWN_ROLE_IDS").unwrap_or_else(|| DEFAULT_ROLE_IDS.to_string());
        let known_role_ids = parse_role_ids(&role_ids_value)?;

        Ok(Config {
            addr,
            known_role_ids,
        })
    }
}

fn parse_role_ids(value: &str) -> anyhow::Result<Vec<RoleId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .map(RoleId)
                .ok_or_else(|| anyhow!("Invalid KNOWN_ROLE_IDS entry: {}", part))
        })
        .collect()
}
