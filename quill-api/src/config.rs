//! Environment configuration. Every key has a default, so an empty
//! environment yields a working local setup.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_test_database_url")]
    pub test_database_url: String,
    #[serde(default = "default_server_address")]
    pub server_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default)]
    pub node_id: u16,
}

fn default_database_url() -> String {
    "postgres://localhost/blog-app".to_owned()
}

fn default_test_database_url() -> String {
    "postgres://localhost/test-blog-app".to_owned()
}

fn default_server_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, StoreKind};
    use std::net::{IpAddr, Ipv4Addr};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/blog-app");
        assert_eq!(config.test_database_url, "postgres://localhost/test-blog-app");
        assert_eq!(config.server_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.node_id, 0);
    }

    #[test]
    fn overrides() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/blog"),
            ("TEST_DATABASE_URL", "postgres://db/test"),
            ("SERVER_ADDRESS", "127.0.0.1"),
            ("PORT", "3000"),
            ("STORE", "memory"),
            ("NODE_ID", "12"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db/blog");
        assert_eq!(config.test_database_url, "postgres://db/test");
        assert_eq!(config.server_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.node_id, 12);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Config::from_vars(vars(&[("PORT", "eighty")])).is_err());
    }
}
