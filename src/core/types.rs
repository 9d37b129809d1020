use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};
use crate::protocol::EngineConfig;

/// Identity of a peer in the group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Generates a random peer id
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        PeerId(format!("peer-{:08x}", rng.gen::<u32>()))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        PeerId(id.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        PeerId(id)
    }
}

/// Role a peer plays for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs elections and announces the ring-holder
    Coordinator,
    /// Queries for and reacts to announcements
    Branch,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => f.write_str("coordinator"),
            Role::Branch => f.write_str("branch"),
        }
    }
}

/// Configuration for a ring0 peer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// This peer's identity
    pub peer_id: PeerId,
    /// Identity of the designated coordinator
    pub coordinator: PeerId,
    /// Multicast group the peers share
    pub group_addr: Ipv4Addr,
    /// UDP port bound by every peer
    pub port: u16,
    /// Local interface used for group membership
    pub interface: Ipv4Addr,
    /// Announce / query period
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub interval: Duration,
    /// Forget the ring-holder after this long without an update
    #[serde(serialize_with = "super::serde::serialize_opt_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_opt_duration")]
    pub holder_ttl: Option<Duration>,
    /// Candidates offered to the random election oracle
    pub members: Vec<PeerId>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            peer_id: PeerId::random(),
            coordinator: PeerId::from(super::DEFAULT_COORDINATOR),
            group_addr: super::DEFAULT_GROUP_ADDR,
            port: super::DEFAULT_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            interval: super::DEFAULT_INTERVAL,
            holder_ttl: None,
            members: super::DEFAULT_MEMBERS
                .iter()
                .copied()
                .map(PeerId::from)
                .collect(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| Error::config(format!("Failed to load {}: {}", path.display(), e)))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Role derived from comparing this peer with the coordinator name
    pub fn role(&self) -> Role {
        if self.peer_id == self.coordinator {
            Role::Coordinator
        } else {
            Role::Branch
        }
    }

    /// Multicast destination for outbound messages
    pub fn group_socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group_addr, self.port))
    }

    /// Immutable engine settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            role: self.role(),
            peer_id: self.peer_id.clone(),
            interval: self.interval,
            holder_ttl: self.holder_ttl,
        }
    }

    /// Checks the values a running peer depends on
    pub fn validate(&self) -> Result<()> {
        if self.peer_id.as_str().is_empty() {
            return Err(Error::config("peer id must not be empty"));
        }
        if self.interval.is_zero() {
            return Err(Error::config("interval must be greater than zero"));
        }
        if !self.group_addr.is_multicast() {
            return Err(Error::config(format!(
                "{} is not a multicast address",
                self.group_addr
            )));
        }
        if self.holder_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(Error::config("holder ttl must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio_test::assert_ok;

    #[test]
    fn test_peer_id_random() {
        let id1 = PeerId::random();
        let id2 = PeerId::random();
        assert!(id1.as_str().starts_with("peer-"));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_peer_id_serializes_as_plain_string() {
        let id = PeerId::from("gotham");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""gotham""#);
        assert_eq!(id.to_string(), "gotham");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.group_addr, Ipv4Addr::new(239, 255, 0, 255));
        assert_eq!(config.port, 9001);
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.coordinator, PeerId::from("frodo"));
        assert_eq!(config.members.len(), 4);
        assert!(config.holder_ttl.is_none());
        assert_ok!(config.validate());
        assert_eq!(
            config.group_socket_addr(),
            "239.255.0.255:9001".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_role_derivation() {
        let mut config = Config {
            peer_id: PeerId::from("frodo"),
            ..Default::default()
        };
        assert_eq!(config.role(), Role::Coordinator);

        config.peer_id = PeerId::from("gotham");
        assert_eq!(config.role(), Role::Branch);

        let engine = config.engine_config();
        assert_eq!(engine.role, Role::Branch);
        assert_eq!(engine.peer_id, PeerId::from("gotham"));
        assert_eq!(engine.interval, config.interval);
    }

    #[test]
    fn test_validation() {
        let config = Config {
            peer_id: PeerId::from(""),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            group_addr: Ipv4Addr::new(10, 0, 0, 1),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            holder_ttl: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ring0-{}.toml", PeerId::random()));
        fs::write(
            &path,
            r#"
peer_id = "gotham"
port = 9100
interval = 2.5
holder_ttl = 60
members = ["gotham", "metropolis"]
"#,
        )
        .unwrap();

        let config = assert_ok!(Config::load(&path));
        fs::remove_file(&path).unwrap();

        assert_eq!(config.peer_id, PeerId::from("gotham"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.holder_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.members, vec![PeerId::from("gotham"), PeerId::from("metropolis")]);
        // untouched keys keep their defaults
        assert_eq!(config.coordinator, PeerId::from("frodo"));
        assert_eq!(config.group_addr, Ipv4Addr::new(239, 255, 0, 255));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("ring0-does-not-exist.toml");
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }
}
