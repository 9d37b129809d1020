//! Core types and traits for ring0
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

use std::net::Ipv4Addr;
use std::time::Duration;

pub use self::error::{DecodeError, Error, Result};
pub use self::types::{Config, PeerId, Role};

/// Default multicast group shared by all peers
pub const DEFAULT_GROUP_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 0, 255);

/// Default UDP port for the ring protocol
pub const DEFAULT_PORT: u16 = 9001;

/// Default announce / query period
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Conventional name of the coordinator peer
pub const DEFAULT_COORDINATOR: &str = "frodo";

/// Candidate list used when no membership source is configured
pub const DEFAULT_MEMBERS: &[&str] = &["frodo", "gotham", "springfield", "metropolis"];
