//! ring0: multicast ring-holder coordination
//!
//! A flat group of peers shares one logical token. A single coordinator
//! periodically elects a ring-holder and announces it over UDP multicast;
//! every other peer (a branch) queries for the holder and acknowledges the
//! token when the announcement names it.
pub mod core;
pub mod election;
pub mod network;
pub mod protocol;
mod util;

// Re-export commonly used items
pub use crate::core::{Config, DecodeError, Error, PeerId, Result, Role};
pub use crate::election::{ElectionOracle, RandomOracle, StaticOracle};
pub use crate::network::Node;
pub use crate::protocol::{Event, Message, Op, RingEngine, RingState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
