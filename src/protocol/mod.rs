//! Protocol implementation module
//!
//! This module defines the ring protocol messages, their wire encoding,
//! the per-peer ring state and the engine that drives both roles.

pub mod codec;
pub mod engine;
pub mod message;
pub mod state;

pub use self::codec::{decode, encode, MessageCodec};
pub use self::engine::{EngineConfig, EngineInfo, Event, RingEngine};
pub use self::message::{Message, Op};
pub use self::state::RingState;
