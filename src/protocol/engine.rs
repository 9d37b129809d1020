use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use super::message::{Message, Op};
use super::state::RingState;
use crate::core::{DecodeError, PeerId, Role};
use crate::election::ElectionOracle;
use crate::util::unix_timestamp;

/// Immutable settings handed to the engine at construction
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Role fixed for the process lifetime
    pub role: Role,
    /// This peer's identity
    pub peer_id: PeerId,
    /// Announce / query period
    pub interval: Duration,
    /// Forget a holder not refreshed within this window
    pub holder_ttl: Option<Duration>,
}

/// Inputs to the engine, serialized through a single dispatch point
#[derive(Debug)]
pub enum Event {
    /// The periodic timer fired
    Tick,
    /// A message arrived from the group
    Inbound(Message),
    /// A datagram arrived that could not be decoded
    Rejected(DecodeError),
}

/// Snapshot of the engine for logging and inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub role: Role,
    pub peer_id: PeerId,
    pub holder: Option<PeerId>,
    pub last_updated: Option<u64>,
    /// Messages handed to the transport
    pub sent: u64,
    /// Decoded messages received
    pub received: u64,
    /// Datagrams dropped by the decoder
    pub rejected: u64,
    /// Elections that produced no candidate
    pub failed_elections: u64,
}

#[derive(Debug, Default)]
struct Counters {
    sent: u64,
    received: u64,
    rejected: u64,
    failed_elections: u64,
}

/// Ring coordination state machine for one peer
///
/// The engine owns the peer's [`RingState`]; every mutation happens inside
/// [`RingEngine::handle_event`], so callers must feed timer ticks and inbound
/// messages through one task.
pub struct RingEngine<O> {
    config: EngineConfig,
    ring: RingState,
    oracle: O,
    outbound: mpsc::Sender<Message>,
    counters: Counters,
}

impl<O: ElectionOracle> RingEngine<O> {
    /// Creates an engine with no known ring-holder
    pub fn new(config: EngineConfig, oracle: O, outbound: mpsc::Sender<Message>) -> Self {
        RingEngine {
            config,
            ring: RingState::new(),
            oracle,
            outbound,
            counters: Counters::default(),
        }
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.config.peer_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ring_state(&self) -> &RingState {
        &self.ring
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            role: self.config.role,
            peer_id: self.config.peer_id.clone(),
            holder: self.ring.holder().cloned(),
            last_updated: self.ring.last_updated(),
            sent: self.counters.sent,
            received: self.counters.received,
            rejected: self.counters.rejected,
            failed_elections: self.counters.failed_elections,
        }
    }

    /// Dispatches one event; failures are logged and never escape
    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Tick => self.on_tick().await,
            Event::Inbound(message) => self.on_message(message).await,
            Event::Rejected(err) => self.on_rejected(err),
        }
    }

    /// Periodic work: the coordinator elects, a branch queries
    pub async fn on_tick(&mut self) {
        self.tick_at(unix_timestamp()).await
    }

    /// Reacts to a message received from the group
    pub async fn on_message(&mut self, message: Message) {
        self.message_at(message, unix_timestamp()).await
    }

    async fn tick_at(&mut self, now: u64) {
        match self.config.role {
            Role::Coordinator => self.announce(now).await,
            Role::Branch => {
                self.expire_holder(now);
                let query = Message::query(self.config.peer_id.clone());
                self.send(query);
            }
        }
    }

    async fn message_at(&mut self, message: Message, now: u64) {
        self.counters.received += 1;
        info!(
            peer = %self.config.peer_id,
            sender = %message.sender(),
            op = %message.op(),
            holder = ?message.ring_holder().map(PeerId::as_str),
            ts = message.timestamp(),
            "RECEIVED"
        );

        match (self.config.role, message.op()) {
            (Role::Coordinator, Op::Query) => self.announce(now).await,
            (Role::Branch, Op::Announce) => {
                if let Some(holder) = message.ring_holder() {
                    self.adopt(holder.clone(), now).await;
                }
            }
            _ => debug!(peer = %self.config.peer_id, op = %message.op(), "no action"),
        }
    }

    fn on_rejected(&mut self, err: DecodeError) {
        self.counters.rejected += 1;
        warn!(peer = %self.config.peer_id, error = %err, "dropping undecodable message");
    }

    /// Runs an election and broadcasts the result
    async fn announce(&mut self, now: u64) {
        let candidate = match self.oracle.select() {
            Ok(candidate) => candidate,
            Err(err) => {
                self.counters.failed_elections += 1;
                error!(peer = %self.config.peer_id, error = %err, "ring-holder not found");
                return;
            }
        };

        if self.ring.record(candidate.clone(), now) {
            info!(peer = %self.config.peer_id, holder = %candidate, "elected new ring-holder");
        }
        let announce = Message::announce(self.config.peer_id.clone(), candidate);
        self.send(announce);
    }

    /// Applies an announcement on a branch, accepting the token when it names us
    async fn adopt(&mut self, holder: PeerId, now: u64) {
        if holder == self.config.peer_id {
            if self.ring.record(holder, now) {
                info!(peer = %self.config.peer_id, "accepting the ring");
            }
            let switch = Message::switch(self.config.peer_id.clone());
            self.send(switch);
        } else if self.ring.record(holder.clone(), now) {
            info!(peer = %self.config.peer_id, holder = %holder, "ring-holder changed");
        }
    }

    fn expire_holder(&mut self, now: u64) {
        let Some(ttl) = self.config.holder_ttl else {
            return;
        };
        if self.ring.is_stale(ttl, now) {
            if let Some(stale) = self.ring.clear() {
                warn!(
                    peer = %self.config.peer_id,
                    holder = %stale,
                    ttl_secs = ttl.as_secs(),
                    "ring-holder went silent, forgetting it"
                );
            }
        }
    }

    /// Hands a message to the transport without waiting for queue space
    fn send(&mut self, message: Message) {
        let op = message.op();
        match self.outbound.try_send(message) {
            Ok(()) => {
                self.counters.sent += 1;
                info!(peer = %self.config.peer_id, op = %op, "SENDING");
            }
            Err(TrySendError::Full(_)) => {
                warn!(peer = %self.config.peer_id, op = %op, "outbound queue full, message dropped")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(peer = %self.config.peer_id, op = %op, "transport closed, message dropped")
            }
        }
    }
}
