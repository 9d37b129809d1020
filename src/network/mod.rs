//! Network management and event loop
//!
//! This module owns the multicast transport and the single task that feeds
//! timer ticks and inbound messages to the protocol engine.

mod connection;

pub use self::connection::{bind_multicast, Connection};

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::{Config, Error, Result};
use crate::election::ElectionOracle;
use crate::protocol::{Event, Message, RingEngine};

/// Capacity of the engine's event queue
const EVENT_QUEUE: usize = 128;

/// Capacity of the outbound message queue
const OUTBOUND_QUEUE: usize = 32;

/// A peer bound to the group and ready to run
pub struct Node<O> {
    engine: RingEngine<O>,
    connection: Connection,
    outbound_rx: mpsc::Receiver<Message>,
}

impl<O: ElectionOracle> Node<O> {
    /// Validates `config` and joins the group; failures here are fatal
    pub fn bind(config: &Config, oracle: O) -> Result<Self> {
        config.validate()?;
        let connection = Connection::bind(config)?;
        Ok(Node::with_connection(config, oracle, connection))
    }

    /// Builds a node around an existing transport
    pub fn with_connection(config: &Config, oracle: O, connection: Connection) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let engine = RingEngine::new(config.engine_config(), oracle, outbound_tx);
        Node {
            engine,
            connection,
            outbound_rx,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.connection.local_addr()
    }

    /// Runs the timer, the transport and the engine until `shutdown` fires
    pub async fn run(self, shutdown: broadcast::Sender<()>) -> Result<RingEngine<O>> {
        let Node {
            engine,
            connection,
            outbound_rx,
        } = self;

        info!(
            peer = %engine.peer_id(),
            role = %engine.role(),
            interval_secs = engine.config().interval.as_secs_f64(),
            "ring0 node starting"
        );

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);

        let timer = tokio::spawn(run_timer(
            engine.config().interval,
            events_tx.clone(),
            shutdown.subscribe(),
        ));
        let transport = tokio::spawn(connection.run(events_tx, outbound_rx, shutdown.subscribe()));

        let engine = run_engine(engine, events_rx, shutdown.subscribe()).await;

        // The engine only stops on shutdown or when every producer is gone;
        // make sure the producers follow it down either way.
        let _ = shutdown.send(());
        timer
            .await
            .map_err(|e| Error::network(format!("Timer task failed: {}", e)))?;
        transport
            .await
            .map_err(|e| Error::network(format!("Transport task failed: {}", e)))??;

        info!(info = ?engine.info(), "ring0 node stopped");
        Ok(engine)
    }
}

/// Emits [`Event::Tick`] once immediately and then every `period`
pub async fn run_timer(
    period: Duration,
    events: mpsc::Sender<Event>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                if events.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("timer stopped");
}

/// Serializes every event through one engine, returning it on shutdown
pub async fn run_engine<O: ElectionOracle>(
    mut engine: RingEngine<O>,
    mut events: mpsc::Receiver<Event>,
    mut shutdown: broadcast::Receiver<()>,
) -> RingEngine<O> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            event = events.recv() => match event {
                Some(event) => engine.handle_event(event).await,
                None => break,
            },
        }
    }
    engine
}
