use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use futures::{SinkExt, StreamExt};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};
use tokio_util::udp::UdpFramed;
use tracing::{debug, info, warn};

use crate::core::{Config, Error, Result};
use crate::protocol::{Event, Message, MessageCodec};

/// Binds the shared port and joins the configured multicast group
pub fn bind_multicast(config: &Config) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port);
    socket
        .bind(&bind_addr.into())
        .map_err(|e| Error::network(format!("Failed to bind {}: {}", bind_addr, e)))?;
    socket
        .join_multicast_v4(&config.group_addr, &config.interface)
        .map_err(|e| {
            Error::network(format!(
                "Failed to join {} on {}: {}",
                config.group_addr, config.interface, e
            ))
        })?;
    socket.set_multicast_loop_v4(true)?;

    let socket = UdpSocket::from_std(socket.into())?;
    Ok(socket)
}

/// Datagram transport between the engine and the group
pub struct Connection {
    framed: UdpFramed<MessageCodec>,
    group: SocketAddr,
}

impl Connection {
    /// Binds a multicast socket for `config`
    pub fn bind(config: &Config) -> Result<Self> {
        let socket = bind_multicast(config)?;
        Ok(Connection::from_socket(socket, config.group_socket_addr()))
    }

    /// Wraps an already bound socket; outbound messages go to `group`
    pub fn from_socket(socket: UdpSocket, group: SocketAddr) -> Self {
        Connection {
            framed: UdpFramed::new(socket, MessageCodec::new()),
            group,
        }
    }

    /// Returns the local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.framed
            .get_ref()
            .local_addr()
            .map_err(|e| Error::network(format!("Failed to get local address: {}", e)))
    }

    /// Moves datagrams until shutdown
    ///
    /// Decoded messages and decode failures both become engine events; send
    /// and receive errors are logged and the loop carries on.
    pub async fn run(
        mut self,
        events: mpsc::Sender<Event>,
        mut outbound: mpsc::Receiver<Message>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!(group = %self.group, local = ?self.local_addr().ok(), "transport running");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,

                Some(message) = outbound.recv() => {
                    let op = message.op();
                    if let Err(e) = self.framed.send((message, self.group)).await {
                        warn!(op = %op, error = %e, "send failed");
                    }
                }

                frame = self.framed.next() => {
                    let event = match frame {
                        Some(Ok((message, from))) => {
                            debug!(from = %from, op = %message.op(), "datagram");
                            Event::Inbound(message)
                        }
                        Some(Err(Error::Decode(e))) => Event::Rejected(e),
                        Some(Err(e)) => {
                            warn!(error = %e, "receive failed");
                            continue;
                        }
                        None => break,
                    };
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("transport stopped");
        Ok(())
    }
}
