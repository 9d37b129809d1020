use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{Message, Op};
use crate::core::{DecodeError, Error, PeerId, Result};

/// JSON shape of an outbound message
#[derive(Serialize)]
struct OutboundFrame<'a> {
    sender: &'a PeerId,
    op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rh: Option<&'a PeerId>,
    ts: u64,
}

/// JSON shape of an inbound message, before validation
#[derive(Deserialize)]
struct InboundFrame {
    sender: PeerId,
    op: String,
    #[serde(default)]
    rh: Option<PeerId>,
    ts: u64,
}

impl<'a> From<&'a Message> for OutboundFrame<'a> {
    fn from(message: &'a Message) -> Self {
        OutboundFrame {
            sender: message.sender(),
            op: message.op().wire_name(),
            rh: message.ring_holder(),
            ts: message.timestamp(),
        }
    }
}

/// Serializes a message into a datagram payload
pub fn encode(message: &Message) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    MessageCodec.encode(message.clone(), &mut dst)?;
    Ok(dst.freeze())
}

/// Parses a datagram payload into a validated message
pub fn decode(payload: &[u8]) -> std::result::Result<Message, DecodeError> {
    let frame: InboundFrame = serde_json::from_slice(payload)?;
    let op = Op::from_wire(&frame.op)?;
    Message::new(frame.sender, op, frame.rh, frame.ts)
}

/// Datagram codec: every datagram carries exactly one message
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Creates a new message codec
    pub fn new() -> Self {
        MessageCodec
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        // Consume the whole datagram up front so a rejected payload is not
        // seen again on the next poll.
        let datagram = src.split();
        Ok(Some(decode(&datagram)?))
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        serde_json::to_writer(dst.writer(), &OutboundFrame::from(&item))
            .map_err(|e| Error::protocol(format!("Failed to serialize message: {}", e)))
    }
}
