use std::fmt;

use crate::core::{DecodeError, PeerId};
use crate::util::unix_timestamp;

/// Protocol operations exchanged between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Declares who holds the token (`rh-tell`)
    Announce,
    /// Asks the coordinator for an immediate announcement (`rh-query`)
    Query,
    /// Acknowledges that the sender accepted the token (`rh-switch`)
    Switch,
}

impl Op {
    /// Tag used for this op on the wire
    pub const fn wire_name(self) -> &'static str {
        match self {
            Op::Announce => "rh-tell",
            Op::Query => "rh-query",
            Op::Switch => "rh-switch",
        }
    }

    /// Parses a wire tag
    pub fn from_wire(tag: &str) -> Result<Self, DecodeError> {
        match tag {
            "rh-tell" => Ok(Op::Announce),
            "rh-query" => Ok(Op::Query),
            "rh-switch" => Ok(Op::Switch),
            other => Err(DecodeError::UnknownOp(other.to_owned())),
        }
    }

    /// Whether messages with this op name a ring-holder
    pub const fn carries_ring_holder(self) -> bool {
        matches!(self, Op::Announce | Op::Switch)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A single protocol message
///
/// The ring-holder is present exactly when the op is [`Op::Announce`] or
/// [`Op::Switch`]; every constructor upholds this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: PeerId,
    op: Op,
    ring_holder: Option<PeerId>,
    timestamp: u64,
}

impl Message {
    /// Builds a message from its parts, checking the ring-holder invariant
    pub fn new(
        sender: PeerId,
        op: Op,
        ring_holder: Option<PeerId>,
        timestamp: u64,
    ) -> Result<Self, DecodeError> {
        match (op.carries_ring_holder(), ring_holder.is_some()) {
            (true, false) => Err(DecodeError::MissingRingHolder(op)),
            (false, true) => Err(DecodeError::UnexpectedRingHolder(op)),
            _ => Ok(Message {
                sender,
                op,
                ring_holder,
                timestamp,
            }),
        }
    }

    /// Announces `holder` as the ring-holder
    pub fn announce(sender: PeerId, holder: PeerId) -> Self {
        Message {
            sender,
            op: Op::Announce,
            ring_holder: Some(holder),
            timestamp: unix_timestamp(),
        }
    }

    /// Asks who holds the ring
    pub fn query(sender: PeerId) -> Self {
        Message {
            sender,
            op: Op::Query,
            ring_holder: None,
            timestamp: unix_timestamp(),
        }
    }

    /// Accepts the token on behalf of the sender
    pub fn switch(sender: PeerId) -> Self {
        Message {
            ring_holder: Some(sender.clone()),
            sender,
            op: Op::Switch,
            timestamp: unix_timestamp(),
        }
    }

    pub fn sender(&self) -> &PeerId {
        &self.sender
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn ring_holder(&self) -> Option<&PeerId> {
        self.ring_holder.as_ref()
    }

    /// Production time in seconds since the epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let announce = Message::announce("frodo".into(), "gotham".into());
        assert_eq!(announce.op(), Op::Announce);
        assert_eq!(announce.sender(), &PeerId::from("frodo"));
        assert_eq!(announce.ring_holder(), Some(&PeerId::from("gotham")));
        assert!(announce.timestamp() > 0);

        let query = Message::query("gotham".into());
        assert_eq!(query.op(), Op::Query);
        assert!(query.ring_holder().is_none());

        let switch = Message::switch("gotham".into());
        assert_eq!(switch.op(), Op::Switch);
        assert_eq!(switch.ring_holder(), Some(switch.sender()));
    }

    #[test]
    fn test_ring_holder_invariant() {
        let err = Message::new("frodo".into(), Op::Announce, None, 1).unwrap_err();
        assert!(matches!(err, DecodeError::MissingRingHolder(Op::Announce)));

        let err = Message::new("gotham".into(), Op::Switch, None, 1).unwrap_err();
        assert!(matches!(err, DecodeError::MissingRingHolder(Op::Switch)));

        let err = Message::new("gotham".into(), Op::Query, Some("frodo".into()), 1).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedRingHolder(Op::Query)));

        let ok = Message::new("gotham".into(), Op::Query, None, 1).unwrap();
        assert_eq!(ok.timestamp(), 1);
    }

    #[test]
    fn test_op_wire_names() {
        for op in [Op::Announce, Op::Query, Op::Switch] {
            assert_eq!(Op::from_wire(op.wire_name()).unwrap(), op);
        }
        assert!(matches!(
            Op::from_wire("rha"),
            Err(DecodeError::UnknownOp(tag)) if tag == "rha"
        ));
    }
}
