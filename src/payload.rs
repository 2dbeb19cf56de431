//! Opaque payloads and the commands queued to a connection's writer.
//!
//! DESIGN
//! ======
//! The relay never looks inside a payload. Text and binary frames are kept
//! as the reference-counted buffers axum hands us, so fanning one payload out
//! to N peers clones a pointer, not the bytes.

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};

/// One application payload exactly as it arrived on the sender's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(Utf8Bytes),
    Binary(Bytes),
}

impl Payload {
    /// Extract an application payload from a websocket message.
    ///
    /// Control frames (ping, pong, close) are not payloads and yield `None`.
    #[must_use]
    pub fn from_message(msg: Message) -> Option<Self> {
        match msg {
            Message::Text(text) => Some(Self::Text(text)),
            Message::Binary(bytes) => Some(Self::Binary(bytes)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Payload> for Message {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Text(text) => Self::Text(text),
            Payload::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

/// Work item for a connection's writer half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Forward a peer's payload unchanged.
    Payload(Payload),
    /// Send a protocol-level ping. The pong comes back on the read side.
    Probe,
}

impl From<Outbound> for Message {
    fn from(outbound: Outbound) -> Self {
        match outbound {
            Outbound::Payload(payload) => payload.into(),
            Outbound::Probe => Self::Ping(Bytes::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_binary_are_payloads() {
        let text = Payload::from_message(Message::Text("hello".into()));
        assert_eq!(text, Some(Payload::Text("hello".into())));

        let bin = Payload::from_message(Message::Binary(Bytes::from_static(&[0, 159, 146, 150])));
        assert_eq!(bin, Some(Payload::Binary(Bytes::from_static(&[0, 159, 146, 150]))));
    }

    #[test]
    fn control_frames_are_not_payloads() {
        assert!(Payload::from_message(Message::Ping(Bytes::new())).is_none());
        assert!(Payload::from_message(Message::Pong(Bytes::new())).is_none());
        assert!(Payload::from_message(Message::Close(None)).is_none());
    }

    #[test]
    fn malformed_json_is_still_a_payload() {
        let raw = r#"{"name": "ann", "message": "#;
        let payload = Payload::from_message(Message::Text(raw.into())).expect("text is a payload");
        assert_eq!(Message::from(payload), Message::Text(raw.into()));
    }

    #[test]
    fn probe_becomes_empty_ping() {
        assert_eq!(Message::from(Outbound::Probe), Message::Ping(Bytes::new()));
    }

    #[test]
    fn payload_len_counts_bytes() {
        assert_eq!(Payload::Text("héllo".into()).len(), 6);
        assert!(Payload::Binary(Bytes::new()).is_empty());
    }
}
