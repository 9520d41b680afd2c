//! OSC (Open Sound Control) transport client.
//!
//! The workstation's control surface speaks OSC over UDP: one datagram
//! per message, fire-and-forget, no delivery guarantee. This module
//! provides the outbound half; inbound feedback is handled by
//! [`crate::listener`].

use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;
use std::sync::Arc;

use crate::error::Result;

/// UDP-based OSC client for sending commands to the workstation.
#[derive(Clone)]
pub struct OscClient {
    /// The underlying UDP socket (None in noop mode).
    sock: Option<Arc<UdpSocket>>,
    /// Target address in "host:port" format.
    pub addr: String,
}

impl OscClient {
    /// Create a new OSC client targeting the given address.
    ///
    /// # Arguments
    /// * `addr` - The target address in "host:port" format (e.g., "127.0.0.1:3819")
    ///
    /// # Returns
    /// A new client bound to an ephemeral port.
    pub fn new<A: Into<String>>(addr: A) -> Result<Self> {
        let sock = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            sock: Some(Arc::new(sock)),
            addr: addr.into(),
        })
    }

    /// Create a no-op OSC client.
    ///
    /// All send operations succeed but nothing leaves the process.
    /// Useful for tests and for running the state layer without a
    /// workstation on the other end.
    pub fn noop() -> Self {
        Self {
            sock: None,
            addr: "noop".to_string(),
        }
    }

    /// Check if this client is in noop mode.
    pub fn is_noop(&self) -> bool {
        self.sock.is_none()
    }

    /// Send an OSC message with the given address path and arguments.
    ///
    /// Fails only on local transmission problems (encoding, socket);
    /// there is no acknowledgement from the far side.
    pub fn send_msg(&self, path: &str, args: Vec<OscType>) -> Result<()> {
        let sock = match &self.sock {
            Some(s) => s,
            None => return Ok(()), // noop mode
        };
        let msg = OscMessage {
            addr: path.into(),
            args,
        };
        let packet = OscPacket::Message(msg);
        let buf = encoder::encode(&packet)?;
        sock.send_to(&buf, &self.addr)?;
        Ok(())
    }

    /// Create an OSC message packet.
    pub fn msg(path: &str, args: Vec<OscType>) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: path.into(),
            args,
        })
    }
}

impl std::fmt::Debug for OscClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscClient")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc_client_creation() {
        // Just test that we can create a client (won't actually connect)
        let client = OscClient::new("127.0.0.1:3819");
        assert!(client.is_ok());
    }

    #[test]
    fn test_noop_send() {
        let client = OscClient::noop();
        assert!(client.is_noop());
        assert!(client.send_msg("/transport_play", vec![]).is_ok());
    }

    #[test]
    fn test_msg_helper() {
        let packet = OscClient::msg("/strip/mute", vec![OscType::Int(2), OscType::Int(1)]);
        if let OscPacket::Message(msg) = packet {
            assert_eq!(msg.addr, "/strip/mute");
            assert_eq!(msg.args.len(), 2);
        } else {
            panic!("Expected message packet");
        }
    }
}
