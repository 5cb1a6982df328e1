// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The outbound half of a connection, as seen by the routing core.

use crate::errors::TransportError;
use crate::messages::Message;

/// A handle for delivering messages to one connected peer. Delivery is an
/// asynchronous hand-off: `send` queues the message for the connection's
/// writer and must never block on network I/O, since it is routinely called
/// with a realm lock held.
///
/// The handle supplied with a successful handshake is claimed by the new
/// session, which thereafter has exclusive write access; handles supplied
/// with later messages are per-delivery and dropped after dispatch.
/// Delivery of an `Abort`, or of the router's final `Goodbye` echo, tells
/// the host to flush and close the connection.
pub trait Transport: Send {
    fn send(&self, message: Message) -> Result<(), TransportError>;
}

/// A `Transport` backed by an unbounded channel: the reference hand-off
/// between the routing core and a connection's writer task. Dropping the
/// last handle disconnects the receiver, which is how a channel-backed host
/// observes that the core is done with the connection.
pub struct ChannelTransport {
    send: flume::Sender<Message>,
}

impl ChannelTransport {
    pub fn new(send: flume::Sender<Message>) -> Self {
        Self { send }
    }

    /// A connected transport/receiver pair.
    pub fn pair() -> (Self, flume::Receiver<Message>) {
        let (send, recv) = flume::unbounded();
        (Self { send }, recv)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: Message) -> Result<(), TransportError> {
        self.send.send(message).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GOODBYE_AND_OUT;

    #[test]
    fn channel_transport_hands_off_and_reports_closure() {
        let (transport, recv) = ChannelTransport::pair();
        transport
            .send(Message::Goodbye {
                reason: GOODBYE_AND_OUT.to_string(),
            })
            .unwrap();
        assert_eq!(recv.try_recv().unwrap().kind(), "goodbye");

        drop(recv);
        let err = transport
            .send(Message::Goodbye {
                reason: GOODBYE_AND_OUT.to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
