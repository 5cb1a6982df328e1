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

//! A mock peer for driving the message processor end to end: one connection
//! context plus a channel transport whose receiving end the test holds.

use std::time::Duration;

use weir_common::{
    ChannelTransport, ConnectionContext, Message, RoleSet, SessionId, Transport,
};

use crate::processor::MessageProcessor;

pub struct MockPeer {
    pub context: ConnectionContext,
    send: flume::Sender<Message>,
    pub incoming: flume::Receiver<Message>,
}

impl MockPeer {
    pub fn new() -> Self {
        let (send, incoming) = flume::unbounded();
        Self {
            context: ConnectionContext::new(),
            send,
            incoming,
        }
    }

    /// A fresh per-delivery transport handle, the way a host mints one for
    /// each dispatched message.
    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(ChannelTransport::new(self.send.clone()))
    }

    pub fn deliver(&self, processor: &MessageProcessor, message: Message) {
        processor.process(message, self.transport(), &self.context);
    }

    /// Handshake into a realm, asserting the welcome, and return the
    /// assigned session id.
    pub fn join(&self, processor: &MessageProcessor, realm: &str, roles: RoleSet) -> SessionId {
        self.deliver(
            processor,
            Message::Hello {
                realm: realm.to_string(),
                roles,
            },
        );
        match self.recv() {
            Message::Welcome { session_id } => session_id,
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    /// Next outbound message, which must already be waiting: routing is
    /// synchronous up to the channel hand-off.
    pub fn recv(&self) -> Message {
        self.incoming
            .recv_timeout(Duration::from_secs(1))
            .expect("expected an outbound message")
    }

    pub fn assert_silent(&self) {
        assert!(
            self.incoming.is_empty(),
            "unexpected outbound message: {:?}",
            self.incoming.try_recv()
        );
    }
}

impl Default for MockPeer {
    fn default() -> Self {
        Self::new()
    }
}
