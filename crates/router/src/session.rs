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

//! A handshake-completed peer and its exclusively-owned outbound transport.

use std::sync::Mutex;

use tracing::warn;
use weir_common::{Message, RoleSet, SessionId, Transport};

/// One connected, handshake-completed peer. Identity, realm, and declared
/// roles are fixed at construction (a role change means a new session),
/// and the session is constructed in a single step so no partially
/// initialized session is ever visible to the router. The session is the
/// only component allowed to write to its transport.
pub struct Session {
    id: SessionId,
    realm: String,
    roles: RoleSet,
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl Session {
    pub fn new(
        id: SessionId,
        realm: String,
        roles: RoleSet,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            id,
            realm,
            roles,
            transport: Mutex::new(Some(transport)),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    /// Hand a message to the transport for delivery. A silent no-op once
    /// the transport has been released; a delivery failure is logged rather
    /// than propagated, since the routing tables have already moved on.
    pub fn send(&self, message: Message) {
        let transport = self.transport.lock().unwrap();
        let Some(transport) = transport.as_ref() else {
            return;
        };
        if let Err(e) = transport.send(message) {
            warn!(session_id = ?self.id, "could not deliver message: {e}");
        }
    }

    /// Release the transport; subsequent sends become no-ops. Dropping the
    /// handle is what lets a channel-backed host observe, on every exit
    /// path, that the core is done with the connection.
    pub fn release_transport(&self) {
        self.transport.lock().unwrap().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_common::ChannelTransport;

    #[test]
    fn send_after_release_is_a_no_op() {
        let (transport, recv) = ChannelTransport::pair();
        let session = Session::new(
            SessionId(1),
            "library".to_string(),
            RoleSet::all(),
            Box::new(transport),
        );

        session.send(Message::Welcome {
            session_id: SessionId(1),
        });
        assert_eq!(recv.try_recv().unwrap().kind(), "welcome");

        session.release_transport();
        session.send(Message::Welcome {
            session_id: SessionId(1),
        });
        // The channel is disconnected, not merely empty: the handle is gone.
        assert!(recv.try_recv().is_err());
    }
}
