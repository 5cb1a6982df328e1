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

//! Per-connection state owned by the transport host and consulted by the
//! message processor on every dispatch.

use std::sync::Mutex;

use uuid::Uuid;

use crate::ids::SessionId;

/// The connection-scoped context handed in with every inbound message.
/// Before the handshake completes it carries only the transport layer's own
/// client id; afterwards it remembers which session and realm the
/// connection is bound to. Messages for one connection are dispatched in
/// delivery order, so readers never race the bind/clear transitions.
pub struct ConnectionContext {
    client_id: Uuid,
    binding: Mutex<Option<SessionBinding>>,
}

#[derive(Clone)]
struct SessionBinding {
    session_id: SessionId,
    realm: String,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self {
            client_id: Uuid::new_v4(),
            binding: Mutex::new(None),
        }
    }

    /// The transport layer's identity for this connection, which exists
    /// before (and independently of) any session.
    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.binding.lock().unwrap().as_ref().map(|b| b.session_id)
    }

    pub fn realm(&self) -> Option<String> {
        self.binding.lock().unwrap().as_ref().map(|b| b.realm.clone())
    }

    /// Bind the connection to its newly-established session.
    pub fn bind(&self, session_id: SessionId, realm: String) {
        *self.binding.lock().unwrap() = Some(SessionBinding { session_id, realm });
    }

    /// Invoked on session termination; the connection reverts to its
    /// pre-handshake state.
    pub fn clear(&self) {
        *self.binding.lock().unwrap() = None;
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}
