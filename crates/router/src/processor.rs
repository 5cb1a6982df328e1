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

//! Classifies inbound messages, validates them against connection state,
//! and delegates to the realm's router. The one entry point transport hosts
//! drive for message traffic.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use weir_common::{
    ConnectionContext, InvocationId, Message, RequestType, RoleSet, RouterError, Transport,
};

use crate::registry::RouterRegistry;

/// Dispatches decoded messages into the routing core. Outcomes are
/// expressed purely as outbound messages and connection-context mutations;
/// `process` itself returns nothing.
pub struct MessageProcessor {
    registry: Arc<RouterRegistry>,
}

impl MessageProcessor {
    pub fn new(registry: Arc<RouterRegistry>) -> Self {
        Self { registry }
    }

    pub fn process(
        &self,
        message: Message,
        transport: Box<dyn Transport>,
        connection: &ConnectionContext,
    ) {
        let kind = message.kind();
        trace!(client_id = %connection.client_id(), kind, "processing message");

        // Until the handshake completes, hello is the only admissible
        // message; anything else is a protocol violation and fatal to the
        // connection.
        let Some(session_id) = connection.session_id() else {
            match message {
                Message::Hello { realm, roles } => {
                    self.establish_session(realm, roles, transport, connection);
                }
                _ => {
                    warn!(
                        client_id = %connection.client_id(),
                        kind,
                        "message before handshake, aborting connection"
                    );
                    let violation =
                        RouterError::ProtocolViolation(format!("{kind} before handshake"));
                    transport
                        .send(Message::Abort {
                            reason: violation.uri().to_string(),
                            message: Some(violation.to_string()),
                        })
                        .ok();
                }
            }
            return;
        };

        // The connection is bound to a session; resolve its realm's router.
        // If the realm can no longer be resolved there is no peer to answer
        // on behalf of, so the message is dropped.
        let Some(router) = connection
            .realm()
            .and_then(|realm| self.registry.get_router(&realm))
        else {
            debug!(?session_id, kind, "no router for connection's realm, dropping message");
            return;
        };

        match message {
            Message::Hello { .. } => {
                // A second hello on an established session; state-violating.
                debug!(?session_id, "hello on an established session, dropping");
            }
            Message::Goodbye { reason } => {
                router.session_goodbye(session_id, reason);
                connection.clear();
            }
            Message::Register {
                request_id,
                procedure,
            } => router.register(session_id, request_id, procedure),
            Message::Unregister {
                request_id,
                registration_id,
            } => router.unregister(session_id, request_id, registration_id),
            Message::Call {
                request_id,
                procedure,
                args,
            } => router.call(session_id, request_id, procedure, args),
            Message::Yield {
                invocation_id,
                results,
            } => router.yield_result(session_id, invocation_id, results),
            Message::Error {
                request_type: RequestType::Invocation,
                request_id,
                error,
                args,
            } => router.invocation_error(session_id, InvocationId(request_id), error, args),
            Message::Error { request_type, .. } => {
                debug!(?session_id, ?request_type, "error for an unroutable request type, dropping");
            }
            Message::Subscribe { request_id, topic } => {
                router.subscribe(session_id, request_id, topic)
            }
            Message::Unsubscribe {
                request_id,
                subscription_id,
            } => router.unsubscribe(session_id, request_id, subscription_id),
            Message::Publish {
                request_id,
                topic,
                args,
                options,
            } => router.publish(session_id, request_id, topic, args, options),
            // Extension points this core recognizes without implementing:
            // accepted and ignored on purpose.
            Message::Authenticate { .. } | Message::Cancel { .. } => {
                debug!(?session_id, kind, "ignoring extension message");
            }
            // Router-to-peer kinds arriving inbound violate session state.
            Message::Welcome { .. }
            | Message::Abort { .. }
            | Message::Registered { .. }
            | Message::Unregistered { .. }
            | Message::Invocation { .. }
            | Message::Result { .. }
            | Message::Subscribed { .. }
            | Message::Unsubscribed { .. }
            | Message::Event { .. } => {
                debug!(?session_id, kind, "inadmissible message kind from peer, dropping");
            }
        }
    }

    /// The transport under a connection went away without a goodbye. Tear
    /// down whatever session it was bound to.
    pub fn connection_closed(&self, connection: &ConnectionContext) {
        let (Some(session_id), Some(realm)) = (connection.session_id(), connection.realm()) else {
            return;
        };
        if let Some(router) = self.registry.get_router(&realm) {
            router.detach_session(session_id);
        }
        connection.clear();
    }

    fn establish_session(
        &self,
        realm: String,
        roles: RoleSet,
        transport: Box<dyn Transport>,
        connection: &ConnectionContext,
    ) {
        let Some(router) = self.registry.get_router(&realm) else {
            warn!(client_id = %connection.client_id(), %realm, "hello for unknown realm, aborting connection");
            let error = RouterError::NoSuchRealm;
            transport
                .send(Message::Abort {
                    reason: error.uri().to_string(),
                    message: Some(error.to_string()),
                })
                .ok();
            return;
        };
        let session_id = router.attach_session(roles, transport);
        connection.bind(session_id, realm);
    }
}
