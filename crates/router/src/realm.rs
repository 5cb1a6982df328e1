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

//! The per-realm aggregate: one dealer, one broker, and the realm's live
//! session table, behind a single realm-scoped lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use weir_common::{
    GOODBYE_AND_OUT, IdGenerator, InvocationId, Message, PublishOptions, RegistrationId,
    RequestId, RoleSet, SessionId, SubscriptionId, Transport,
};

use crate::broker::Broker;
use crate::dealer::Dealer;
use crate::session::Session;

/// One realm's router. All the realm's shared mutable routing state lives
/// behind one mutex, so compound operations like a cascade detach or a
/// call-lookup-then-record are atomic with respect to concurrent
/// operations on the same realm, while routers for different realms never
/// contend.
/// Outbound delivery is a channel hand-off, so holding the lock across a
/// send never blocks on I/O.
pub struct Router {
    realm: String,
    state: Mutex<RealmState>,
}

#[derive(Default)]
struct RealmState {
    sessions: HashMap<SessionId, Arc<Session>>,
    dealer: Dealer,
    broker: Broker,
    id_generator: IdGenerator,
}

impl Router {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            state: Mutex::new(RealmState::default()),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    /// Construct and attach a session for a connection whose handshake
    /// named this realm, then welcome it. The session id is drawn until it
    /// misses the realm's live session table.
    pub fn attach_session(&self, roles: RoleSet, transport: Box<dyn Transport>) -> SessionId {
        let mut state = self.state.lock().unwrap();
        let session_id = loop {
            let id = SessionId(state.id_generator.generate());
            if !state.sessions.contains_key(&id) {
                break id;
            }
        };
        let session = Arc::new(Session::new(
            session_id,
            self.realm.clone(),
            roles,
            transport,
        ));
        if roles.uses_dealer() {
            state.dealer.attach_session(session.clone());
        }
        if roles.uses_broker() {
            state.broker.attach_session(session.clone());
        }
        state.sessions.insert(session_id, session.clone());
        debug!(realm = %self.realm, ?session_id, "session attached");
        session.send(Message::Welcome { session_id });
        session_id
    }

    /// Tear a session down: cascade its registrations, subscriptions, and
    /// pending invocations out of the dealer and broker, then release its
    /// transport. One hold of the realm lock covers the whole sweep. Also
    /// the entry point for transport loss, where no goodbye ever arrives.
    pub fn detach_session(&self, session_id: SessionId) {
        let mut state = self.state.lock().unwrap();
        Self::detach_locked(&mut state, session_id);
        debug!(realm = %self.realm, ?session_id, "session detached");
    }

    /// A peer-initiated goodbye: echo it, then detach. Both halves run
    /// under one hold of the realm lock.
    pub fn session_goodbye(&self, session_id: SessionId, reason: String) {
        let mut state = self.state.lock().unwrap();
        let Some(session) = state.sessions.get(&session_id).cloned() else {
            return;
        };
        debug!(realm = %self.realm, ?session_id, %reason, "session said goodbye");
        session.send(Message::Goodbye {
            reason: GOODBYE_AND_OUT.to_string(),
        });
        Self::detach_locked(&mut state, session_id);
    }

    fn detach_locked(state: &mut RealmState, session_id: SessionId) {
        state.dealer.detach_session(session_id);
        state.broker.detach_session(session_id);
        if let Some(session) = state.sessions.remove(&session_id) {
            session.release_transport();
        }
    }

    pub fn register(&self, session_id: SessionId, request_id: RequestId, procedure: String) {
        self.state
            .lock()
            .unwrap()
            .dealer
            .register(session_id, request_id, procedure);
    }

    pub fn unregister(
        &self,
        session_id: SessionId,
        request_id: RequestId,
        registration_id: RegistrationId,
    ) {
        self.state
            .lock()
            .unwrap()
            .dealer
            .unregister(session_id, request_id, registration_id);
    }

    pub fn call(
        &self,
        session_id: SessionId,
        request_id: RequestId,
        procedure: String,
        args: Vec<Value>,
    ) {
        self.state
            .lock()
            .unwrap()
            .dealer
            .call(session_id, request_id, procedure, args);
    }

    pub fn yield_result(
        &self,
        session_id: SessionId,
        invocation_id: InvocationId,
        results: Vec<Value>,
    ) {
        self.state
            .lock()
            .unwrap()
            .dealer
            .yield_result(session_id, invocation_id, results);
    }

    pub fn invocation_error(
        &self,
        session_id: SessionId,
        invocation_id: InvocationId,
        error: String,
        args: Vec<Value>,
    ) {
        self.state
            .lock()
            .unwrap()
            .dealer
            .invocation_error(session_id, invocation_id, error, args);
    }

    pub fn subscribe(&self, session_id: SessionId, request_id: RequestId, topic: String) {
        self.state
            .lock()
            .unwrap()
            .broker
            .subscribe(session_id, request_id, topic);
    }

    pub fn unsubscribe(
        &self,
        session_id: SessionId,
        request_id: RequestId,
        subscription_id: SubscriptionId,
    ) {
        self.state
            .lock()
            .unwrap()
            .broker
            .unsubscribe(session_id, request_id, subscription_id);
    }

    pub fn publish(
        &self,
        session_id: SessionId,
        request_id: RequestId,
        topic: String,
        args: Vec<Value>,
        options: PublishOptions,
    ) {
        self.state
            .lock()
            .unwrap()
            .broker
            .publish(session_id, request_id, topic, args, options);
    }
}
