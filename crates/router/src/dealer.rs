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

//! Per-realm RPC routing: the procedure registration table and the
//! call/invocation correlation table.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use weir_common::{
    IdGenerator, InvocationId, Message, RegistrationId, RequestId, RequestType, RouterError,
    SessionId,
};

use crate::session::Session;

/// Binding of a procedure name to the session that services calls to it. A
/// procedure name maps to at most one live registration per realm.
struct Registration {
    procedure: String,
    session: Arc<Session>,
}

/// One in-flight forwarded call, awaiting the callee's yield or error.
struct PendingInvocation {
    callee: SessionId,
    caller: Arc<Session>,
    call_request_id: RequestId,
}

/// The RPC half of a realm's router. Every method runs under the realm
/// lock, so the compound lookup-then-mutate sequences here are atomic with
/// respect to concurrent traffic on the same realm.
#[derive(Default)]
pub struct Dealer {
    /// Sessions that declared the caller or callee role.
    sessions: HashMap<SessionId, Arc<Session>>,
    procedures: HashMap<String, RegistrationId>,
    registrations: HashMap<RegistrationId, Registration>,
    invocations: HashMap<InvocationId, PendingInvocation>,
    id_generator: IdGenerator,
}

impl Dealer {
    pub(crate) fn attach_session(&mut self, session: Arc<Session>) {
        self.sessions.insert(session.id(), session);
    }

    /// Remove the departing session's registrations, and synthesize an
    /// error back to the caller of every pending invocation that was
    /// waiting on it as callee. One sweep under the realm lock, so a
    /// dangling correlation is never matchable mid-teardown.
    pub(crate) fn detach_session(&mut self, session_id: SessionId) {
        if self.sessions.remove(&session_id).is_none() {
            return;
        }

        let dead_registrations: Vec<_> = self
            .registrations
            .iter()
            .filter(|(_, r)| r.session.id() == session_id)
            .map(|(id, _)| *id)
            .collect();
        for registration_id in dead_registrations {
            if let Some(registration) = self.registrations.remove(&registration_id) {
                self.procedures.remove(&registration.procedure);
            }
        }

        let orphaned: Vec<_> = self
            .invocations
            .iter()
            .filter(|(_, invocation)| invocation.callee == session_id)
            .map(|(id, _)| *id)
            .collect();
        for invocation_id in orphaned {
            let Some(invocation) = self.invocations.remove(&invocation_id) else {
                continue;
            };
            debug!(?invocation_id, ?session_id, "callee left with invocation pending, erroring the call");
            invocation.caller.send(Message::error(
                RequestType::Call,
                invocation.call_request_id.0,
                &RouterError::Canceled,
            ));
        }
    }

    pub(crate) fn register(
        &mut self,
        session_id: SessionId,
        request_id: RequestId,
        procedure: String,
    ) {
        let Some(session) = self.sessions.get(&session_id).cloned() else {
            warn!(?session_id, "register from a session not attached to the dealer");
            return;
        };
        if self.procedures.contains_key(&procedure) {
            session.send(Message::error(
                RequestType::Register,
                request_id.0,
                &RouterError::ProcedureAlreadyExists,
            ));
            return;
        }
        let registration_id = loop {
            let id = RegistrationId(self.id_generator.generate());
            if !self.registrations.contains_key(&id) {
                break id;
            }
        };
        self.procedures.insert(procedure.clone(), registration_id);
        self.registrations.insert(
            registration_id,
            Registration {
                procedure,
                session: session.clone(),
            },
        );
        session.send(Message::Registered {
            request_id,
            registration_id,
        });
    }

    pub(crate) fn unregister(
        &mut self,
        session_id: SessionId,
        request_id: RequestId,
        registration_id: RegistrationId,
    ) {
        let Some(session) = self.sessions.get(&session_id).cloned() else {
            warn!(?session_id, "unregister from a session not attached to the dealer");
            return;
        };
        match self.registrations.get(&registration_id) {
            Some(registration) if registration.session.id() == session_id => {}
            _ => {
                session.send(Message::error(
                    RequestType::Unregister,
                    request_id.0,
                    &RouterError::NoSuchRegistration,
                ));
                return;
            }
        }
        if let Some(registration) = self.registrations.remove(&registration_id) {
            self.procedures.remove(&registration.procedure);
        }
        session.send(Message::Unregistered { request_id });
    }

    pub(crate) fn call(
        &mut self,
        session_id: SessionId,
        request_id: RequestId,
        procedure: String,
        args: Vec<Value>,
    ) {
        let Some(caller) = self.sessions.get(&session_id).cloned() else {
            warn!(?session_id, "call from a session not attached to the dealer");
            return;
        };
        let Some(registration_id) = self.procedures.get(&procedure).copied() else {
            caller.send(Message::error(
                RequestType::Call,
                request_id.0,
                &RouterError::NoSuchProcedure,
            ));
            return;
        };
        // The two tables are only ever updated together under the realm
        // lock; a miss here is a cascade-cleanup defect.
        let callee = self
            .registrations
            .get(&registration_id)
            .map(|r| r.session.clone())
            .expect("procedure index out of sync with registration table");

        let invocation_id = loop {
            let id = InvocationId(self.id_generator.generate());
            if !self.invocations.contains_key(&id) {
                break id;
            }
        };
        self.invocations.insert(
            invocation_id,
            PendingInvocation {
                callee: callee.id(),
                caller,
                call_request_id: request_id,
            },
        );
        callee.send(Message::Invocation {
            invocation_id,
            registration_id,
            args,
        });
    }

    /// Route a callee's yield back to the original caller. Exactly one
    /// yield is honored per invocation; the correlation entry is consumed
    /// by the first matching reply.
    pub(crate) fn yield_result(
        &mut self,
        session_id: SessionId,
        invocation_id: InvocationId,
        results: Vec<Value>,
    ) {
        let Some(invocation) = self.take_invocation(session_id, invocation_id) else {
            return;
        };
        invocation.caller.send(Message::Result {
            request_id: invocation.call_request_id,
            results,
        });
    }

    /// A callee-side error for a pending invocation, forwarded to the
    /// caller in place of a result.
    pub(crate) fn invocation_error(
        &mut self,
        session_id: SessionId,
        invocation_id: InvocationId,
        error: String,
        args: Vec<Value>,
    ) {
        let Some(invocation) = self.take_invocation(session_id, invocation_id) else {
            return;
        };
        invocation.caller.send(Message::Error {
            request_type: RequestType::Call,
            request_id: invocation.call_request_id.0,
            error,
            args,
        });
    }

    /// Look up and consume a pending invocation, checking that the replying
    /// session really is the callee it was forwarded to. There is no valid
    /// reply target on a miss, so it is logged and dropped.
    fn take_invocation(
        &mut self,
        session_id: SessionId,
        invocation_id: InvocationId,
    ) -> Option<PendingInvocation> {
        match self.invocations.get(&invocation_id) {
            Some(invocation) if invocation.callee == session_id => {
                self.invocations.remove(&invocation_id)
            }
            _ => {
                warn!(?session_id, ?invocation_id, "{}", RouterError::NoSuchInvocation);
                None
            }
        }
    }
}
