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

//! The protocol error vocabulary. Application errors are reported back to
//! the offending peer as `error` replies and the session continues;
//! protocol violations (and `no_such_realm` at handshake, when no session
//! exists to continue with) are fatal to the connection.

use thiserror::Error;

/// Reason carried on the router's echo of a peer-initiated goodbye.
pub const GOODBYE_AND_OUT: &str = "wamp.error.goodbye_and_out";

/// Every error condition the routing core can report to a peer, with its
/// wire-level error URI.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RouterError {
    #[error("no such realm")]
    NoSuchRealm,
    #[error("no such procedure")]
    NoSuchProcedure,
    #[error("procedure already exists")]
    ProcedureAlreadyExists,
    #[error("no such registration")]
    NoSuchRegistration,
    #[error("no such subscription")]
    NoSuchSubscription,
    #[error("no such invocation")]
    NoSuchInvocation,
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("callee is no longer available")]
    Canceled,
}

impl RouterError {
    pub fn uri(&self) -> &'static str {
        match self {
            RouterError::NoSuchRealm => "wamp.error.no_such_realm",
            RouterError::NoSuchProcedure => "wamp.error.no_such_procedure",
            RouterError::ProcedureAlreadyExists => "wamp.error.procedure_already_exists",
            RouterError::NoSuchRegistration => "wamp.error.no_such_registration",
            RouterError::NoSuchSubscription => "wamp.error.no_such_subscription",
            RouterError::NoSuchInvocation => "wamp.error.no_such_invocation",
            RouterError::ProtocolViolation(_) => "wamp.error.protocol_violation",
            RouterError::Canceled => "wamp.error.canceled",
        }
    }
}

/// Errors surfaced by a transport handle on delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("could not deliver message: {0}")]
    Delivery(String),
}
