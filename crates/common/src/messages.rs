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

//! The typed message taxonomy exchanged between peers and the routing core.
//! Wire framing and encoding belong to the transport host; the core only
//! ever sees these fully-typed values, and each variant carries only the
//! fields valid for its kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RouterError;
use crate::ids::{
    InvocationId, PublicationId, RegistrationId, RequestId, SessionId, SubscriptionId,
};

/// The roles a peer declares at handshake. They are fixed for the lifetime
/// of the session and determine which routing tables it participates in;
/// changing roles means establishing a new session.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoleSet {
    pub caller: bool,
    pub callee: bool,
    pub publisher: bool,
    pub subscriber: bool,
}

impl RoleSet {
    pub fn all() -> Self {
        Self {
            caller: true,
            callee: true,
            publisher: true,
            subscriber: true,
        }
    }

    /// True if the session takes part in RPC routing at all.
    pub fn uses_dealer(&self) -> bool {
        self.caller || self.callee
    }

    /// True if the session takes part in pub/sub routing at all.
    pub fn uses_broker(&self) -> bool {
        self.publisher || self.subscriber
    }
}

/// Options attached to a publish request.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Whether the event should be withheld from the publisher itself.
    /// Exclusion is the default; a publisher that also subscribes to the
    /// topic must opt in to hearing its own events.
    pub exclude_me: Option<bool>,
}

impl PublishOptions {
    pub fn excludes_publisher(&self) -> bool {
        self.exclude_me.unwrap_or(true)
    }
}

/// The request kind an `Error` message refers back to, so the correlating
/// id can be interpreted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum RequestType {
    Call,
    Invocation,
    Register,
    Unregister,
    Subscribe,
    Unsubscribe,
    Publish,
}

/// Every message the routing core can receive or emit, both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Handshake: the connecting peer names its realm and declares roles.
    Hello { realm: String, roles: RoleSet },
    /// Handshake accepted; carries the assigned session id.
    Welcome { session_id: SessionId },
    /// Handshake refused, or the connection committed a protocol violation.
    /// Fatal: the host closes the connection after flushing this.
    Abort {
        reason: String,
        message: Option<String>,
    },
    /// Session termination, either direction. The router echoes a peer's
    /// goodbye with reason `wamp.error.goodbye_and_out` before teardown.
    Goodbye { reason: String },
    /// Authentication challenge response. Recognized and ignored; challenge
    /// semantics live outside this core.
    Authenticate { signature: String },
    /// Call cancellation. Recognized and ignored; an invocation waits for
    /// its yield or for the callee's departure.
    Cancel { request_id: RequestId },
    Register {
        request_id: RequestId,
        procedure: String,
    },
    Registered {
        request_id: RequestId,
        registration_id: RegistrationId,
    },
    Unregister {
        request_id: RequestId,
        registration_id: RegistrationId,
    },
    Unregistered { request_id: RequestId },
    Call {
        request_id: RequestId,
        procedure: String,
        args: Vec<Value>,
    },
    /// A call forwarded to the registered callee.
    Invocation {
        invocation_id: InvocationId,
        registration_id: RegistrationId,
        args: Vec<Value>,
    },
    /// The callee's answer to an invocation.
    Yield {
        invocation_id: InvocationId,
        results: Vec<Value>,
    },
    /// The answer routed back to the original caller, keyed by the request
    /// id the caller chose.
    Result {
        request_id: RequestId,
        results: Vec<Value>,
    },
    /// An error at an RPC site, either direction. `request_id` is raw: it
    /// correlates whichever id space `request_type` names.
    Error {
        request_type: RequestType,
        request_id: u64,
        error: String,
        args: Vec<Value>,
    },
    Subscribe {
        request_id: RequestId,
        topic: String,
    },
    Subscribed {
        request_id: RequestId,
        subscription_id: SubscriptionId,
    },
    Unsubscribe {
        request_id: RequestId,
        subscription_id: SubscriptionId,
    },
    Unsubscribed { request_id: RequestId },
    Publish {
        request_id: RequestId,
        topic: String,
        args: Vec<Value>,
        options: PublishOptions,
    },
    /// A published event delivered to one subscriber.
    Event {
        subscription_id: SubscriptionId,
        publication_id: PublicationId,
        args: Vec<Value>,
    },
}

impl Message {
    /// An error reply referring back to the given request.
    pub fn error(request_type: RequestType, request_id: u64, error: &RouterError) -> Self {
        Message::Error {
            request_type,
            request_id,
            error: error.uri().to_string(),
            args: vec![],
        }
    }

    /// Short name of the message kind, for trace logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::Welcome { .. } => "welcome",
            Message::Abort { .. } => "abort",
            Message::Goodbye { .. } => "goodbye",
            Message::Authenticate { .. } => "authenticate",
            Message::Cancel { .. } => "cancel",
            Message::Register { .. } => "register",
            Message::Registered { .. } => "registered",
            Message::Unregister { .. } => "unregister",
            Message::Unregistered { .. } => "unregistered",
            Message::Call { .. } => "call",
            Message::Invocation { .. } => "invocation",
            Message::Yield { .. } => "yield",
            Message::Result { .. } => "result",
            Message::Error { .. } => "error",
            Message::Subscribe { .. } => "subscribe",
            Message::Subscribed { .. } => "subscribed",
            Message::Unsubscribe { .. } => "unsubscribe",
            Message::Unsubscribed { .. } => "unsubscribed",
            Message::Publish { .. } => "publish",
            Message::Event { .. } => "event",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_excluded_unless_opted_in() {
        assert!(PublishOptions::default().excludes_publisher());
        assert!(
            PublishOptions {
                exclude_me: Some(true)
            }
            .excludes_publisher()
        );
        assert!(
            !PublishOptions {
                exclude_me: Some(false)
            }
            .excludes_publisher()
        );
    }

    #[test]
    fn error_reply_carries_wire_uri() {
        let reply = Message::error(RequestType::Call, 7, &RouterError::NoSuchProcedure);
        let Message::Error {
            request_type,
            request_id,
            error,
            args,
        } = reply
        else {
            panic!("expected an error message");
        };
        assert_eq!(request_type, RequestType::Call);
        assert_eq!(request_id, 7);
        assert_eq!(error, "wamp.error.no_such_procedure");
        assert!(args.is_empty());
    }
}
