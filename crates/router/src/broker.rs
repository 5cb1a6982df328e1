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

//! Per-realm pub/sub routing: the topic subscription table and event
//! fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use weir_common::{
    IdGenerator, Message, PublicationId, PublishOptions, RequestId, RequestType, RouterError,
    SessionId, SubscriptionId,
};

use crate::session::Session;

/// Binding of one session to one exact topic it wishes to receive events
/// from.
struct Subscription {
    topic: String,
    session: Arc<Session>,
}

/// The pub/sub half of a realm's router. Every method runs under the realm
/// lock; the subscribe-then-idempotence-check sequence in particular relies
/// on that.
#[derive(Default)]
pub struct Broker {
    /// Sessions that declared the publisher or subscriber role.
    sessions: HashMap<SessionId, Arc<Session>>,
    /// Topic name to the subscription each session holds on it.
    topics: HashMap<String, HashMap<SessionId, SubscriptionId>>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    id_generator: IdGenerator,
}

impl Broker {
    pub(crate) fn attach_session(&mut self, session: Arc<Session>) {
        self.sessions.insert(session.id(), session);
    }

    /// Drop the departing session's subscriptions and remove it from every
    /// topic's subscriber set.
    pub(crate) fn detach_session(&mut self, session_id: SessionId) {
        if self.sessions.remove(&session_id).is_none() {
            return;
        }
        let dead: Vec<_> = self
            .subscriptions
            .iter()
            .filter(|(_, s)| s.session.id() == session_id)
            .map(|(id, _)| *id)
            .collect();
        for subscription_id in dead {
            if let Some(subscription) = self.subscriptions.remove(&subscription_id) {
                self.drop_from_topic(&subscription.topic, session_id);
            }
        }
    }

    /// Subscribing twice to the same topic is idempotent: the existing
    /// subscription id is acknowledged again, and no second subscription is
    /// created.
    pub(crate) fn subscribe(&mut self, session_id: SessionId, request_id: RequestId, topic: String) {
        let Some(session) = self.sessions.get(&session_id).cloned() else {
            warn!(?session_id, "subscribe from a session not attached to the broker");
            return;
        };
        if let Some(existing) = self
            .topics
            .get(&topic)
            .and_then(|subscribers| subscribers.get(&session_id))
            .copied()
        {
            session.send(Message::Subscribed {
                request_id,
                subscription_id: existing,
            });
            return;
        }
        let subscription_id = loop {
            let id = SubscriptionId(self.id_generator.generate());
            if !self.subscriptions.contains_key(&id) {
                break id;
            }
        };
        self.topics
            .entry(topic.clone())
            .or_default()
            .insert(session_id, subscription_id);
        self.subscriptions.insert(
            subscription_id,
            Subscription {
                topic,
                session: session.clone(),
            },
        );
        session.send(Message::Subscribed {
            request_id,
            subscription_id,
        });
    }

    pub(crate) fn unsubscribe(
        &mut self,
        session_id: SessionId,
        request_id: RequestId,
        subscription_id: SubscriptionId,
    ) {
        let Some(session) = self.sessions.get(&session_id).cloned() else {
            warn!(?session_id, "unsubscribe from a session not attached to the broker");
            return;
        };
        match self.subscriptions.get(&subscription_id) {
            Some(subscription) if subscription.session.id() == session_id => {}
            _ => {
                session.send(Message::error(
                    RequestType::Unsubscribe,
                    request_id.0,
                    &RouterError::NoSuchSubscription,
                ));
                return;
            }
        }
        if let Some(subscription) = self.subscriptions.remove(&subscription_id) {
            self.drop_from_topic(&subscription.topic, session_id);
        }
        session.send(Message::Unsubscribed { request_id });
    }

    /// Fire-and-forget fan-out to the topic's current subscribers. Zero
    /// subscribers is not an error, and the publisher only hears its own
    /// event if the options ask for that.
    pub(crate) fn publish(
        &mut self,
        session_id: SessionId,
        _request_id: RequestId,
        topic: String,
        args: Vec<Value>,
        options: PublishOptions,
    ) {
        if !self.sessions.contains_key(&session_id) {
            warn!(?session_id, "publish from a session not attached to the broker");
            return;
        }
        let publication_id = PublicationId(self.id_generator.generate());
        let Some(subscribers) = self.topics.get(&topic) else {
            return;
        };
        for (subscriber_id, subscription_id) in subscribers {
            if *subscriber_id == session_id && options.excludes_publisher() {
                continue;
            }
            // The two tables are only ever updated together under the realm
            // lock; a miss here is a cascade-cleanup defect.
            let subscription = self
                .subscriptions
                .get(subscription_id)
                .expect("topic index out of sync with subscription table");
            subscription.session.send(Message::Event {
                subscription_id: *subscription_id,
                publication_id,
                args: args.clone(),
            });
        }
    }

    fn drop_from_topic(&mut self, topic: &str, session_id: SessionId) {
        if let Some(subscribers) = self.topics.get_mut(topic) {
            subscribers.remove(&session_id);
            if subscribers.is_empty() {
                self.topics.remove(topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use weir_common::{ChannelTransport, RoleSet};

    fn attach(broker: &mut Broker, id: u64) -> (Arc<Session>, flume::Receiver<Message>) {
        let (transport, recv) = ChannelTransport::pair();
        let session = Arc::new(Session::new(
            SessionId(id),
            "library".to_string(),
            RoleSet::all(),
            Box::new(transport),
        ));
        broker.attach_session(session.clone());
        (session, recv)
    }

    fn subscribed_id(recv: &flume::Receiver<Message>) -> SubscriptionId {
        match recv.try_recv().unwrap() {
            Message::Subscribed {
                subscription_id, ..
            } => subscription_id,
            other => panic!("expected subscribed, got {other:?}"),
        }
    }

    #[test]
    fn double_subscribe_returns_the_same_id_and_one_event() {
        let mut broker = Broker::default();
        let (subscriber, sub_recv) = attach(&mut broker, 1);
        let (publisher, _pub_recv) = attach(&mut broker, 2);

        broker.subscribe(subscriber.id(), RequestId(1), "news".to_string());
        let first = subscribed_id(&sub_recv);
        broker.subscribe(subscriber.id(), RequestId(2), "news".to_string());
        let second = subscribed_id(&sub_recv);
        assert_eq!(first, second);

        broker.publish(
            publisher.id(),
            RequestId(3),
            "news".to_string(),
            vec![json!("hi")],
            PublishOptions::default(),
        );
        let Message::Event {
            subscription_id,
            args,
            ..
        } = sub_recv.try_recv().unwrap()
        else {
            panic!("expected an event");
        };
        assert_eq!(subscription_id, first);
        assert_eq!(args, vec![json!("hi")]);
        // Exactly one event, not one per subscribe request.
        assert!(sub_recv.try_recv().is_err());
    }

    #[test]
    fn publisher_can_opt_in_to_its_own_events() {
        let mut broker = Broker::default();
        let (session, recv) = attach(&mut broker, 1);

        broker.subscribe(session.id(), RequestId(1), "news".to_string());
        subscribed_id(&recv);

        broker.publish(
            session.id(),
            RequestId(2),
            "news".to_string(),
            vec![],
            PublishOptions::default(),
        );
        assert!(recv.try_recv().is_err());

        broker.publish(
            session.id(),
            RequestId(3),
            "news".to_string(),
            vec![],
            PublishOptions {
                exclude_me: Some(false),
            },
        );
        assert_eq!(recv.try_recv().unwrap().kind(), "event");
    }

    #[test]
    fn unsubscribe_checks_ownership_and_liveness() {
        let mut broker = Broker::default();
        let (subscriber, sub_recv) = attach(&mut broker, 1);
        let (intruder, intruder_recv) = attach(&mut broker, 2);

        broker.subscribe(subscriber.id(), RequestId(1), "news".to_string());
        let subscription_id = subscribed_id(&sub_recv);

        broker.unsubscribe(intruder.id(), RequestId(2), subscription_id);
        let Message::Error { error, .. } = intruder_recv.try_recv().unwrap() else {
            panic!("expected an error reply");
        };
        assert_eq!(error, "wamp.error.no_such_subscription");

        broker.unsubscribe(subscriber.id(), RequestId(3), subscription_id);
        assert_eq!(
            sub_recv.try_recv().unwrap(),
            Message::Unsubscribed {
                request_id: RequestId(3)
            }
        );

        broker.unsubscribe(subscriber.id(), RequestId(4), subscription_id);
        let Message::Error { error, .. } = sub_recv.try_recv().unwrap() else {
            panic!("expected an error reply");
        };
        assert_eq!(error, "wamp.error.no_such_subscription");
    }

    #[test]
    fn detach_removes_the_session_from_every_topic() {
        let mut broker = Broker::default();
        let (subscriber, sub_recv) = attach(&mut broker, 1);
        let (publisher, _pub_recv) = attach(&mut broker, 2);

        broker.subscribe(subscriber.id(), RequestId(1), "news".to_string());
        subscribed_id(&sub_recv);
        broker.subscribe(subscriber.id(), RequestId(2), "weather".to_string());
        subscribed_id(&sub_recv);

        broker.detach_session(subscriber.id());

        broker.publish(
            publisher.id(),
            RequestId(3),
            "news".to_string(),
            vec![],
            PublishOptions::default(),
        );
        broker.publish(
            publisher.id(),
            RequestId(4),
            "weather".to_string(),
            vec![],
            PublishOptions::default(),
        );
        assert!(sub_recv.try_recv().is_err());
        // Publishing to a topic with no subscribers left is not an error.
        assert!(broker.topics.is_empty());
    }
}
