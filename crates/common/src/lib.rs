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

//! Types shared between the routing core and the transport hosts that drive
//! it: the message taxonomy, protocol identifiers, error vocabulary, and the
//! seams (transport handle, connection context) the two sides meet at.

pub use context::ConnectionContext;
pub use errors::{GOODBYE_AND_OUT, RouterError, TransportError};
pub use ids::{
    IdGenerator, InvocationId, MAX_ID, PublicationId, RegistrationId, RequestId, SessionId,
    SubscriptionId,
};
pub use messages::{Message, PublishOptions, RequestType, RoleSet};
pub use transport::{ChannelTransport, Transport};

mod context;
mod errors;
mod ids;
mod messages;
mod transport;
