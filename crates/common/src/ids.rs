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

//! Protocol-space identifiers and the generator that draws them.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound of the protocol identifier space. Ids must survive a round
/// trip through an IEEE-754 double on the far side of the wire, so they are
/// capped at 2^53.
pub const MAX_ID: u64 = 1 << 53;

/// Identifier assigned to a session at handshake, unique among the live
/// sessions of its realm.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Identifier of a procedure registration, unique within its realm's dealer.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

/// Identifier of a topic subscription, unique within its realm's broker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Callee-facing identifier of one in-flight forwarded call.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InvocationId(pub u64);

/// Identifier stamped on one published event as it fans out.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PublicationId(pub u64);

/// Caller-chosen identifier correlating a request with its acknowledgment.
/// The router never allocates these, it only echoes them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Draws identifiers from the protocol id space. Stateless and uncoordinated:
/// the draw is a plain pseudo-random sample and carries no uniqueness
/// guarantee of its own. A caller that needs uniqueness checks the drawn id
/// against the live table it will index and draws again on collision, which
/// is vanishingly rare in a 2^53 space.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn generate(&self) -> u64 {
        rand::rng().random_range(1..=MAX_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_stay_in_protocol_range() {
        let generator = IdGenerator;
        for _ in 0..10_000 {
            let id = generator.generate();
            assert!((1..=MAX_ID).contains(&id));
        }
    }
}
