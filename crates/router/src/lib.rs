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

//! The routing core: per-realm dealer (RPC) and broker (pub/sub) state, the
//! session lifecycle around them, and the message dispatch entry point a
//! transport host drives.

pub mod broker;
pub mod dealer;
pub mod processor;
pub mod realm;
pub mod registry;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use processor::MessageProcessor;
pub use realm::Router;
pub use registry::RouterRegistry;
pub use session::Session;
