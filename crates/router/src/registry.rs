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

//! Realm name to router lookup, for the life of the process.

use std::collections::HashMap;

use crate::realm::Router;

/// Owns every realm's router for the process lifetime. The realm set is
/// closed: realms are declared up front when the registry is built, which
/// makes the at-most-one-router-per-realm guarantee trivial. Lookups hand
/// out plain borrows, never an owning pointer, so a realm's lifetime is
/// decoupled from any caller's handle.
pub struct RouterRegistry {
    routers: HashMap<String, Router>,
}

impl RouterRegistry {
    /// Build a registry serving exactly the given realms.
    pub fn new(realms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let routers = realms
            .into_iter()
            .map(|realm| {
                let realm = realm.into();
                (realm.clone(), Router::new(realm))
            })
            .collect();
        Self { routers }
    }

    /// Pure lookup; no side effects, no realm creation.
    pub fn get_router(&self, realm: &str) -> Option<&Router> {
        self.routers.get(realm)
    }

    pub fn realms(&self) -> impl Iterator<Item = &str> {
        self.routers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_closed_over_the_declared_realm_set() {
        let registry = RouterRegistry::new(["library", "garden"]);
        assert!(registry.get_router("library").is_some());
        assert!(registry.get_router("garden").is_some());
        assert!(registry.get_router("ghost").is_none());
        assert_eq!(registry.realms().count(), 2);
    }
}
