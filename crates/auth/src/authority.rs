use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::principal::Principal;

pub const READ_PERM: &str = "READ_PERM";
pub const WRITE_PERM: &str = "WRITE_PERM";

/// Authority token granted through a permission, e.g. `"READ_PERM"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(Cow<'static, str>);

impl Authority {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// `"read"` → `"READ_PERM"`.
    pub fn for_action(action: &str) -> Self {
        Self(Cow::Owned(format!("{}_PERM", action.to_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated authorities of one principal, fixed at authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritySet(BTreeSet<Authority>);

impl AuthoritySet {
    pub fn contains(&self, authority: &Authority) -> bool {
        self.0.contains(authority)
    }

    pub fn contains_str(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Authority> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Authority> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = Authority>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Union of permission names across the principal's roles.
pub fn resolve_authorities(principal: &Principal) -> AuthoritySet {
    principal
        .roles
        .iter()
        .flat_map(|role| role.permissions.iter())
        .map(|permission| Authority::new(permission.name.clone()))
        .collect()
}
