//! Permission domain model.
//!
//! A Delegate's rights are a matrix of [`Resource`] × [`Action`]. The
//! matrix is persisted as a list of [`PermissionGrant`]s and travels in
//! tokens as a [`PermissionMap`] (`{"contenus": ["read", "update"]}`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ComanagerError;

/// Resource families an Owner can delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Laalas,
    Contenus,
    Communications,
    Campaigns,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Laalas,
        Resource::Contenus,
        Resource::Communications,
        Resource::Campaigns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Laalas => "laalas",
            Resource::Contenus => "contenus",
            Resource::Communications => "communications",
            Resource::Campaigns => "campaigns",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ComanagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ComanagerError::validation(format!("unknown resource: {s}")))
    }
}

/// CRUD actions on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ComanagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ComanagerError::validation(format!("unknown action: {s}")))
    }
}

/// One row of a Delegate's permission matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub resource: Resource,
    pub actions: BTreeSet<Action>,
}

impl PermissionGrant {
    pub fn new(resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            resource,
            actions: actions.into_iter().collect(),
        }
    }
}

/// Resource → allowed actions. Resources absent from the map are fully
/// denied.
///
/// Serializes as `{ "<resource>": ["<action>", ...] }`, which is the
/// `permissions` claim of a delegated token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<Resource, BTreeSet<Action>>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action on every resource. The implicit matrix of an Owner.
    pub fn full() -> Self {
        Self(
            Resource::ALL
                .into_iter()
                .map(|r| (r, Action::ALL.into_iter().collect()))
                .collect(),
        )
    }

    /// Build the snapshot from stored grants. Grants naming the same
    /// resource are merged; empty action sets are dropped.
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a PermissionGrant>) -> Self {
        let mut map: BTreeMap<Resource, BTreeSet<Action>> = BTreeMap::new();
        for grant in grants {
            if grant.actions.is_empty() {
                continue;
            }
            map.entry(grant.resource)
                .or_default()
                .extend(grant.actions.iter().copied());
        }
        Self(map)
    }

    /// Flatten back into one grant per resource.
    pub fn to_grants(&self) -> Vec<PermissionGrant> {
        self.0
            .iter()
            .map(|(resource, actions)| PermissionGrant {
                resource: *resource,
                actions: actions.clone(),
            })
            .collect()
    }

    pub fn actions(&self, resource: Resource) -> Option<&BTreeSet<Action>> {
        self.0.get(&resource)
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.0
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Resource, &BTreeSet<Action>)> {
        self.0.iter()
    }
}

impl FromIterator<(Resource, Action)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (Resource, Action)>>(iter: I) -> Self {
        let mut map: BTreeMap<Resource, BTreeSet<Action>> = BTreeMap::new();
        for (resource, action) in iter {
            map.entry(resource).or_default().insert(action);
        }
        Self(map)
    }
}
