//! Merge engine - fixed-precedence reduction across source tiers
//!
//! Combines seed, remote and local collections into one de-duplicated view.
//! Precedence is seed < remote < local: a remote record overwrites the seed
//! baseline, and a local-override record overwrites everything, on the
//! theory that a local write not yet confirmed remotely reflects the user's
//! most recent action.
//!
//! The reduction is deterministic and idempotent: a record keeps the
//! position of its first insertion, so merging unchanged inputs twice yields
//! an identical output. An empty remote tier is treated the same as remote
//! absence - availability over freshness.
//!
//! Tenant scoping is applied *after* the merge so a locally-created record
//! is visible immediately regardless of which tier it came from.

use std::collections::HashMap;

use crate::model::{Identified, Identity, LearningUnit};

/// Merge three precedence-ordered tiers into one de-duplicated collection.
pub fn merge<T: Identified>(seed: Vec<T>, remote: Vec<T>, local: Vec<T>) -> Vec<T> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, T> = HashMap::new();

    for tier in [seed, remote, local] {
        for record in tier {
            let id = record.id().to_string();
            if !by_id.contains_key(&id) {
                order.push(id.clone());
            }
            by_id.insert(id, record);
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

/// Visibility scope applied to a merged collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Global/shared records only (no organization id).
    Global,
    /// One tenant's records, plus global ones where the entity supports them.
    Tenant(String),
    /// Everything - the operator (superuser) unscoped view.
    All,
}

impl TenantScope {
    /// Convenience constructor from the optional organization id used across
    /// the external interface: absent means "global only".
    pub fn from_option(organization_id: Option<&str>) -> Self {
        match organization_id {
            Some(id) => Self::Tenant(id.to_string()),
            None => Self::Global,
        }
    }
}

/// Filter merged learning units by tenant visibility.
///
/// A unit with no organization id is visible to every tenant; a scoped unit
/// only to its own tenant (and to `All`).
pub fn scope_units(units: Vec<LearningUnit>, scope: &TenantScope) -> Vec<LearningUnit> {
    units
        .into_iter()
        .filter(|unit| match scope {
            TenantScope::All => true,
            TenantScope::Global => unit.is_global(),
            TenantScope::Tenant(tenant) => {
                unit.is_global() || unit.organization_id.as_deref() == Some(tenant.as_str())
            }
        })
        .collect()
}

/// Filter merged identities by tenant.
///
/// Identities always belong to an organization, so `Global` admits nothing
/// and `All` is the unscoped listing.
pub fn scope_identities(identities: Vec<Identity>, scope: &TenantScope) -> Vec<Identity> {
    identities
        .into_iter()
        .filter(|identity| match scope {
            TenantScope::All => true,
            TenantScope::Global => false,
            TenantScope::Tenant(tenant) => identity.organization_id == *tenant,
        })
        .collect()
}
