//! Role-keyed eligibility rules for the contact directory.
//!
//! The rule table is declarative: each viewer role maps to a list of
//! [`EligibilitySource`]s whose resolved user sets are unioned. Resolution
//! goes through two relationship queries on the store,
//! [`advocate_ids_for_client_cases`](MessageStore::advocate_ids_for_client_cases)
//! and
//! [`client_ids_for_advocate_cases`](MessageStore::client_ids_for_advocate_cases),
//! plus plain role lookups.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::model::{Role, UserId};
use super::store::MessageStore;
use super::MessagingError;
use crate::config::UnknownRolePolicy;

/// One building block of a viewer's eligible contact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilitySource {
    /// Every active user holding the role.
    ActiveWithRole(Role),
    /// Active advocates on any case where the viewer is the client.
    AdvocatesOnClientCases,
    /// Active clients of any case the viewer handles as advocate.
    ClientsOnAdvocateCases,
    /// Every active user.
    EveryActiveUser,
}

/// The eligibility rule for a viewer role.
///
/// | viewer   | eligible                                            |
/// |----------|-----------------------------------------------------|
/// | CLIENT   | admins, advocates on the client's cases             |
/// | ADVOCATE | admins, clients of the advocate's cases, clerks     |
/// | CLERK    | admins, advocates                                   |
/// | ADMIN    | everyone                                            |
///
/// The viewer is removed from the union afterwards.
pub fn sources_for(role: Role) -> &'static [EligibilitySource] {
    use EligibilitySource::{
        ActiveWithRole, AdvocatesOnClientCases, ClientsOnAdvocateCases, EveryActiveUser,
    };
    match role {
        Role::Client => &[ActiveWithRole(Role::Admin), AdvocatesOnClientCases],
        Role::Advocate => &[
            ActiveWithRole(Role::Admin),
            ClientsOnAdvocateCases,
            ActiveWithRole(Role::Clerk),
        ],
        Role::Clerk => &[ActiveWithRole(Role::Admin), ActiveWithRole(Role::Advocate)],
        Role::Admin => &[EveryActiveUser],
    }
}

/// Map a caller-supplied role string to the role whose rule applies.
///
/// Unrecognised strings follow `policy`: [`UnknownRolePolicy::Admin`] applies
/// the administrator rule, [`UnknownRolePolicy::Deny`] yields `None`.
pub fn effective_role(role: &str, policy: UnknownRolePolicy) -> Option<Role> {
    if let Some(known) = Role::parse(role) {
        return Some(known);
    }
    match policy {
        UnknownRolePolicy::Admin => {
            warn!(role, "unrecognised role, applying admin eligibility");
            Some(Role::Admin)
        }
        UnknownRolePolicy::Deny => {
            warn!(role, "unrecognised role, directory denied");
            None
        }
    }
}

/// Resolve a single source for `viewer`.
async fn resolve_source(
    store: &dyn MessageStore,
    viewer: UserId,
    source: EligibilitySource,
) -> Result<Vec<UserId>, MessagingError> {
    match source {
        EligibilitySource::ActiveWithRole(role) => store.active_user_ids_with_role(role).await,
        EligibilitySource::AdvocatesOnClientCases => {
            store.advocate_ids_for_client_cases(viewer).await
        }
        EligibilitySource::ClientsOnAdvocateCases => {
            store.client_ids_for_advocate_cases(viewer).await
        }
        EligibilitySource::EveryActiveUser => store.active_user_ids().await,
    }
}

/// Compute the ids of every user `viewer` may converse with under `role`.
///
/// The viewer is never part of the result. A viewer that does not exist or
/// whose account is not active has no eligible contacts.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn eligible_user_ids(
    store: &dyn MessageStore,
    viewer: UserId,
    role: Role,
) -> Result<BTreeSet<UserId>, MessagingError> {
    let mut eligible = BTreeSet::new();
    if !store.is_active_user(viewer).await? {
        debug!(viewer, "viewer missing or inactive");
        return Ok(eligible);
    }
    for source in sources_for(role) {
        eligible.extend(resolve_source(store, viewer, *source).await?);
    }
    eligible.remove(&viewer);
    Ok(eligible)
}
