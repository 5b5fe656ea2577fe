//! `CrmService`: the in-process facade the web layer calls.
//!
//! Every operation names its acting user explicitly. The acting user is
//! resolved from the store on each call, so deactivation and role changes
//! take effect immediately. Lists go through the visibility filter; single
//! records answer `NotFound` when absent and `Forbidden` when present but
//! out of reach.

mod clients;
mod deals;
mod listings;
mod reports;
mod tasks;
mod users;

use estatecrm_auth::{Action, Actor, authorize};
use estatecrm_core::{Clock, DomainResult, Owned, SystemClock, UserId};

use crate::config::CrmConfig;
use crate::store::{CrmStore, InMemoryStore, Tables};

pub struct CrmService<S = InMemoryStore, C = SystemClock> {
    store: S,
    clock: C,
    config: CrmConfig,
}

impl CrmService {
    /// Service over a fresh in-memory store and the system clock.
    pub fn in_memory(config: CrmConfig) -> Self {
        Self::new(InMemoryStore::new(), SystemClock, config)
    }
}

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, config: CrmConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Resolve the acting user. Unknown and deactivated users cannot act.
fn acting(tables: &Tables, user_id: UserId) -> DomainResult<Actor> {
    tables.user(user_id)?.actor()
}

/// Gate one record-level action.
fn check<T: Owned + ?Sized>(actor: &Actor, record: &T, action: Action) -> DomainResult<()> {
    authorize(actor, record.owner_id(), action)?;
    Ok(())
}

/// Creating or handing over a record for `owner_id` counts as a create on
/// their behalf: staff can only do it for themselves.
fn check_owner(actor: &Actor, owner_id: UserId) -> DomainResult<()> {
    authorize(actor, owner_id, Action::Create)?;
    Ok(())
}
