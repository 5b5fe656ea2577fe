//! Record storage.
//!
//! All tables live behind one lock so a write closure sees a consistent
//! snapshot and its changes land together (a deal closing writes the deal
//! and its property under the same guard). Write closures validate
//! everything before their first mutation.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use estatecrm_auth::User;
use estatecrm_clients::{Client, InteractionLog};
use estatecrm_core::{
    ClientId, DealId, DomainError, DomainResult, InteractionId, PropertyId, ShowingId, TaskId, UserId,
};
use estatecrm_deals::Deal;
use estatecrm_listings::{Property, Showing};
use estatecrm_tasks::Task;

/// Last id handed out per table. Ids start at 1 and are never reused; like
/// database sequences they may skip values after a failed write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    users: u64,
    clients: u64,
    interactions: u64,
    properties: u64,
    showings: u64,
    deals: u64,
    tasks: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub users: BTreeMap<UserId, User>,
    pub clients: BTreeMap<ClientId, Client>,
    pub interactions: InteractionLog,
    pub properties: BTreeMap<PropertyId, Property>,
    pub showings: BTreeMap<ShowingId, Showing>,
    pub deals: BTreeMap<DealId, Deal>,
    pub tasks: BTreeMap<TaskId, Task>,
    sequences: Sequences,
}

macro_rules! lookup {
    ($fn_name:ident, $table:ident, $id:ty, $record:ty, $entity:literal) => {
        pub fn $fn_name(&self, id: $id) -> DomainResult<&$record> {
            self.$table.get(&id).ok_or_else(|| DomainError::not_found($entity, id))
        }
    };
}

impl Tables {
    lookup!(user, users, UserId, User, "user");
    lookup!(client, clients, ClientId, Client, "client");
    lookup!(property, properties, PropertyId, Property, "property");
    lookup!(showing, showings, ShowingId, Showing, "showing");
    lookup!(deal, deals, DealId, Deal, "deal");
    lookup!(task, tasks, TaskId, Task, "task");

    pub fn next_user_id(&mut self) -> UserId {
        UserId::new(bump(&mut self.sequences.users))
    }

    pub fn next_client_id(&mut self) -> ClientId {
        ClientId::new(bump(&mut self.sequences.clients))
    }

    pub fn next_interaction_id(&mut self) -> InteractionId {
        InteractionId::new(bump(&mut self.sequences.interactions))
    }

    pub fn next_property_id(&mut self) -> PropertyId {
        PropertyId::new(bump(&mut self.sequences.properties))
    }

    pub fn next_showing_id(&mut self) -> ShowingId {
        ShowingId::new(bump(&mut self.sequences.showings))
    }

    pub fn next_deal_id(&mut self) -> DealId {
        DealId::new(bump(&mut self.sequences.deals))
    }

    pub fn next_task_id(&mut self) -> TaskId {
        TaskId::new(bump(&mut self.sequences.tasks))
    }

    /// Case-insensitive username lookup.
    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        let wanted = username.trim().to_lowercase();
        self.users.values().find(|u| u.username.to_lowercase() == wanted)
    }

    /// Case-insensitive email lookup.
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = email.trim().to_lowercase();
        self.users.values().find(|u| u.email == wanted)
    }

    /// Whether `user_id` owns any record.
    pub fn owns_records(&self, user_id: UserId) -> bool {
        self.clients.values().any(|c| c.owner_id == user_id)
            || self.properties.values().any(|p| p.owner_id == user_id)
            || self.deals.values().any(|d| d.owner_id == user_id)
            || self.tasks.values().any(|t| t.owner_id == user_id)
            || self.showings.values().any(|s| s.owner_id == user_id)
    }

    /// In-progress deals that reference a client or property.
    pub fn active_deals_on(&self, client: Option<ClientId>, property: Option<PropertyId>) -> Vec<DealId> {
        self.deals
            .values()
            .filter(|d| d.is_active())
            .filter(|d| Some(d.client_id) == client || Some(d.property_id) == property)
            .map(|d| d.id)
            .collect()
    }
}

/// Storage abstraction the service runs against.
pub trait CrmStore: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R;

    /// Run `f` under exclusive access. `f` must not mutate before it has
    /// decided to succeed.
    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<R>) -> DomainResult<R>;
}

impl<S> CrmStore for Arc<S>
where
    S: CrmStore,
{
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        (**self).read(f)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<R>) -> DomainResult<R> {
        (**self).write(f)
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            inner: RwLock::new(tables),
        }
    }

    /// Copy of every table, e.g. to persist with serde.
    pub fn snapshot(&self) -> Tables {
        self.read(Tables::clone)
    }
}

impl CrmStore for InMemoryStore {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<R>) -> DomainResult<R> {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn ids_are_sequential_per_table() {
        let mut tables = Tables::default();
        assert_eq!(tables.next_client_id(), ClientId::new(1));
        assert_eq!(tables.next_client_id(), ClientId::new(2));
        assert_eq!(tables.next_deal_id(), DealId::new(1));
    }

    #[test]
    fn missing_records_are_not_found() {
        let tables = Tables::default();
        let err = tables.deal(DealId::new(4)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "deal 4 not found");
    }

    #[test]
    fn failed_write_leaves_tables_untouched() {
        let store = InMemoryStore::new();
        let result: DomainResult<()> = store.write(|_| Err(DomainError::conflict("nope")));
        assert!(result.is_err());
        assert_eq!(store.snapshot(), Tables::default());

        store
            .write(|t| {
                let id = t.next_user_id();
                let admin = User::bootstrap_admin(id, "root", "root@agency.test", Utc::now())?;
                t.users.insert(id, admin);
                Ok(())
            })
            .unwrap();
        assert!(store.read(|t| t.user_by_name("ROOT").is_some()));
        assert!(store.read(|t| t.user_by_email(" Root@Agency.test").is_some()));
    }

    #[test]
    fn shared_store_sees_the_same_tables() {
        let shared = Arc::new(InMemoryStore::new());
        let other = Arc::clone(&shared);
        shared
            .write(|t| {
                t.next_task_id();
                Ok(())
            })
            .unwrap();
        assert_eq!(other.write(|t| Ok(t.next_task_id())).unwrap(), TaskId::new(2));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let store = InMemoryStore::new();
        store
            .write(|t| {
                let id = t.next_user_id();
                t.users.insert(id, User::bootstrap_admin(id, "root", "root@agency.test", Utc::now())?);
                Ok(())
            })
            .unwrap();
        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored = InMemoryStore::from_tables(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot(), store.snapshot());
    }
}
