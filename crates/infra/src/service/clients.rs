use chrono::{DateTime, Utc};

use estatecrm_auth::Action;
use estatecrm_clients::{
    Client, ClientFilter, ClientUpdate, Interaction, InteractionKind, NewClient, visible_interactions,
};
use estatecrm_core::{ClientId, Clock, DomainError, DomainResult, UserId};

use super::{CrmService, acting, check, check_owner};
use crate::store::CrmStore;

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    /// Register a client owned by `new.owner_id`. Staff may only create
    /// clients for themselves.
    pub fn create_client(&self, actor_id: UserId, new: NewClient) -> DomainResult<Client> {
        let now = self.clock.now();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check_owner(&actor, new.owner_id)?;
            t.user(new.owner_id)?;

            let id = t.next_client_id();
            let client = Client::register(id, new, now)?;
            t.clients.insert(id, client.clone());
            tracing::info!(actor_id = %actor_id, client_id = %id, owner_id = %client.owner_id, "client created");
            Ok(client)
        })
    }

    /// Visible clients matching `filter`, newest first.
    pub fn list_clients(&self, actor_id: UserId, filter: &ClientFilter) -> DomainResult<Vec<Client>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let mut clients: Vec<Client> = filter
                .apply(actor.visible(t.clients.values()))
                .into_iter()
                .cloned()
                .collect();
            clients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            tracing::debug!(actor_id = %actor_id, count = clients.len(), "listed clients");
            Ok(clients)
        })
    }

    pub fn get_client(&self, actor_id: UserId, client_id: ClientId) -> DomainResult<Client> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let client = t.client(client_id)?;
            check(&actor, client, Action::View)?;
            Ok(client.clone())
        })
    }

    pub fn update_client(&self, actor_id: UserId, client_id: ClientId, update: ClientUpdate) -> DomainResult<Client> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let client = t.client(client_id)?;
            check(&actor, client, Action::Edit)?;
            let updated = client.update(update)?;
            t.clients.insert(client_id, updated.clone());
            tracing::info!(actor_id = %actor_id, client_id = %client_id, "client updated");
            Ok(updated)
        })
    }

    /// Hand a client over to another agent.
    pub fn reassign_client(&self, actor_id: UserId, client_id: ClientId, owner_id: UserId) -> DomainResult<Client> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let client = t.client(client_id)?;
            check(&actor, client, Action::Edit)?;
            check_owner(&actor, owner_id)?;
            t.user(owner_id)?;

            let reassigned = client.reassign(owner_id);
            t.clients.insert(client_id, reassigned.clone());
            tracing::info!(actor_id = %actor_id, client_id = %client_id, owner_id = %owner_id, "client reassigned");
            Ok(reassigned)
        })
    }

    /// Delete a client with its interactions and showings.
    ///
    /// Fails with `Conflict` while an in-progress deal references the client.
    /// Closed and cancelled deals are kept as history.
    pub fn delete_client(&self, actor_id: UserId, client_id: ClientId) -> DomainResult<()> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.client(client_id)?, Action::Delete)?;
            let blocking = t.active_deals_on(Some(client_id), None);
            if !blocking.is_empty() {
                return Err(DomainError::conflict(format!(
                    "client {client_id} has {} deal(s) in progress",
                    blocking.len()
                )));
            }

            t.clients.remove(&client_id);
            let interactions = t.interactions.remove_client(client_id);
            t.showings.retain(|_, s| s.client_id != client_id);
            tracing::info!(actor_id = %actor_id, client_id = %client_id, interactions, "client deleted");
            Ok(())
        })
    }

    /// Append to a client's interaction log. Defaults to now when no time
    /// is given.
    pub fn log_interaction(
        &self,
        actor_id: UserId,
        client_id: ClientId,
        kind: InteractionKind,
        subject: Option<String>,
        note: Option<String>,
        occurred_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Interaction> {
        let at = occurred_at.unwrap_or_else(|| self.clock.now());
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.client(client_id)?, Action::Edit)?;

            let id = t.next_interaction_id();
            let interaction = Interaction::record(id, t.client(client_id)?, kind, subject, note, at)?;
            t.interactions.append(interaction.clone())?;
            tracing::info!(actor_id = %actor_id, client_id = %client_id, interaction_id = %id, "interaction logged");
            Ok(interaction)
        })
    }

    /// One client's interactions, newest first.
    pub fn client_interactions(&self, actor_id: UserId, client_id: ClientId) -> DomainResult<Vec<Interaction>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.client(client_id)?, Action::View)?;
            Ok(t.interactions.for_client(client_id).into_iter().cloned().collect())
        })
    }

    /// Every interaction whose client is visible, in log order.
    pub fn list_interactions(&self, actor_id: UserId) -> DomainResult<Vec<Interaction>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let clients = actor.visible(t.clients.values());
            Ok(visible_interactions(t.interactions.iter(), &clients)
                .into_iter()
                .cloned()
                .collect())
        })
    }
}
