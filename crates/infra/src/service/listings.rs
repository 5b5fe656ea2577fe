use chrono::{DateTime, Utc};

use estatecrm_auth::Action;
use estatecrm_core::{ClientId, Clock, DomainError, DomainResult, PropertyId, ShowingId, UserId};
use estatecrm_listings::{
    NewProperty, Property, PropertyFilter, PropertyUpdate, Showing, ShowingStatus, upcoming_showings,
};

use super::{CrmService, acting, check, check_owner};
use crate::store::CrmStore;

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    pub fn create_property(&self, actor_id: UserId, new: NewProperty) -> DomainResult<Property> {
        let now = self.clock.now();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check_owner(&actor, new.owner_id)?;
            t.user(new.owner_id)?;

            let id = t.next_property_id();
            let property = Property::list(id, new, now)?;
            t.properties.insert(id, property.clone());
            tracing::info!(actor_id = %actor_id, property_id = %id, owner_id = %property.owner_id, "property listed");
            Ok(property)
        })
    }

    /// Visible listings matching `filter`, newest first.
    pub fn list_properties(&self, actor_id: UserId, filter: &PropertyFilter) -> DomainResult<Vec<Property>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let mut properties: Vec<Property> = actor
                .visible(t.properties.values())
                .into_iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect();
            properties.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            tracing::debug!(actor_id = %actor_id, count = properties.len(), "listed properties");
            Ok(properties)
        })
    }

    pub fn get_property(&self, actor_id: UserId, property_id: PropertyId) -> DomainResult<Property> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let property = t.property(property_id)?;
            check(&actor, property, Action::View)?;
            Ok(property.clone())
        })
    }

    pub fn update_property(
        &self,
        actor_id: UserId,
        property_id: PropertyId,
        update: PropertyUpdate,
    ) -> DomainResult<Property> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let property = t.property(property_id)?;
            check(&actor, property, Action::Edit)?;
            let updated = property.update(update)?;
            t.properties.insert(property_id, updated.clone());
            tracing::info!(actor_id = %actor_id, property_id = %property_id, status = %updated.status(), "property updated");
            Ok(updated)
        })
    }

    /// Delete a listing with its showings.
    ///
    /// Fails with `Conflict` while an in-progress deal references it.
    pub fn delete_property(&self, actor_id: UserId, property_id: PropertyId) -> DomainResult<()> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.property(property_id)?, Action::Delete)?;
            let blocking = t.active_deals_on(None, Some(property_id));
            if !blocking.is_empty() {
                return Err(DomainError::conflict(format!(
                    "property {property_id} has {} deal(s) in progress",
                    blocking.len()
                )));
            }

            t.properties.remove(&property_id);
            t.showings.retain(|_, s| s.property_id != property_id);
            tracing::info!(actor_id = %actor_id, property_id = %property_id, "property deleted");
            Ok(())
        })
    }

    /// Schedule a showing of a listing the actor may edit, for a client the
    /// actor can see.
    pub fn schedule_showing(
        &self,
        actor_id: UserId,
        property_id: PropertyId,
        client_id: ClientId,
        scheduled_at: DateTime<Utc>,
    ) -> DomainResult<Showing> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.property(property_id)?, Action::Edit)?;
            check(&actor, t.client(client_id)?, Action::View)?;

            let id = t.next_showing_id();
            let showing = Showing::schedule(id, t.property(property_id)?, client_id, scheduled_at)?;
            t.showings.insert(id, showing.clone());
            tracing::info!(actor_id = %actor_id, showing_id = %id, property_id = %property_id, "showing scheduled");
            Ok(showing)
        })
    }

    /// Record how a scheduled showing went (completed, cancelled, no-show).
    pub fn conclude_showing(
        &self,
        actor_id: UserId,
        showing_id: ShowingId,
        outcome: ShowingStatus,
        feedback: Option<String>,
    ) -> DomainResult<Showing> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let showing = t.showing(showing_id)?;
            check(&actor, showing, Action::Edit)?;
            let concluded = showing.conclude(outcome, feedback)?;
            t.showings.insert(showing_id, concluded.clone());
            tracing::info!(actor_id = %actor_id, showing_id = %showing_id, status = ?outcome, "showing concluded");
            Ok(concluded)
        })
    }

    /// Visible showings, soonest first.
    pub fn list_showings(&self, actor_id: UserId) -> DomainResult<Vec<Showing>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let mut showings: Vec<Showing> = actor.visible(t.showings.values()).into_iter().cloned().collect();
            showings.sort_by_key(|s| (s.scheduled_at, s.id));
            Ok(showings)
        })
    }

    pub fn upcoming_showings(&self, actor_id: UserId, limit: usize) -> DomainResult<Vec<Showing>> {
        let now = self.clock.now();
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            Ok(upcoming_showings(actor.visible(t.showings.values()), now, limit)
                .into_iter()
                .cloned()
                .collect())
        })
    }
}
