use rust_decimal::Decimal;

use estatecrm_auth::Action;
use estatecrm_core::{Clock, CommissionRate, DealId, DomainError, DomainResult, Money, UserId};
use estatecrm_deals::{Deal, DealStage, DealUpdate, NewDeal, StageChange, apply_transition, compute_commission};

use super::{CrmService, acting, check, check_owner};
use crate::store::CrmStore;

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    /// Open a deal at `initiated`. The configured default rate applies when
    /// the deal carries none.
    pub fn open_deal(&self, actor_id: UserId, new: NewDeal) -> DomainResult<Deal> {
        let now = self.clock.now();
        let default_rate = self.config.default_commission_rate;
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check_owner(&actor, new.owner_id)?;
            t.user(new.owner_id)?;
            check(&actor, t.client(new.client_id)?, Action::View)?;
            check(&actor, t.property(new.property_id)?, Action::View)?;

            let property_id = new.property_id;
            let id = t.next_deal_id();
            let deal = Deal::open(id, new, t.property(property_id)?, default_rate, now)?;
            t.deals.insert(id, deal.clone());
            tracing::info!(
                actor_id = %actor_id,
                deal_id = %id,
                property_id = %deal.property_id,
                rate = %deal.commission_rate,
                "deal opened"
            );
            Ok(deal)
        })
    }

    /// Visible deals, optionally restricted to one stage, newest first.
    pub fn list_deals(&self, actor_id: UserId, stage: Option<DealStage>) -> DomainResult<Vec<Deal>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let mut deals: Vec<Deal> = actor
                .visible(t.deals.values())
                .into_iter()
                .filter(|d| stage.is_none_or(|s| d.stage() == s))
                .cloned()
                .collect();
            deals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            tracing::debug!(actor_id = %actor_id, count = deals.len(), "listed deals");
            Ok(deals)
        })
    }

    pub fn get_deal(&self, actor_id: UserId, deal_id: DealId) -> DomainResult<Deal> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let deal = t.deal(deal_id)?;
            check(&actor, deal, Action::View)?;
            Ok(deal.clone())
        })
    }

    /// Edit an open deal (prices, rate, closing date, notes).
    pub fn update_deal(&self, actor_id: UserId, deal_id: DealId, update: DealUpdate) -> DomainResult<Deal> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let deal = t.deal(deal_id)?;
            check(&actor, deal, Action::Edit)?;
            let updated = deal.update(update)?;
            t.deals.insert(deal_id, updated.clone());
            tracing::info!(actor_id = %actor_id, deal_id = %deal_id, "deal updated");
            Ok(updated)
        })
    }

    /// Hand an in-progress deal to another agent.
    pub fn reassign_deal(&self, actor_id: UserId, deal_id: DealId, owner_id: UserId) -> DomainResult<Deal> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let deal = t.deal(deal_id)?;
            check(&actor, deal, Action::Edit)?;
            check_owner(&actor, owner_id)?;
            t.user(owner_id)?;

            let reassigned = deal.reassign(owner_id)?;
            t.deals.insert(deal_id, reassigned.clone());
            tracing::info!(actor_id = %actor_id, deal_id = %deal_id, owner_id = %owner_id, "deal reassigned");
            Ok(reassigned)
        })
    }

    /// Move a deal along the pipeline.
    ///
    /// Closing also settles the property; the deal and the property are
    /// written under one write guard, or not at all.
    pub fn change_deal_stage(&self, actor_id: UserId, deal_id: DealId, target: DealStage) -> DomainResult<StageChange> {
        let today = self.clock.today();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let deal = t.deal(deal_id)?;
            check(&actor, deal, Action::Edit)?;
            let property = t.property(deal.property_id)?;

            let change = apply_transition(deal, property, target, today).inspect_err(|e| {
                tracing::warn!(actor_id = %actor_id, deal_id = %deal_id, to = %target, error = %e, "stage change rejected");
            })?;

            t.deals.insert(deal_id, change.deal.clone());
            if let Some(settled) = &change.property {
                t.properties.insert(settled.id, settled.clone());
            }
            tracing::info!(
                actor_id = %actor_id,
                deal_id = %deal_id,
                from = %change.from,
                to = %change.to,
                commission = ?change.commission.map(|c| c.to_string()),
                "deal stage changed"
            );
            Ok(change)
        })
    }

    /// Delete a deal that has not closed. Closed deals settled their
    /// property and stay as history.
    pub fn delete_deal(&self, actor_id: UserId, deal_id: DealId) -> DomainResult<()> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let deal = t.deal(deal_id)?;
            check(&actor, deal, Action::Delete)?;
            if deal.is_closed() {
                return Err(DomainError::conflict(format!(
                    "deal {deal_id} is closed and kept as history"
                )));
            }
            t.deals.remove(&deal_id);
            tracing::info!(actor_id = %actor_id, deal_id = %deal_id, "deal deleted");
            Ok(())
        })
    }

    /// Commission a final price would earn, at `rate` or the configured
    /// default. For forms that show the figure before anything is saved.
    pub fn preview_commission(&self, final_price: Decimal, rate: Option<Decimal>) -> DomainResult<Money> {
        let rate = rate.unwrap_or_else(|| self.config.default_commission_rate.as_fraction());
        compute_commission(final_price, rate)
    }

    pub fn default_commission_rate(&self) -> CommissionRate {
        self.config.default_commission_rate
    }
}
