use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{
    ClientId, CommissionRate, DealId, DomainError, DomainResult, Entity, Money, Owned, PropertyId, UserId,
};
use estatecrm_listings::Property;

use crate::commission::commission_on;

/// Deal pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    #[default]
    Initiated,
    Negotiation,
    UnderContract,
    Closed,
    Cancelled,
}

impl DealStage {
    pub const ALL: [DealStage; 5] = [
        DealStage::Initiated,
        DealStage::Negotiation,
        DealStage::UnderContract,
        DealStage::Closed,
        DealStage::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::Initiated => "initiated",
            DealStage::Negotiation => "negotiation",
            DealStage::UnderContract => "under_contract",
            DealStage::Closed => "closed",
            DealStage::Cancelled => "cancelled",
        }
    }

    /// Stages reachable in one step. Terminal stages have none.
    pub fn successors(&self) -> &'static [DealStage] {
        match self {
            DealStage::Initiated => &[DealStage::Negotiation, DealStage::Cancelled],
            DealStage::Negotiation => &[DealStage::UnderContract, DealStage::Cancelled],
            DealStage::UnderContract => &[DealStage::Closed, DealStage::Cancelled],
            DealStage::Closed | DealStage::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: DealStage) -> bool {
        self.successors().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DealStage::Closed | DealStage::Cancelled)
    }
}

impl core::fmt::Display for DealStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deal between a client and a property, owned by one agent.
///
/// # Invariants
/// - The stage only moves along [`DealStage::successors`]; see
///   [`crate::pipeline::apply_transition`].
/// - A closed deal has a final price and a closing date.
/// - Terminal deals are never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub client_id: ClientId,
    pub property_id: PropertyId,
    pub owner_id: UserId,
    pub(crate) stage: DealStage,
    pub offer_price: Option<Money>,
    pub final_price: Option<Money>,
    pub commission_rate: CommissionRate,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for opening a deal. Without an explicit rate the configured default
/// applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeal {
    pub client_id: ClientId,
    pub property_id: PropertyId,
    pub owner_id: UserId,
    pub offer_price: Option<Money>,
    pub commission_rate: Option<CommissionRate>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update of an open deal. `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealUpdate {
    pub offer_price: Option<Money>,
    pub final_price: Option<Money>,
    pub commission_rate: Option<CommissionRate>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Figures of a closed deal, as consumed by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedSale {
    pub deal_id: DealId,
    pub closing_date: NaiveDate,
    pub sales: Money,
    pub commission: Money,
}

impl Deal {
    /// Open a deal on `property` at the `initiated` stage.
    pub fn open(
        id: DealId,
        new: NewDeal,
        property: &Property,
        default_rate: CommissionRate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if new.property_id != property.id {
            return Err(DomainError::invariant(format!(
                "deal references property {} but {} was given",
                new.property_id, property.id
            )));
        }
        if property.status().is_settled() {
            return Err(DomainError::invariant(format!(
                "property {} is already {}",
                property.id,
                property.status()
            )));
        }

        Ok(Self {
            id,
            client_id: new.client_id,
            property_id: new.property_id,
            owner_id: new.owner_id,
            stage: DealStage::Initiated,
            offer_price: new.offer_price,
            final_price: None,
            commission_rate: new.commission_rate.unwrap_or(default_rate),
            closing_date: new.closing_date,
            notes: trimmed(new.notes),
            created_at: now,
        })
    }

    pub fn stage(&self) -> DealStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    pub fn is_closed(&self) -> bool {
        self.stage == DealStage::Closed
    }

    pub fn update(&self, update: DealUpdate) -> DomainResult<Self> {
        self.ensure_editable()?;

        let mut next = self.clone();
        if update.offer_price.is_some() {
            next.offer_price = update.offer_price;
        }
        if update.final_price.is_some() {
            next.final_price = update.final_price;
        }
        if let Some(rate) = update.commission_rate {
            next.commission_rate = rate;
        }
        if update.closing_date.is_some() {
            next.closing_date = update.closing_date;
        }
        if update.notes.is_some() {
            next.notes = trimmed(update.notes);
        }
        Ok(next)
    }

    /// Hand an in-progress deal over to another agent. Closed and cancelled
    /// deals keep the agent they were credited to.
    pub fn reassign(&self, owner_id: UserId) -> DomainResult<Self> {
        self.ensure_editable()?;
        Ok(Self {
            owner_id,
            ..self.clone()
        })
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.stage.is_terminal() {
            return Err(DomainError::invariant(format!(
                "deal {} is {} and can no longer be edited",
                self.id, self.stage
            )));
        }
        Ok(())
    }

    /// Commission earned; defined only once the deal is closed.
    pub fn commission(&self) -> Option<Money> {
        self.closed_sale().map(|sale| sale.commission)
    }

    pub fn closed_sale(&self) -> Option<ClosedSale> {
        if self.stage != DealStage::Closed {
            return None;
        }
        let (sales, closing_date) = (self.final_price?, self.closing_date?);
        Some(ClosedSale {
            deal_id: self.id,
            closing_date,
            sales,
            commission: commission_on(sales, self.commission_rate),
        })
    }
}

impl Entity for Deal {
    type Id = DealId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for Deal {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
