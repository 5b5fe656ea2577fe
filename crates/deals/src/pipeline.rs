//! Deal pipeline state machine.
//!
//! ```text
//! initiated -> negotiation -> under_contract -> closed
//!     \             \               \
//!      +-------------+---------------+--> cancelled
//! ```
//!
//! Closing settles the deal's property (sold for a sale listing, rented for
//! a rental). The new deal and property come back together in a
//! [`StageChange`] so the store can write both or neither.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use estatecrm_core::{DomainError, DomainResult, Money};
use estatecrm_listings::Property;

use crate::deal::{Deal, DealStage};

/// Result of a successful stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub from: DealStage,
    pub to: DealStage,
    pub deal: Deal,
    /// The settled property; only present when the deal closed.
    pub property: Option<Property>,
    /// Commission earned; only present when the deal closed.
    pub commission: Option<Money>,
}

pub fn validate_transition(from: DealStage, to: DealStage) -> DomainResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::illegal_transition(from, to))
    }
}

/// Move `deal` to `target`.
///
/// `property` must be the deal's property; it is only modified when closing.
/// `today` is stamped as the closing date if the deal closes without one.
/// Nothing is changed on error.
pub fn apply_transition(
    deal: &Deal,
    property: &Property,
    target: DealStage,
    today: NaiveDate,
) -> DomainResult<StageChange> {
    validate_transition(deal.stage, target)?;

    if property.id != deal.property_id {
        return Err(DomainError::invariant(format!(
            "deal {} is on property {}, not {}",
            deal.id, deal.property_id, property.id
        )));
    }

    let mut next = deal.clone();
    next.stage = target;

    if target != DealStage::Closed {
        tracing::debug!(deal_id = %deal.id, from = %deal.stage, to = %target, "deal stage changed");
        return Ok(StageChange {
            from: deal.stage,
            to: target,
            deal: next,
            property: None,
            commission: None,
        });
    }

    if deal.final_price.is_none() {
        return Err(DomainError::MissingFinalPrice {
            deal_id: deal.id.get(),
        });
    }
    let settled = property.settle(deal.id)?;
    next.closing_date = Some(deal.closing_date.unwrap_or(today));
    let commission = next.commission();

    tracing::debug!(
        deal_id = %deal.id,
        property_id = %property.id,
        property_status = %settled.status(),
        "deal closed"
    );

    Ok(StageChange {
        from: deal.stage,
        to: target,
        deal: next,
        property: Some(settled),
        commission,
    })
}
