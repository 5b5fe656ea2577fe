use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{ClientId, DomainError, DomainResult, Entity, Owned, PropertyId, ShowingId, UserId};

use crate::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowingStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

/// A scheduled visit of a client to a property.
///
/// Owned by the property's agent at the time it was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showing {
    pub id: ShowingId,
    pub property_id: PropertyId,
    pub client_id: ClientId,
    pub owner_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub status: ShowingStatus,
    pub feedback: Option<String>,
}

impl Showing {
    pub fn schedule(
        id: ShowingId,
        property: &Property,
        client_id: ClientId,
        scheduled_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if property.status().is_settled() {
            return Err(DomainError::invariant(format!(
                "property {} is already {}",
                property.id,
                property.status()
            )));
        }

        Ok(Self {
            id,
            property_id: property.id,
            client_id,
            owner_id: property.owner_id,
            scheduled_at,
            status: ShowingStatus::Scheduled,
            feedback: None,
        })
    }

    /// Record the outcome of a scheduled showing.
    pub fn conclude(&self, outcome: ShowingStatus, feedback: Option<String>) -> DomainResult<Self> {
        if self.status != ShowingStatus::Scheduled {
            return Err(DomainError::invariant("only scheduled showings can be concluded"));
        }
        if outcome == ShowingStatus::Scheduled {
            return Err(DomainError::validation("outcome must not be 'scheduled'"));
        }

        Ok(Self {
            status: outcome,
            feedback: feedback.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()),
            ..self.clone()
        })
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status == ShowingStatus::Scheduled && self.scheduled_at >= now
    }
}

impl Entity for Showing {
    type Id = ShowingId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for Showing {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Up to `limit` scheduled showings at or after `now`, soonest first.
pub fn upcoming_showings<'a, I>(showings: I, now: DateTime<Utc>, limit: usize) -> Vec<&'a Showing>
where
    I: IntoIterator<Item = &'a Showing>,
{
    let mut upcoming: Vec<&Showing> = showings.into_iter().filter(|s| s.is_upcoming(now)).collect();
    upcoming.sort_by_key(|s| (s.scheduled_at, s.id));
    upcoming.truncate(limit);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListingType, NewProperty, PropertyStatus, PropertyType};
    use chrono::{Duration, TimeZone};
    use estatecrm_core::{DealId, Money};

    fn property() -> Property {
        Property::list(
            PropertyId::new(1),
            NewProperty {
                owner_id: UserId::new(4),
                title: "Maple Street House".to_string(),
                property_type: PropertyType::House,
                listing_type: ListingType::Sale,
                price: Money::from_major(400_000),
                address: "8 Maple St".to_string(),
                city: None,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn showing_inherits_property_owner() {
        let s = Showing::schedule(ShowingId::new(1), &property(), ClientId::new(2), now()).unwrap();
        assert_eq!(s.owner_id(), UserId::new(4));
        assert_eq!(s.status, ShowingStatus::Scheduled);
    }

    #[test]
    fn settled_properties_take_no_showings() {
        let sold = property().settle(DealId::new(9)).unwrap();
        assert!(Showing::schedule(ShowingId::new(1), &sold, ClientId::new(2), now()).is_err());
    }

    #[test]
    fn conclude_only_once() {
        let s = Showing::schedule(ShowingId::new(1), &property(), ClientId::new(2), now()).unwrap();
        let done = s.conclude(ShowingStatus::Completed, Some("Loved the kitchen".to_string())).unwrap();
        assert_eq!(done.status, ShowingStatus::Completed);
        assert!(done.conclude(ShowingStatus::NoShow, None).is_err());
        assert!(s.conclude(ShowingStatus::Scheduled, None).is_err());
    }

    #[test]
    fn upcoming_is_sorted_and_limited() {
        let p = property();
        let showings: Vec<Showing> = [5i64, -1, 2, 3, 1]
            .iter()
            .enumerate()
            .map(|(i, h)| {
                Showing::schedule(ShowingId::new(i as u64), &p, ClientId::new(1), now() + Duration::hours(*h))
                    .unwrap()
            })
            .collect();

        let upcoming = upcoming_showings(&showings, now(), 3);
        let ids: Vec<u64> = upcoming.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![4, 2, 3]);
    }

    #[test]
    fn status_names_on_the_wire() {
        assert_eq!(serde_json::to_string(&ShowingStatus::NoShow).unwrap(), "\"no_show\"");
        assert_eq!(
            serde_json::from_str::<PropertyStatus>("\"rented\"").unwrap(),
            PropertyStatus::Rented
        );
    }
}
