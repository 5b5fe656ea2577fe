use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{DealId, DomainError, DomainResult, Entity, Money, Owned, PropertyId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Land,
    Commercial,
}

/// Whether the property is listed for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

/// Listing status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Available,
    Pending,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Pending => "pending",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
        }
    }

    /// Sold and rented are reached only by closing a deal.
    pub fn is_settled(&self) -> bool {
        matches!(self, PropertyStatus::Sold | PropertyStatus::Rented)
    }
}

impl core::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property listing owned by one agent.
///
/// # Invariants
/// - `status` is sold/rented only when `settled_by` names the closed deal
///   that settled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub title: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    status: PropertyStatus,
    pub price: Money,
    pub address: String,
    pub city: Option<String>,
    pub description: Option<String>,
    settled_by: Option<DealId>,
    pub created_at: DateTime<Utc>,
}

/// Input for listing a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
    pub owner_id: UserId,
    pub title: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: Money,
    pub address: String,
    pub city: Option<String>,
    pub description: Option<String>,
}

/// Partial update of a listing. `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    pub title: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub status: Option<PropertyStatus>,
    pub price: Option<Money>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
}

impl Property {
    pub fn list(id: PropertyId, new: NewProperty, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            owner_id: new.owner_id,
            title: required("title", &new.title)?,
            property_type: new.property_type,
            listing_type: new.listing_type,
            status: PropertyStatus::Available,
            price: new.price,
            address: required("address", &new.address)?,
            city: new.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            description: new.description,
            settled_by: None,
            created_at: now,
        })
    }

    pub fn status(&self) -> PropertyStatus {
        self.status
    }

    /// The closed deal that sold or rented this property.
    pub fn settled_by(&self) -> Option<DealId> {
        self.settled_by
    }

    pub fn update(&self, update: PropertyUpdate) -> DomainResult<Self> {
        let mut next = self.clone();

        if let Some(status) = update.status {
            if status.is_settled() {
                return Err(DomainError::invariant(format!(
                    "a property becomes {status} only by closing a deal"
                )));
            }
            if self.status.is_settled() && status != self.status {
                return Err(DomainError::invariant(format!(
                    "property {} is already {}",
                    self.id, self.status
                )));
            }
            next.status = status;
        }
        if let Some(listing_type) = update.listing_type {
            if self.status.is_settled() && listing_type != self.listing_type {
                return Err(DomainError::invariant(
                    "cannot change the listing type of a settled property",
                ));
            }
            next.listing_type = listing_type;
        }
        if let Some(title) = update.title {
            next.title = required("title", &title)?;
        }
        if let Some(address) = update.address {
            next.address = required("address", &address)?;
        }
        if let Some(property_type) = update.property_type {
            next.property_type = property_type;
        }
        if let Some(price) = update.price {
            next.price = price;
        }
        if update.city.is_some() {
            next.city = update.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        }
        if update.description.is_some() {
            next.description = update.description;
        }

        Ok(next)
    }

    /// Mark the property sold (sale listing) or rented (rent listing) as the
    /// effect of closing `deal_id`.
    pub fn settle(&self, deal_id: DealId) -> DomainResult<Self> {
        if self.status.is_settled() {
            return Err(DomainError::invariant(format!(
                "property {} is already {}",
                self.id, self.status
            )));
        }
        let status = match self.listing_type {
            ListingType::Sale => PropertyStatus::Sold,
            ListingType::Rent => PropertyStatus::Rented,
        };
        Ok(Self {
            status,
            settled_by: Some(deal_id),
            ..self.clone()
        })
    }
}

impl Entity for Property {
    type Id = PropertyId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for Property {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Property list filter: exact status/type/listing plus a case-insensitive
/// search over title, address and city.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub search: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if self.status.is_some_and(|s| s != property.status) {
            return false;
        }
        if self.property_type.is_some_and(|t| t != property.property_type) {
            return false;
        }
        if self.listing_type.is_some_and(|l| l != property.listing_type) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    Some(property.title.as_str()),
                    Some(property.address.as_str()),
                    property.city.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}
