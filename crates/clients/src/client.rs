use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{ClientId, DomainError, DomainResult, Entity, Money, Owned, UserId, ValueObject};

/// Whether a client is buying, selling, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Buyer,
    Seller,
    Both,
}

/// Client relationship lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Lead,
    Prospect,
    Active,
    Closed,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Lead => "lead",
            ClientStatus::Prospect => "prospect",
            ClientStatus::Active => "active",
            ClientStatus::Closed => "closed",
        }
    }
}

/// Where a client relationship came from (referral, website, ...).
///
/// Normalized to trimmed lowercase so "Referral" and "referral " count as
/// the same source in reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadSource(String);

impl LeadSource {
    /// Report label for clients without a lead source.
    pub const UNKNOWN: &'static str = "unknown";

    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Report label, falling back to [`LeadSource::UNKNOWN`].
    pub fn label(source: Option<&LeadSource>) -> &str {
        source.map(LeadSource::as_str).unwrap_or(Self::UNKNOWN)
    }
}

impl core::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Budget range a client is working with. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BudgetBounds", into = "BudgetBounds")]
pub struct BudgetRange {
    min: Option<Money>,
    max: Option<Money>,
}

/// Unchecked wire form of [`BudgetRange`].
#[derive(Serialize, Deserialize)]
struct BudgetBounds {
    min: Option<Money>,
    max: Option<Money>,
}

impl TryFrom<BudgetBounds> for BudgetRange {
    type Error = DomainError;

    fn try_from(bounds: BudgetBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.min, bounds.max)
    }
}

impl From<BudgetRange> for BudgetBounds {
    fn from(range: BudgetRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

impl BudgetRange {
    pub fn new(min: Option<Money>, max: Option<Money>) -> DomainResult<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(DomainError::validation(format!(
                    "budget minimum {lo} exceeds maximum {hi}"
                )));
            }
        }
        Ok(Self { min, max })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn min(&self) -> Option<Money> {
        self.min
    }

    pub fn max(&self) -> Option<Money> {
        self.max
    }

    pub fn contains(&self, price: Money) -> bool {
        self.min.is_none_or(|lo| price >= lo) && self.max.is_none_or(|hi| price <= hi)
    }
}

impl ValueObject for BudgetRange {}

/// A client (buyer and/or seller) owned by one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub owner_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub client_type: ClientType,
    pub status: ClientStatus,
    pub budget: BudgetRange,
    pub preferred_location: Option<String>,
    pub lead_source: Option<LeadSource>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub owner_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub client_type: ClientType,
    pub status: ClientStatus,
    pub budget: BudgetRange,
    pub preferred_location: Option<String>,
    pub lead_source: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of a client's details. `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub client_type: Option<ClientType>,
    pub status: Option<ClientStatus>,
    pub budget: Option<BudgetRange>,
    pub preferred_location: Option<String>,
    pub lead_source: Option<String>,
    pub notes: Option<String>,
}

impl Client {
    pub fn register(id: ClientId, new: NewClient, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            owner_id: new.owner_id,
            first_name: required_name("first name", &new.first_name)?,
            last_name: required_name("last name", &new.last_name)?,
            email: optional_text(new.email),
            phone: optional_text(new.phone),
            client_type: new.client_type,
            status: new.status,
            budget: new.budget,
            preferred_location: optional_text(new.preferred_location),
            lead_source: new.lead_source.as_deref().and_then(LeadSource::parse),
            notes: optional_text(new.notes),
            created_at: now,
        })
    }

    pub fn update(&self, update: ClientUpdate) -> DomainResult<Self> {
        let mut next = self.clone();
        if let Some(first) = update.first_name {
            next.first_name = required_name("first name", &first)?;
        }
        if let Some(last) = update.last_name {
            next.last_name = required_name("last name", &last)?;
        }
        if update.email.is_some() {
            next.email = optional_text(update.email);
        }
        if update.phone.is_some() {
            next.phone = optional_text(update.phone);
        }
        if let Some(client_type) = update.client_type {
            next.client_type = client_type;
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(budget) = update.budget {
            next.budget = budget;
        }
        if update.preferred_location.is_some() {
            next.preferred_location = optional_text(update.preferred_location);
        }
        if let Some(source) = update.lead_source {
            next.lead_source = LeadSource::parse(&source);
        }
        if update.notes.is_some() {
            next.notes = optional_text(update.notes);
        }
        Ok(next)
    }

    /// Hand the client over to another agent.
    pub fn reassign(&self, owner_id: UserId) -> Self {
        Self {
            owner_id,
            ..self.clone()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for Client {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Client list filter: exact status/type plus a case-insensitive search over
/// name, email and phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    pub client_type: Option<ClientType>,
    pub search: Option<String>,
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        if self.status.is_some_and(|s| s != client.status) {
            return false;
        }
        if self.client_type.is_some_and(|t| t != client.client_type) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    Some(client.first_name.as_str()),
                    Some(client.last_name.as_str()),
                    client.email.as_deref(),
                    client.phone.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    pub fn apply<'a, I>(&self, clients: I) -> Vec<&'a Client>
    where
        I: IntoIterator<Item = &'a Client>,
    {
        clients.into_iter().filter(|c| self.matches(c)).collect()
    }
}

fn required_name(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client() -> NewClient {
        NewClient {
            owner_id: UserId::new(5),
            first_name: "Maria".to_string(),
            last_name: "Lopez".to_string(),
            email: Some("maria@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            client_type: ClientType::Buyer,
            status: ClientStatus::Lead,
            budget: BudgetRange::new(Some(Money::from_major(200_000)), Some(Money::from_major(300_000)))
                .unwrap(),
            preferred_location: None,
            lead_source: Some(" Referral ".to_string()),
            notes: Some("   ".to_string()),
        }
    }

    #[test]
    fn register_normalizes_input() {
        let client = Client::register(ClientId::new(1), new_client(), Utc::now()).unwrap();
        assert_eq!(client.full_name(), "Maria Lopez");
        assert_eq!(client.lead_source, LeadSource::parse("referral"));
        assert_eq!(client.notes, None);
        assert_eq!(client.owner_id(), UserId::new(5));
    }

    #[test]
    fn register_requires_names() {
        let mut input = new_client();
        input.last_name = " ".to_string();
        let err = Client::register(ClientId::new(1), input, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("last name"));
    }

    #[test]
    fn budget_bounds_must_be_ordered() {
        let err = BudgetRange::new(Some(Money::from_major(10)), Some(Money::from_major(5))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let open_top = BudgetRange::new(Some(Money::from_major(10)), None).unwrap();
        assert!(open_top.contains(Money::from_major(1_000_000)));
        assert!(!open_top.contains(Money::from_major(9)));
        assert!(BudgetRange::unbounded().contains(Money::ZERO));
    }

    #[test]
    fn blank_lead_source_is_unknown() {
        assert_eq!(LeadSource::parse("  "), None);
        assert_eq!(LeadSource::label(None), "unknown");
        let web = LeadSource::parse("Website").unwrap();
        assert_eq!(LeadSource::label(Some(&web)), "website");
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let client = Client::register(ClientId::new(1), new_client(), Utc::now()).unwrap();
        let updated = client
            .update(ClientUpdate {
                status: Some(ClientStatus::Active),
                lead_source: Some(String::new()),
                ..ClientUpdate::default()
            })
            .unwrap();
        assert_eq!(updated.status, ClientStatus::Active);
        assert_eq!(updated.lead_source, None);
        assert_eq!(updated.email, client.email);
        assert_eq!(updated.id, client.id);
    }

    #[test]
    fn filter_searches_name_email_and_phone() {
        let client = Client::register(ClientId::new(1), new_client(), Utc::now()).unwrap();
        let by = |search: &str| ClientFilter {
            search: Some(search.to_string()),
            ..ClientFilter::default()
        };
        assert!(by("LOPEZ").matches(&client));
        assert!(by("example.com").matches(&client));
        assert!(by("0100").matches(&client));
        assert!(!by("smith").matches(&client));

        let sellers = ClientFilter {
            client_type: Some(ClientType::Seller),
            ..ClientFilter::default()
        };
        assert!(sellers.apply([&client]).is_empty());
    }

    #[test]
    fn lead_source_serializes_as_plain_string() {
        let source = LeadSource::parse(" Referral ").unwrap();
        assert_eq!(serde_json::to_string(&source).unwrap(), "\"referral\"");
        assert_eq!(serde_json::to_string(&ClientStatus::Prospect).unwrap(), "\"prospect\"");
    }

    #[test]
    fn inverted_budget_is_rejected_on_deserialize() {
        let range: BudgetRange = serde_json::from_str(r#"{"min":100,"max":500}"#).unwrap();
        assert_eq!(range.max(), Some(Money::from_minor(500)));
        assert_eq!(serde_json::to_string(&range).unwrap(), r#"{"min":100,"max":500}"#);

        let err = serde_json::from_str::<BudgetRange>(r#"{"min":500,"max":100}"#).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
