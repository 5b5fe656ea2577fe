//! Client interaction log (calls, emails, meetings, ...).
//!
//! Entries are append-only: once recorded they are never edited. Fields are
//! private and only exposed through getters.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{ClientId, DomainError, DomainResult, Entity, InteractionId};

use crate::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Call,
    Email,
    Meeting,
    Showing,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    id: InteractionId,
    client_id: ClientId,
    kind: InteractionKind,
    subject: Option<String>,
    note: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl Interaction {
    /// Record an interaction with `client`.
    pub fn record(
        id: InteractionId,
        client: &Client,
        kind: InteractionKind,
        subject: Option<String>,
        note: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let subject = subject.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let note = note.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if subject.is_none() && note.is_none() {
            return Err(DomainError::validation(
                "interaction needs a subject or a note",
            ));
        }

        Ok(Self {
            id,
            client_id: client.id,
            kind,
            subject,
            note,
            occurred_at,
        })
    }

    pub fn id(&self) -> InteractionId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Entity for Interaction {
    type Id = InteractionId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Append-only collection of interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionLog {
    entries: Vec<Interaction>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. An id that is already logged is a conflict; entries
    /// are never replaced.
    pub fn append(&mut self, interaction: Interaction) -> DomainResult<()> {
        if self.entries.iter().any(|e| e.id == interaction.id) {
            return Err(DomainError::conflict(format!(
                "interaction {} already recorded",
                interaction.id
            )));
        }
        self.entries.push(interaction);
        Ok(())
    }

    /// Entries for one client, newest first.
    pub fn for_client(&self, client_id: ClientId) -> Vec<&Interaction> {
        let mut entries: Vec<&Interaction> = self
            .entries
            .iter()
            .filter(|e| e.client_id == client_id)
            .collect();
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        entries
    }

    /// Drop every entry of a deleted client.
    pub fn remove_client(&mut self, client_id: ClientId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.client_id != client_id);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Interactions inherit visibility from their parent client: keep the ones
/// whose client is in `visible_clients`, in their original order.
pub fn visible_interactions<'a, I>(interactions: I, visible_clients: &[&Client]) -> Vec<&'a Interaction>
where
    I: IntoIterator<Item = &'a Interaction>,
{
    let visible: HashSet<ClientId> = visible_clients.iter().map(|c| c.id).collect();
    interactions
        .into_iter()
        .filter(|i| visible.contains(&i.client_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BudgetRange, ClientStatus, ClientType, NewClient};
    use chrono::TimeZone;
    use estatecrm_core::UserId;

    fn client(id: u64, owner: u64) -> Client {
        Client::register(
            ClientId::new(id),
            NewClient {
                owner_id: UserId::new(owner),
                first_name: "Sam".to_string(),
                last_name: format!("Client{id}"),
                email: None,
                phone: None,
                client_type: ClientType::Seller,
                status: ClientStatus::Prospect,
                budget: BudgetRange::unbounded(),
                preferred_location: None,
                lead_source: None,
                notes: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn call(id: u64, client: &Client, hour: u32) -> Interaction {
        Interaction::record(
            InteractionId::new(id),
            client,
            InteractionKind::Call,
            Some(format!("call {id}")),
            None,
            at(hour),
        )
        .unwrap()
    }

    #[test]
    fn record_requires_content() {
        let c = client(1, 1);
        let err = Interaction::record(
            InteractionId::new(1),
            &c,
            InteractionKind::Note,
            Some("  ".to_string()),
            None,
            at(9),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn log_is_append_only() {
        let c = client(1, 1);
        let mut log = InteractionLog::new();
        log.append(call(1, &c, 9)).unwrap();

        let mut replacement = call(1, &c, 10);
        replacement.subject = Some("rewritten".to_string());
        assert!(matches!(log.append(replacement), Err(DomainError::Conflict(_))));
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().next().unwrap().subject(), Some("call 1"));
    }

    #[test]
    fn for_client_is_newest_first() {
        let a = client(1, 1);
        let b = client(2, 1);
        let mut log = InteractionLog::new();
        log.append(call(1, &a, 9)).unwrap();
        log.append(call(2, &b, 10)).unwrap();
        log.append(call(3, &a, 11)).unwrap();

        let ids: Vec<u64> = log.for_client(a.id).iter().map(|i| i.id().get()).collect();
        assert_eq!(ids, vec![3, 1]);

        assert_eq!(log.remove_client(a.id), 2);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn visibility_follows_parent_client() {
        let mine = client(1, 5);
        let theirs = client(2, 7);
        let entries = [call(1, &mine, 9), call(2, &theirs, 10), call(3, &mine, 11)];

        let visible = visible_interactions(&entries, &[&mine]);
        let ids: Vec<u64> = visible.iter().map(|i| i.id().get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
