use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_clients::Client;
use estatecrm_core::Money;
use estatecrm_deals::Deal;
use estatecrm_listings::{Property, Showing, upcoming_showings};
use estatecrm_tasks::{Task, upcoming_tasks};

/// How many entries each dashboard list shows.
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub client_count: usize,
    pub property_count: usize,
    pub active_deals: usize,
    pub closed_commission: Money,
    pub overdue_tasks: usize,
    pub recent_clients: Vec<Client>,
    pub recent_properties: Vec<Property>,
    pub upcoming_tasks: Vec<Task>,
    pub upcoming_showings: Vec<Showing>,
}

/// Landing-page figures over the records an actor can see.
pub fn build_dashboard(
    clients: &[&Client],
    properties: &[&Property],
    deals: &[&Deal],
    tasks: &[&Task],
    showings: &[&Showing],
    now: DateTime<Utc>,
) -> Dashboard {
    let mut recent_clients: Vec<Client> = clients.iter().map(|c| (*c).clone()).collect();
    recent_clients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    recent_clients.truncate(UPCOMING_LIMIT);

    let mut recent_properties: Vec<Property> = properties.iter().map(|p| (*p).clone()).collect();
    recent_properties.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    recent_properties.truncate(UPCOMING_LIMIT);

    let today = now.date_naive();

    Dashboard {
        client_count: clients.len(),
        property_count: properties.len(),
        active_deals: deals.iter().filter(|d| d.is_active()).count(),
        closed_commission: deals.iter().filter_map(|d| d.commission()).sum(),
        overdue_tasks: tasks.iter().filter(|t| t.is_overdue(today)).count(),
        recent_clients,
        recent_properties,
        upcoming_tasks: upcoming_tasks(tasks.iter().copied(), UPCOMING_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        upcoming_showings: upcoming_showings(showings.iter().copied(), now, UPCOMING_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
    }
}
