use serde::{Deserialize, Serialize};

use estatecrm_auth::{Role, User, UserStatus};
use estatecrm_clients::Client;
use estatecrm_core::{Money, Owned, UserId};
use estatecrm_deals::Deal;
use estatecrm_listings::Property;

/// Per-member workload and results, as shown on the staff pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub clients: usize,
    pub properties: usize,
    pub deals_total: usize,
    pub deals_closed: usize,
    pub deals_active: usize,
    pub total_sales: Money,
    pub total_commission: Money,
}

/// Summarize the records owned by `user`. Records owned by anyone else are
/// ignored, so callers may pass whole tables.
pub fn summarize_staff<'a, D, C, P>(user: &User, deals: D, clients: C, properties: P) -> StaffSummary
where
    D: IntoIterator<Item = &'a Deal>,
    C: IntoIterator<Item = &'a Client>,
    P: IntoIterator<Item = &'a Property>,
{
    let mut summary = StaffSummary {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
        status: user.status,
        clients: clients.into_iter().filter(|c| c.owner_id() == user.id).count(),
        properties: properties.into_iter().filter(|p| p.owner_id() == user.id).count(),
        deals_total: 0,
        deals_closed: 0,
        deals_active: 0,
        total_sales: Money::ZERO,
        total_commission: Money::ZERO,
    };

    for deal in deals.into_iter().filter(|d| d.owner_id() == user.id) {
        summary.deals_total += 1;
        if deal.is_active() {
            summary.deals_active += 1;
        }
        if let Some(sale) = deal.closed_sale() {
            summary.deals_closed += 1;
            summary.total_sales += sale.sales;
            summary.total_commission += sale.commission;
        }
    }
    summary
}
