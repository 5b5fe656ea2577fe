//! Sales report aggregation.
//!
//! Monthly sales and commission of closed deals over a period, lead-source
//! and property-status breakdowns, and year-to-date totals. Output ordering
//! is fully determined by the input, so identical inputs serialize to
//! identical bytes.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use estatecrm_clients::{Client, LeadSource};
use estatecrm_core::{Clock, Money};
use estatecrm_deals::{ClosedSale, Deal};
use estatecrm_listings::Property;

use crate::period::{ReportPeriod, YearMonth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub sales: Money,
    pub commission: Money,
    pub deal_count: u32,
}

impl Totals {
    fn add(&mut self, sale: &ClosedSale) {
        self.sales += sale.sales;
        self.commission += sale.commission;
        self.deal_count = self.deal_count.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: YearMonth,
    #[serde(flatten)]
    pub totals: Totals,
}

/// One row of a categorical breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub as_of: NaiveDate,
    /// One bucket per month of the period, chronological, zero when empty.
    pub monthly: Vec<MonthlyBucket>,
    pub period_totals: Totals,
    pub lead_sources: Vec<CategoryCount>,
    pub property_statuses: Vec<CategoryCount>,
    pub year_to_date: Totals,
}

pub fn build_report<'a, D, C, P>(
    deals: D,
    clients: C,
    properties: P,
    period: &ReportPeriod,
    clock: &impl Clock,
) -> Report
where
    D: IntoIterator<Item = &'a Deal>,
    C: IntoIterator<Item = &'a Client>,
    P: IntoIterator<Item = &'a Property>,
{
    let today = clock.today();
    let sales: Vec<ClosedSale> = deals.into_iter().filter_map(Deal::closed_sale).collect();

    let mut buckets: BTreeMap<YearMonth, Totals> =
        period.months().into_iter().map(|m| (m, Totals::default())).collect();
    let mut period_totals = Totals::default();
    for sale in sales.iter().filter(|s| period.contains(s.closing_date)) {
        if let Some(bucket) = buckets.get_mut(&YearMonth::of(sale.closing_date)) {
            bucket.add(sale);
        }
        period_totals.add(sale);
    }

    let mut year_to_date = Totals::default();
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    for sale in sales
        .iter()
        .filter(|s| year_start <= s.closing_date && s.closing_date <= today)
    {
        year_to_date.add(sale);
    }

    Report {
        period: *period,
        as_of: today,
        monthly: buckets
            .into_iter()
            .map(|(month, totals)| MonthlyBucket { month, totals })
            .collect(),
        period_totals,
        lead_sources: breakdown(
            clients
                .into_iter()
                .map(|c| LeadSource::label(c.lead_source.as_ref()).to_string()),
        ),
        property_statuses: breakdown(properties.into_iter().map(|p| p.status().as_str().to_string())),
        year_to_date,
    }
}

/// Count labels, most frequent first, ties alphabetical.
fn breakdown(labels: impl Iterator<Item = String>) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    // stable sort keeps the BTreeMap's alphabetical order within equal counts
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}
