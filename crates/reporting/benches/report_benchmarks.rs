use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, Utc};
use estatecrm_clients::{BudgetRange, Client, ClientStatus, ClientType, NewClient};
use estatecrm_core::{ClientId, CommissionRate, DealId, FixedClock, Money, PropertyId, UserId};
use estatecrm_deals::{Deal, DealStage, DealUpdate, NewDeal, apply_transition};
use estatecrm_listings::{ListingType, NewProperty, Property, PropertyType};
use estatecrm_reporting::{ReportPeriod, build_report};

const SOURCES: [&str; 4] = ["website", "referral", "walk-in", "open house"];

fn listing(id: u64) -> Property {
    Property::list(
        PropertyId::new(id),
        NewProperty {
            owner_id: UserId::new(id % 10),
            title: format!("Listing {id}"),
            property_type: PropertyType::House,
            listing_type: if id % 3 == 0 { ListingType::Rent } else { ListingType::Sale },
            price: Money::from_major(150_000 + id * 100),
            address: format!("{id} Elm St"),
            city: None,
            description: None,
        },
        Utc::now(),
    )
    .unwrap()
}

fn client(id: u64) -> Client {
    Client::register(
        ClientId::new(id),
        NewClient {
            owner_id: UserId::new(id % 10),
            first_name: "Bench".to_string(),
            last_name: format!("Client{id}"),
            email: None,
            phone: None,
            client_type: ClientType::Buyer,
            status: ClientStatus::Lead,
            budget: BudgetRange::unbounded(),
            preferred_location: None,
            lead_source: (id % 5 != 0).then(|| SOURCES[(id % 4) as usize].to_string()),
            notes: None,
        },
        Utc::now(),
    )
    .unwrap()
}

/// Half the deals close, spread over the year; the rest stay open.
fn dataset(size: u64) -> (Vec<Deal>, Vec<Client>, Vec<Property>) {
    let mut deals = Vec::new();
    let mut properties = Vec::new();
    for id in 0..size {
        let property = listing(id);
        let deal = Deal::open(
            DealId::new(id),
            NewDeal {
                client_id: ClientId::new(id),
                property_id: property.id,
                owner_id: property.owner_id,
                offer_price: None,
                commission_rate: None,
                closing_date: None,
                notes: None,
            },
            &property,
            CommissionRate::default(),
            Utc::now(),
        )
        .unwrap()
        .update(DealUpdate {
            final_price: Some(property.price),
            ..DealUpdate::default()
        })
        .unwrap();

        if id % 2 == 0 {
            let closing = NaiveDate::from_ymd_opt(2024, (id % 12) as u32 + 1, 15).unwrap();
            let mut current = deal;
            let mut settled = property.clone();
            for stage in [DealStage::Negotiation, DealStage::UnderContract, DealStage::Closed] {
                let change = apply_transition(&current, &property, stage, closing).unwrap();
                current = change.deal;
                if let Some(p) = change.property {
                    settled = p;
                }
            }
            deals.push(current);
            properties.push(settled);
        } else {
            deals.push(deal);
            properties.push(property);
        }
    }
    let clients = (0..size).map(client).collect();
    (deals, clients, properties)
}

fn bench_build_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_report");
    let period = ReportPeriod::calendar_year(2024).unwrap();
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());

    for size in [100u64, 1_000, 10_000].iter() {
        let (deals, clients, properties) = dataset(*size);
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::new("records", size), size, |b, _| {
            b.iter(|| {
                build_report(
                    black_box(&deals),
                    black_box(&clients),
                    black_box(&properties),
                    &period,
                    &clock,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_report);
criterion_main!(benches);
