//! Clients domain module (buyers, sellers, and their interaction history).
//!
//! Pure record logic: validation and normalization of client data. Access
//! checks and persistence belong to the caller.

pub mod client;
pub mod interaction;

pub use client::{
    BudgetRange, Client, ClientFilter, ClientStatus, ClientType, ClientUpdate, LeadSource,
    NewClient,
};
pub use interaction::{Interaction, InteractionKind, InteractionLog, visible_interactions};
