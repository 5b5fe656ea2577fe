//! `estatecrm-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{Entity, Owned};
pub use error::{DomainError, DomainResult};
pub use id::{ClientId, DealId, InteractionId, PropertyId, ShowingId, TaskId, UserId};
pub use money::{CommissionRate, MAX_RATE_SCALE, Money};
pub use value_object::ValueObject;
