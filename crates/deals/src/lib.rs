//! Deals domain module.
//!
//! Deal records, the commission calculator and the pipeline state machine.
//! Pure deterministic logic: callers hand in snapshots and persist the
//! values that come back.

pub mod commission;
pub mod deal;
pub mod pipeline;

pub use commission::{commission_on, compute_commission};
pub use deal::{ClosedSale, Deal, DealStage, DealUpdate, NewDeal};
pub use pipeline::{StageChange, apply_transition, validate_transition};
