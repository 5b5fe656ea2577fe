//! Read-side aggregation: sales reports, staff summaries and dashboards.
//!
//! Everything here is a pure function of the records it is handed. Callers
//! pass records that already went through the visibility filter.

pub mod dashboard;
pub mod period;
pub mod report;
pub mod staff;

pub use dashboard::{Dashboard, UPCOMING_LIMIT, build_dashboard};
pub use period::{ReportPeriod, YearMonth};
pub use report::{CategoryCount, MonthlyBucket, Report, Totals, build_report};
pub use staff::{StaffSummary, summarize_staff};
