use estatecrm_core::{Clock, DomainResult, UserId};
use estatecrm_reporting::{Dashboard, Report, ReportPeriod, build_dashboard, build_report};

use super::{CrmService, acting};
use crate::store::CrmStore;

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    /// Sales report over the actor's visible records. Without a period the
    /// configured default applies.
    pub fn report(&self, actor_id: UserId, period: Option<ReportPeriod>) -> DomainResult<Report> {
        let period = match period {
            Some(period) => period,
            None => self.config.default_report_period(self.clock.today())?,
        };
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let report = build_report(
                actor.visible(t.deals.values()),
                actor.visible(t.clients.values()),
                actor.visible(t.properties.values()),
                &period,
                &self.clock,
            );
            tracing::debug!(
                actor_id = %actor_id,
                start = %period.start(),
                end = %period.end(),
                deals = report.period_totals.deal_count,
                "report built"
            );
            Ok(report)
        })
    }

    pub fn dashboard(&self, actor_id: UserId) -> DomainResult<Dashboard> {
        let now = self.clock.now();
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            Ok(build_dashboard(
                &actor.visible(t.clients.values()),
                &actor.visible(t.properties.values()),
                &actor.visible(t.deals.values()),
                &actor.visible(t.tasks.values()),
                &actor.visible(t.showings.values()),
                now,
            ))
        })
    }
}
