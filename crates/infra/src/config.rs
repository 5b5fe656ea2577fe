//! Configuration loading and representation.
//!
//! Read once at startup from `ESTATECRM_*` environment variables. Every key
//! is optional; invalid values are an error rather than a silent default.

use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use estatecrm_core::{CommissionRate, DomainResult};
use estatecrm_observability::LogFormat;
use estatecrm_reporting::ReportPeriod;

pub const DEFAULT_COMMISSION_RATE_VAR: &str = "ESTATECRM_DEFAULT_COMMISSION_RATE";
pub const REPORT_MONTHS_VAR: &str = "ESTATECRM_REPORT_MONTHS";
pub const LOG_FILTER_VAR: &str = "ESTATECRM_LOG";
pub const LOG_JSON_VAR: &str = "ESTATECRM_LOG_JSON";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    /// Applied to deals opened without their own rate.
    pub default_commission_rate: CommissionRate,
    /// Trailing months of the default report period; `None` reports on the
    /// current calendar year.
    pub report_months: Option<u32>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            default_commission_rate: CommissionRate::default(),
            report_months: None,
            log_filter: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl CrmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(DEFAULT_COMMISSION_RATE_VAR) {
            let fraction = Decimal::from_str(raw.trim())
                .map_err(|e| ConfigError::invalid(DEFAULT_COMMISSION_RATE_VAR, &raw, e))?;
            config.default_commission_rate = CommissionRate::new(fraction)
                .map_err(|e| ConfigError::invalid(DEFAULT_COMMISSION_RATE_VAR, &raw, e))?;
        }

        if let Some(raw) = lookup(REPORT_MONTHS_VAR) {
            let months = raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid(REPORT_MONTHS_VAR, &raw, e))?;
            if months == 0 || months > 120 {
                return Err(ConfigError::invalid(REPORT_MONTHS_VAR, &raw, "expected 1..=120"));
            }
            config.report_months = Some(months);
        }

        if let Some(raw) = lookup(LOG_FILTER_VAR) {
            if raw.trim().is_empty() {
                return Err(ConfigError::invalid(LOG_FILTER_VAR, &raw, "filter cannot be empty"));
            }
            config.log_filter = raw.trim().to_string();
        }

        if let Some(raw) = lookup(LOG_JSON_VAR) {
            let json = raw
                .trim()
                .parse::<bool>()
                .map_err(|e| ConfigError::invalid(LOG_JSON_VAR, &raw, e))?;
            config.log_format = if json { LogFormat::Json } else { LogFormat::Pretty };
        }

        Ok(config)
    }

    /// The period reported on when the caller does not pick one.
    pub fn default_report_period(&self, today: NaiveDate) -> DomainResult<ReportPeriod> {
        match self.report_months {
            Some(months) => ReportPeriod::trailing_months(today, months),
            None => ReportPeriod::calendar_year(chrono::Datelike::year(&today)),
        }
    }

    /// Install the process-wide tracing subscriber described by this config.
    pub fn init_observability(&self) -> bool {
        estatecrm_observability::init(&self.log_filter, self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<CrmConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CrmConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = load(&[]).unwrap();
        assert_eq!(config, CrmConfig::default());
        assert_eq!(config.default_commission_rate.to_string(), "3%");
    }

    #[test]
    fn reads_every_key() {
        let config = load(&[
            (DEFAULT_COMMISSION_RATE_VAR, "0.025"),
            (REPORT_MONTHS_VAR, " 6 "),
            (LOG_FILTER_VAR, "estatecrm=debug"),
            (LOG_JSON_VAR, "false"),
        ])
        .unwrap();
        assert_eq!(config.default_commission_rate.as_fraction(), Decimal::new(25, 3));
        assert_eq!(config.report_months, Some(6));
        assert_eq!(config.log_filter, "estatecrm=debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_invalid_values() {
        for (key, value) in [
            (DEFAULT_COMMISSION_RATE_VAR, "three percent"),
            (DEFAULT_COMMISSION_RATE_VAR, "1.5"),
            (REPORT_MONTHS_VAR, "0"),
            (REPORT_MONTHS_VAR, "-3"),
            (LOG_FILTER_VAR, "  "),
            (LOG_JSON_VAR, "yes"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            let ConfigError::Invalid { key: failed, .. } = err;
            assert_eq!(failed, key, "{value}");
        }
    }

    #[test]
    fn default_period_follows_report_months() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let year = CrmConfig::default().default_report_period(today).unwrap();
        assert_eq!(year.months().len(), 12);

        let trailing = load(&[(REPORT_MONTHS_VAR, "3")])
            .unwrap()
            .default_report_period(today)
            .unwrap();
        assert_eq!(trailing.start(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(trailing.end(), today);
    }
}
