use rust_decimal::Decimal;

use crate::models::config::CeilingConfig;
use crate::models::report::{CeilingAssessment, CeilingStatus};

/// Ceiling and warning level used to classify a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CeilingPolicy {
    pub limit: Decimal,
    pub warning_percent: Decimal,
}

impl CeilingPolicy {
    pub fn new(limit: Decimal) -> Self {
        Self {
            limit,
            warning_percent: Decimal::from(80),
        }
    }

    pub fn with_warning_percent(mut self, warning_percent: Decimal) -> Self {
        self.warning_percent = warning_percent;
        self
    }
}

impl Default for CeilingPolicy {
    fn default() -> Self {
        Self::from(&CeilingConfig::default())
    }
}

impl From<&CeilingConfig> for CeilingPolicy {
    fn from(config: &CeilingConfig) -> Self {
        Self {
            limit: config.limit,
            warning_percent: config.warning_percent,
        }
    }
}

/// `total` as a percentage of `limit`, or `None` when it cannot be
/// represented (zero limit, overflow on both orderings).
fn percent_of(total: Decimal, limit: Decimal) -> Option<Decimal> {
    match total.checked_mul(Decimal::ONE_HUNDRED) {
        Some(scaled) => scaled.checked_div(limit),
        None => total.checked_div(limit)?.checked_mul(Decimal::ONE_HUNDRED),
    }
}

/// Measure `total` against the De Minimis ceiling.
pub fn assess_ceiling(total: Decimal, policy: &CeilingPolicy) -> CeilingAssessment {
    let percent_used = percent_of(total, policy.limit)
        .unwrap_or(if total.is_zero() { Decimal::ZERO } else { Decimal::ONE_HUNDRED })
        .round_dp(1);

    let remaining = policy
        .limit
        .checked_sub(total)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let status = if total.is_zero() {
        CeilingStatus::NoAid
    } else if total > policy.limit {
        CeilingStatus::Exceeded
    } else if percent_used > policy.warning_percent {
        CeilingStatus::Warning
    } else {
        CeilingStatus::Ok
    };

    CeilingAssessment {
        total,
        limit: policy.limit,
        percent_used,
        remaining,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_no_aid() {
        let a = assess_ceiling(Decimal::ZERO, &CeilingPolicy::default());
        assert_eq!(a.status, CeilingStatus::NoAid);
        assert_eq!(a.remaining, dec("300000"));
        assert_eq!(a.percent_used, Decimal::ZERO);
    }

    #[test]
    fn test_ok_under_current_ceiling() {
        let a = assess_ceiling(dec("191018.50"), &CeilingPolicy::default());
        assert_eq!(a.status, CeilingStatus::Ok);
        assert_eq!(a.percent_used, dec("63.7"));
        assert_eq!(a.remaining, dec("108981.50"));
        assert_eq!(a.excess(), None);
    }

    #[test]
    fn test_warning_under_previous_ceiling() {
        let a = assess_ceiling(dec("191018.50"), &CeilingPolicy::new(dec("200000")));
        assert_eq!(a.status, CeilingStatus::Warning);
        assert_eq!(a.percent_used, dec("95.5"));
    }

    #[test]
    fn test_exceeded() {
        let a = assess_ceiling(dec("350000"), &CeilingPolicy::default());
        assert_eq!(a.status, CeilingStatus::Exceeded);
        assert_eq!(a.remaining, Decimal::ZERO);
        assert_eq!(a.excess(), Some(dec("50000")));
    }

    #[test]
    fn test_zero_limit_does_not_panic() {
        let a = assess_ceiling(dec("10"), &CeilingPolicy::new(Decimal::ZERO));
        assert_eq!(a.status, CeilingStatus::Exceeded);
        assert_eq!(a.percent_used, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_huge_total_does_not_overflow() {
        let total = dec("1000000000000000000000000000");
        let a = assess_ceiling(total, &CeilingPolicy::default());
        assert_eq!(a.status, CeilingStatus::Exceeded);
        assert!(a.percent_used > dec("100"));
        assert_eq!(a.remaining, Decimal::ZERO);
        assert!(a.excess().is_some());
    }

    #[test]
    fn test_negative_limit_does_not_overflow_remaining() {
        let a = assess_ceiling(Decimal::MAX, &CeilingPolicy::new(dec("-1")));
        assert_eq!(a.remaining, Decimal::ZERO);
        assert_eq!(a.status, CeilingStatus::Exceeded);
    }
}
