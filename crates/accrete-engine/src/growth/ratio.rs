//! Growth ratios.
//!
//! Churn and contraction are carried as negative values. A quick ratio is
//! only defined when its outflow is strictly negative; with no outflow the
//! ratio is NaN, not infinite. Figures that store churn as a positive count
//! always yield NaN here.

use super::classify::GrowthAccountingRow;
use crate::movement::{RevenueMovement, UserMovement};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ratio columns derived from the chronologically preceding row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRatios {
    /// Active users at the beginning of the period (previous row's active users)
    pub users_bop: Option<f64>,
    /// Retained users / users BOP
    pub user_retention: f64,
    /// (new + resurrected) / |churned|
    pub user_quick_ratio: f64,
    /// Revenue at the beginning of the period (previous row's revenue)
    pub revenue_bop: Option<f64>,
    /// Retained revenue / revenue BOP
    pub revenue_retention: f64,
    /// (new + resurrected + expansion) / |churned + contraction|
    pub revenue_quick_ratio: f64,
}

impl Default for GrowthRatios {
    fn default() -> Self {
        Self {
            users_bop: None,
            user_retention: f64::NAN,
            user_quick_ratio: f64::NAN,
            revenue_bop: None,
            revenue_retention: f64::NAN,
            revenue_quick_ratio: f64::NAN,
        }
    }
}

/// Ratio of retained value to the beginning-of-period baseline.
///
/// NaN when the baseline is absent or zero.
pub fn retention_ratio(retained: f64, bop: Option<f64>) -> f64 {
    match bop {
        Some(base) if base != 0.0 => retained / base,
        _ => f64::NAN,
    }
}

/// User quick ratio: (new + resurrected) / |churned|, NaN unless `churned < 0`.
pub fn user_quick_ratio(new: f64, resurrected: f64, churned: f64) -> f64 {
    if churned > 0.0 {
        warn!(churned, "positive churn passed to user quick ratio; churn must be negative");
    }
    if churned < 0.0 {
        (new + resurrected) / churned.abs()
    } else {
        f64::NAN
    }
}

/// Revenue quick ratio: (new + resurrected + expansion) / |churned + contraction|,
/// NaN unless the outflow sum is negative.
pub fn revenue_quick_ratio(
    new: f64,
    resurrected: f64,
    expansion: f64,
    churned: f64,
    contraction: f64,
) -> f64 {
    let outflow = churned + contraction;
    if churned > 0.0 || contraction > 0.0 {
        warn!(
            churned,
            contraction,
            "positive outflow passed to revenue quick ratio; outflows must be negative"
        );
    }
    if outflow < 0.0 {
        (new + resurrected + expansion) / outflow.abs()
    } else {
        f64::NAN
    }
}

/// Fill in the ratio columns of chronologically ordered rows.
pub fn apply_ratios(rows: &mut [GrowthAccountingRow]) {
    let mut previous: Option<(f64, f64)> = None;

    for row in rows.iter_mut() {
        let users = &row.users;
        let revenue = &row.revenue_movements;
        let users_bop = previous.map(|(active, _)| active);
        let revenue_bop = previous.map(|(_, total)| total);

        row.ratios = GrowthRatios {
            users_bop,
            user_retention: retention_ratio(users.value_or_zero(UserMovement::Retained), users_bop),
            user_quick_ratio: user_quick_ratio(
                users.value_or_zero(UserMovement::New),
                users.value_or_zero(UserMovement::Resurrected),
                users.value_or_zero(UserMovement::Churned),
            ),
            revenue_bop,
            revenue_retention: retention_ratio(
                revenue.value_or_zero(RevenueMovement::Retained),
                revenue_bop,
            ),
            revenue_quick_ratio: revenue_quick_ratio(
                revenue.value_or_zero(RevenueMovement::New),
                revenue.value_or_zero(RevenueMovement::Resurrected),
                revenue.value_or_zero(RevenueMovement::Expansion),
                revenue.value_or_zero(RevenueMovement::Churned),
                revenue.value_or_zero(RevenueMovement::Contraction),
            ),
        };

        previous = Some((row.active_users as f64, row.revenue));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_user_quick_ratio() {
        assert_relative_eq!(user_quick_ratio(3.0, 1.0, -2.0), 2.0);
        assert_relative_eq!(user_quick_ratio(0.0, 0.0, -1.0), 0.0);
        assert!(user_quick_ratio(3.0, 1.0, 0.0).is_nan());
    }

    #[test]
    fn test_positive_churn_is_not_an_outflow() {
        assert!(user_quick_ratio(3.0, 1.0, 2.0).is_nan());
        assert!(revenue_quick_ratio(3.0, 1.0, 0.0, 2.0, 0.0).is_nan());
    }

    #[test]
    fn test_revenue_quick_ratio() {
        assert_relative_eq!(revenue_quick_ratio(10.0, 5.0, 5.0, -8.0, -2.0), 2.0);
        // Contraction alone is enough of an outflow
        assert_relative_eq!(revenue_quick_ratio(0.0, 0.0, 4.0, 0.0, -2.0), 2.0);
        assert!(revenue_quick_ratio(10.0, 0.0, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn test_retention_ratio() {
        assert_relative_eq!(retention_ratio(3.0, Some(4.0)), 0.75);
        assert!(retention_ratio(3.0, Some(0.0)).is_nan());
        assert!(retention_ratio(3.0, None).is_nan());
    }
}
