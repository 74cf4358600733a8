//! Periodic movement classification.

use super::join::PeriodJoinRow;
use super::ratio::GrowthRatios;
use crate::movement::{MovementTally, RevenueMovement, UserMovement};
use crate::period::Period;
use serde::Serialize;

/// Growth accounting figures for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthAccountingRow {
    /// Period described by the row.
    pub period: Period,

    /// Distinct users active in the period.
    pub active_users: u64,

    /// User counts per movement class; churn is negative.
    pub users: MovementTally<UserMovement>,

    /// Total revenue of active users.
    pub revenue: f64,

    /// Revenue per movement class; churn and contraction are negative.
    pub revenue_movements: MovementTally<RevenueMovement>,

    /// Ratios against the preceding row, filled in by
    /// [`apply_ratios`](super::ratio::apply_ratios).
    pub ratios: GrowthRatios,
}

impl GrowthAccountingRow {
    /// Whether the row describes a period with no activity or no revenue.
    pub fn is_empty(&self) -> bool {
        self.active_users == 0 || self.revenue == 0.0
    }
}

/// Classify all join rows of a single period.
pub fn classify_period(period: Period, rows: &[PeriodJoinRow]) -> GrowthAccountingRow {
    let mut active_users = 0u64;
    let mut revenue = 0.0;
    let mut users = MovementTally::new();
    let mut revenue_movements = MovementTally::new();

    for row in rows {
        let t = row.current.unwrap_or(0.0);
        let l = row.prior.unwrap_or(0.0);
        let is_new = row.is_first_period();

        if row.current.is_some() {
            active_users += 1;
            revenue += t;
        }

        if is_new {
            users.add(UserMovement::New, 1.0);
            revenue_movements.add(RevenueMovement::New, t);
        }

        if row.is_current_active() && row.is_prior_active() {
            users.add(UserMovement::Retained, 1.0);
            revenue_movements.add(RevenueMovement::Retained, t.min(l));
            if !is_new {
                if t > l {
                    revenue_movements.add(RevenueMovement::Expansion, t - l);
                } else if t < l {
                    revenue_movements.add(RevenueMovement::Contraction, t - l);
                }
            }
        }

        if row.current.is_some() && !is_new && !row.is_prior_active() {
            users.add(UserMovement::Resurrected, 1.0);
            revenue_movements.add(RevenueMovement::Resurrected, t);
        }

        if !row.is_current_active() {
            users.add(UserMovement::Churned, -1.0);
            revenue_movements.add(RevenueMovement::Churned, -l);
        }
    }

    GrowthAccountingRow {
        period,
        active_users,
        users,
        revenue,
        revenue_movements,
        ratios: GrowthRatios::default(),
    }
}

/// Classify join rows ordered by period into one row per period.
pub fn classify_periods(joined: &[PeriodJoinRow]) -> Vec<GrowthAccountingRow> {
    joined
        .chunk_by(|a, b| a.period == b.period)
        .map(|rows| classify_period(rows[0].period, rows))
        .collect()
}
