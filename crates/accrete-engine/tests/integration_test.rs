//! End-to-end checks across the growth, window and cohort engines.

use accrete_engine::{
    ActivityIndex, ActivityRecord, CohortConfig, DailyActivity, FrequencyConfig, Granularity,
    GrowthConfig, RevenueMovement, RollingConfig, UserMovement, cohort_retention,
    frequency_report, growth_accounting, rolling_quick_ratio,
};
use approx::assert_relative_eq;
use chrono::NaiveDate;

/// Thirty users over eight months with staggered starts and periodic gaps.
fn synthetic_activity() -> Vec<ActivityRecord> {
    let mut records = Vec::new();
    for user in 0u32..30 {
        let start_month = 1 + user % 4;
        for month in start_month..=8 {
            if month > start_month && (user * 7 + month * 3) % 5 == 0 {
                continue;
            }
            let day = 1 + user % 28;
            let date = NaiveDate::from_ymd_opt(2024, month, day).unwrap();
            let amount = f64::from(1 + (user + month) % 4);
            let segment = if user % 2 == 0 { "web" } else { "app" };
            records.push(
                ActivityRecord::new(format!("user-{user:02}"), date, amount).with_segment(segment),
            );
        }
    }
    // Refunds never count as activity
    records.push(ActivityRecord::new(
        "user-99",
        NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        -5.0,
    ));
    records
}

#[test]
fn test_monthly_growth_identities() {
    let daily = DailyActivity::from_records(synthetic_activity(), false).unwrap();
    assert_eq!(daily.user_count(), 30);

    let rows = growth_accounting(&daily, &GrowthConfig::default()).unwrap();
    assert_eq!(rows.len(), 8);
    assert!(rows[0].ratios.users_bop.is_none());
    assert!(rows[0].ratios.user_retention.is_nan());

    for row in &rows {
        let users = &row.users;
        let gained = users.value_or_zero(UserMovement::New)
            + users.value_or_zero(UserMovement::Retained)
            + users.value_or_zero(UserMovement::Resurrected);
        assert_relative_eq!(gained, row.active_users as f64);
        assert!(users.value_or_zero(UserMovement::Churned) <= 0.0);

        let revenue = &row.revenue_movements;
        let earned = revenue.value_or_zero(RevenueMovement::New)
            + revenue.value_or_zero(RevenueMovement::Retained)
            + revenue.value_or_zero(RevenueMovement::Resurrected)
            + revenue.value_or_zero(RevenueMovement::Expansion);
        assert_relative_eq!(earned, row.revenue, epsilon = 1e-9);
        assert!(revenue.value_or_zero(RevenueMovement::Contraction) <= 0.0);
    }

    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let carried = next.users.value_or_zero(UserMovement::Retained)
            - next.users.value_or_zero(UserMovement::Churned);
        assert_relative_eq!(carried, prev.active_users as f64);
        assert_eq!(next.ratios.users_bop, Some(prev.active_users as f64));
        assert_eq!(next.ratios.revenue_bop, Some(prev.revenue));
    }
}

#[test]
fn test_weekly_growth_starts_on_monday() {
    let daily = DailyActivity::from_records(synthetic_activity(), false).unwrap();
    let config = GrowthConfig {
        granularity: Granularity::Week,
        drop_trailing_period: true,
    };
    let rows = growth_accounting(&daily, &config).unwrap();

    assert!(!rows.is_empty());
    for row in &rows {
        assert_eq!(row.period.start().format("%a").to_string(), "Mon");
    }
    assert!(rows.last().unwrap().period.end() < daily.last_date());
}

#[test]
fn test_rolling_segmented_windows() {
    let daily = DailyActivity::from_records(synthetic_activity(), true).unwrap();
    let index = ActivityIndex::new(&daily);
    let config = RollingConfig {
        window_days: vec![7, 28],
        use_segment: true,
    };

    let rows = rolling_quick_ratio(&index, &config, |_| {}).unwrap();
    assert!(!rows.is_empty());
    for row in &rows {
        let segment = row.segment.as_deref().unwrap();
        assert!(segment == "web" || segment == "app");
        if !row.user_retention_rate.is_nan() {
            assert!((0.0..=1.0).contains(&row.user_retention_rate));
        }
        assert!(row.users.value_or_zero(UserMovement::Churned) <= 0.0);
        assert!(row.users.get(UserMovement::Prior).is_none());
    }

    let first_week = rows.iter().find(|r| r.window_days == 7).unwrap();
    assert!(first_week.window_end_date >= daily.first_date() + chrono::Days::new(14));
}

#[test]
fn test_cohort_and_frequency_reports() {
    let daily = DailyActivity::from_records(synthetic_activity(), false).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    let cohorts = cohort_retention(&daily, &CohortConfig::default(), as_of).unwrap();
    let sizes: u64 = cohorts
        .iter()
        .filter(|r| r.periods_since_first == 0)
        .map(|r| {
            assert_relative_eq!(r.retention_pct, 1.0);
            r.cohort_size
        })
        .sum();
    assert_eq!(sizes, 30);

    let index = ActivityIndex::new(&daily);
    let config = FrequencyConfig::default();
    let rows = frequency_report(&index, &config, |_| {}).unwrap();
    assert!(!rows.is_empty());
    for row in rows.iter().filter(|r| r.active_users > 0) {
        assert!(row.average_frequency_ratio > 0.0 && row.average_frequency_ratio <= 1.0);
        assert_relative_eq!(row.breakouts[0].share, 1.0);
        for pair in row.breakouts.windows(2) {
            assert!(pair[1].users <= pair[0].users);
        }
    }
}
