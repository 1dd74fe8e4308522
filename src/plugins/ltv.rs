//! Customer lifetime-value ranking.
//!
//! The score is a fixed formula over the Order and SiteVisit tables:
//!
//! ```text
//! weeks = 1                                   if one visit
//!       = max(1, floor((JD(last) - JD(first)) / 7))  otherwise
//! score = trunc(52 * (revenue / visits) * (visits / weeks) * 10)
//! ```
//!
//! Customers without orders or without visits have no score and are left out
//! of the ranking. [`evaluate_customers`] exposes the reason for each one.

use crate::core::error::LtvError;
use crate::core::store::{Customer, RecordStore};
use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Julian Day Number of 0001-01-01 minus one day, at midnight.
pub const JULIAN_EPOCH_OFFSET: f64 = 1_721_424.5;

const WEEKS_PER_YEAR: f64 = 52.0;
const LIFESPAN_YEARS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtvRecord {
    pub customer_id: String,
    pub last_name: Option<String>,
    pub total_revenue: f64,
    pub visits: usize,
    pub ltv: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoOrders,
    NoVisits,
    /// The score was not a finite number representable as `i64`.
    DegenerateScore,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoOrders => write!(f, "no orders"),
            SkipReason::NoVisits => write!(f, "no site visits"),
            SkipReason::DegenerateScore => write!(f, "degenerate score"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CustomerLtv {
    Scored(LtvRecord),
    Skipped { customer_id: String, reason: SkipReason },
}

/// Astronomical Julian Day Number of `date` at midnight.
pub fn julian_day(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64 + JULIAN_EPOCH_OFFSET
}

/// Whole weeks between the first and last visit, never less than one.
/// `None` when there are no visits.
pub fn active_weeks(visit_dates: &[NaiveDate]) -> Option<i64> {
    let first = visit_dates.iter().min()?;
    let last = visit_dates.iter().max()?;
    if visit_dates.len() == 1 {
        return Some(1);
    }
    let weeks = ((julian_day(*last) - julian_day(*first)) / 7.0).floor() as i64;
    Some(if weeks == 0 { 1 } else { weeks })
}

/// Score from aggregated inputs, in the same operation order as the ranking.
pub fn ltv_score(total_revenue: f64, visits: usize, weeks: i64) -> Option<i64> {
    if visits == 0 || weeks <= 0 {
        return None;
    }
    let visits = visits as f64;
    let weeks = weeks as f64;
    let avg_revenue_per_visit = total_revenue / visits;
    let visits_per_week = visits / weeks;
    let score = WEEKS_PER_YEAR * (avg_revenue_per_visit * visits_per_week) * LIFESPAN_YEARS;
    if !score.is_finite() || score.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(score.trunc() as i64)
}

/// Revenue and visit dates per `customer_id`, gathered in one pass over the
/// Order and SiteVisit tables.
#[derive(Default)]
struct CustomerActivity {
    revenue: FxHashMap<String, f64>,
    visit_dates: FxHashMap<String, Vec<NaiveDate>>,
}

impl CustomerActivity {
    fn collect(store: &RecordStore) -> Self {
        let mut activity = Self::default();
        for order in store.orders.iter() {
            *activity
                .revenue
                .entry(order.customer_id.clone())
                .or_insert(0.0) += order.total_amount;
        }
        for visit in store.site_visits.iter() {
            activity
                .visit_dates
                .entry(visit.customer_id.clone())
                .or_default()
                .push(visit.event_time.date());
        }
        activity
    }

    fn evaluate(&self, customer: &Customer) -> CustomerLtv {
        let skipped = |reason| CustomerLtv::Skipped {
            customer_id: customer.key.clone(),
            reason,
        };

        let Some(&total_revenue) = self.revenue.get(&customer.key) else {
            return skipped(SkipReason::NoOrders);
        };
        let visit_dates = self
            .visit_dates
            .get(&customer.key)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let Some(weeks) = active_weeks(visit_dates) else {
            return skipped(SkipReason::NoVisits);
        };

        match ltv_score(total_revenue, visit_dates.len(), weeks) {
            Some(ltv) => CustomerLtv::Scored(LtvRecord {
                customer_id: customer.key.clone(),
                last_name: customer.last_name.clone(),
                total_revenue,
                visits: visit_dates.len(),
                ltv,
            }),
            None => skipped(SkipReason::DegenerateScore),
        }
    }
}

/// Evaluate every customer, in Customer-table order.
pub fn evaluate_customers(store: &RecordStore) -> Vec<CustomerLtv> {
    let activity = CustomerActivity::collect(store);
    store
        .customers
        .iter()
        .map(|customer| activity.evaluate(customer))
        .collect()
}

/// The `top` customers by descending score. Equal scores keep Customer-table
/// order.
pub fn top_customers_by_ltv(store: &RecordStore, top: usize) -> Result<Vec<LtvRecord>, LtvError> {
    if top == 0 {
        return Err(LtvError::ValidationError(
            "number of customers must be at least 1".to_string(),
        ));
    }
    let mut records: Vec<LtvRecord> = evaluate_customers(store)
        .into_iter()
        .filter_map(|outcome| match outcome {
            CustomerLtv::Scored(record) => Some(record),
            CustomerLtv::Skipped { .. } => None,
        })
        .collect();
    records.sort_by(|a, b| b.ltv.cmp(&a.ltv));
    records.truncate(top);
    Ok(records)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "ltv",
        "version": "0.1.0",
        "description": "Rank customers by simple lifetime value",
        "commands": [
            { "name": "report", "parameters": ["events", "top"] }
        ],
        "formula": "trunc(52 * (revenue / visits) * (visits / weeks) * 10)",
        "storage": []
    })
}
