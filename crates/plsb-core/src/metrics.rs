//! Monthly metrics and breakdown computation
//!
//! Turns one month's record and the record before it into the values the
//! monthly page shows: per-category metrics with a direction indicator, and
//! the seven-slice spending breakdown.
//!
//! The previous record is chosen by row position. The first row of the
//! dataset has no predecessor, so all of its deltas are zero regardless of
//! what the month is called.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    BreakdownSlice, Category, CategoryMetric, Dataset, Direction, MetricsView, MonthlyRecord,
};

/// Where a breakdown slice takes its amount from
#[derive(Debug, Clone, Copy)]
enum SliceSource {
    Single(Category),
    Combined(Category, Category),
}

/// Breakdown slices, in chart order
const BREAKDOWN: [(&str, SliceSource); 7] = [
    ("Fixed", SliceSource::Single(Category::Fixed)),
    (
        "Miscellaneous",
        SliceSource::Combined(Category::Expenses, Category::Eva),
    ),
    ("Shopping", SliceSource::Single(Category::Shopping)),
    ("Gas", SliceSource::Single(Category::Gas)),
    ("Parking", SliceSource::Single(Category::Parking)),
    ("Signature", SliceSource::Single(Category::Signatures)),
    (
        "Investments",
        SliceSource::Combined(Category::Savings, Category::Offer),
    ),
];

/// Classify a value against the previous month's value
///
/// A zero delta means there is nothing to compare against.
pub fn classify(delta: f64, current: f64) -> Direction {
    if delta == 0.0 {
        Direction::Flat
    } else if delta < current {
        Direction::Inverse
    } else {
        Direction::Normal
    }
}

/// Sum two fields of a record, failing if either cell is empty
pub fn combine(record: &MonthlyRecord, a: Category, b: Category) -> Result<f64> {
    Ok(record.require(a)? + record.require(b)?)
}

/// Compute the metrics view for one month of the dataset
pub fn compute(dataset: &Dataset, selected_month: &str) -> Result<MetricsView> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let month = selected_month.trim();
    let records = dataset.records();
    let position = dataset
        .position(month)
        .ok_or_else(|| Error::MonthNotFound(month.to_string()))?;

    let current = &records[position];
    let previous = position.checked_sub(1).map(|i| &records[i]);

    let mut missing = Vec::new();

    let income = category_metric(Category::Income, current, previous);
    let outcome = category_metric(Category::Outcome, current, previous);
    for (metric, category) in [(&income, Category::Income), (&outcome, Category::Outcome)] {
        if metric.is_none() {
            missing.push(category.as_str().to_string());
        }
    }

    let mut categories = Vec::with_capacity(Category::DISPLAYED.len());
    for category in Category::DISPLAYED {
        match category_metric(category, current, previous) {
            Some(metric) => categories.push(metric),
            None => missing.push(category.as_str().to_string()),
        }
    }

    let mut breakdown = Vec::with_capacity(BREAKDOWN.len());
    for (label, source) in BREAKDOWN {
        let amount = match source {
            SliceSource::Single(category) => current.require(category),
            SliceSource::Combined(a, b) => combine(current, a, b),
        };
        match amount {
            Ok(amount) => breakdown.push(BreakdownSlice {
                label: label.to_string(),
                amount,
            }),
            Err(e) => {
                warn!(month = %current.month, slice = label, error = %e, "Breakdown slice omitted");
                missing.push(label.to_string());
            }
        }
    }

    debug!(
        month = %current.month,
        position,
        categories = categories.len(),
        slices = breakdown.len(),
        "Computed monthly metrics"
    );

    Ok(MetricsView {
        month: current.month.clone(),
        position,
        previous_month: previous.map(|p| p.month.clone()),
        income,
        outcome,
        categories,
        breakdown,
        missing,
    })
}

/// Metric for one category, or None if the current cell is empty
///
/// An empty cell in the previous month counts as a zero delta.
fn category_metric(
    category: Category,
    current: &MonthlyRecord,
    previous: Option<&MonthlyRecord>,
) -> Option<CategoryMetric> {
    let value = current.get(category)?;
    let delta = previous.and_then(|p| p.get(category)).unwrap_or(0.0);
    Some(CategoryMetric {
        category,
        label: category.label().to_string(),
        value,
        delta,
        direction: classify(delta, value),
    })
}
