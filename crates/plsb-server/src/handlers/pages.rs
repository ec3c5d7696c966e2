//! Server-rendered pages: welcome and monthly dashboard

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{AppError, AppState};
use plsb_core::config::WELCOME_BODY;
use plsb_core::format::{breakdown_shares, format_amount, format_delta};
use plsb_core::{compute, CategoryMetric, MetricsView};

use super::MetricsQuery;

const DASHBOARD_HEADING: &str = "Monthly overview";

#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeTemplate<'a> {
    title: &'a str,
    icon: &'a str,
    heading: String,
    body: &'a str,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    title: &'a str,
    icon: &'a str,
    heading: &'a str,
    /// Month selector entries; empty when the sheet could not be read
    months: Vec<MonthOption>,
    error: Option<String>,
    view: Option<MonthView>,
    no_months: bool,
}

struct MonthOption {
    name: String,
    selected: bool,
}

/// A metrics view with every value already formatted for display
struct MonthView {
    month: String,
    comparison: String,
    headline: Vec<MetricCard>,
    categories: Vec<MetricCard>,
    breakdown: Vec<SliceRow>,
    missing: String,
}

struct MetricCard {
    label: String,
    value: String,
    previous: String,
    direction: &'static str,
}

struct SliceRow {
    label: String,
    amount: String,
    share: String,
    width: String,
}

impl From<&CategoryMetric> for MetricCard {
    fn from(metric: &CategoryMetric) -> Self {
        Self {
            label: metric.label.clone(),
            value: format_amount(metric.value),
            previous: format_delta(metric),
            direction: metric.direction.as_str(),
        }
    }
}

impl From<&MetricsView> for MonthView {
    fn from(view: &MetricsView) -> Self {
        let comparison = match &view.previous_month {
            Some(prev) => format!("Compared with {}", prev),
            None => "First month in the sheet, nothing to compare with".to_string(),
        };

        let shares = breakdown_shares(&view.breakdown);
        let breakdown = view
            .breakdown
            .iter()
            .zip(shares)
            .map(|(slice, share)| SliceRow {
                label: slice.label.clone(),
                amount: format_amount(slice.amount),
                share: format!("{:.1}", share),
                width: format!("{:.1}", share.clamp(0.0, 100.0)),
            })
            .collect();

        Self {
            month: view.month.clone(),
            comparison,
            headline: view
                .income
                .iter()
                .chain(view.outcome.iter())
                .map(MetricCard::from)
                .collect(),
            categories: view.categories.iter().map(MetricCard::from).collect(),
            breakdown,
            missing: view.missing.join(", "),
        }
    }
}

/// Render a template, falling back to a 500 if rendering fails
fn render<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// GET / - Welcome page
pub async fn welcome_page(State(state): State<Arc<AppState>>) -> Response {
    let page = &state.config.page;
    render(
        StatusCode::OK,
        WelcomeTemplate {
            title: &page.title,
            icon: &page.icon,
            heading: page.welcome_heading(),
            body: WELCOME_BODY,
        },
    )
}

/// GET /dashboard?month= - Monthly metrics page
///
/// Without a month the last month of the sheet is shown. Errors are shown on
/// the page itself so another month can still be picked.
pub async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Response {
    let page = &state.config.page;
    let mut template = DashboardTemplate {
        title: &page.title,
        icon: &page.icon,
        heading: DASHBOARD_HEADING,
        months: Vec::new(),
        error: None,
        view: None,
        no_months: false,
    };

    let cached = match state.source.dataset().await {
        Ok(cached) => cached,
        Err(e) => {
            let err = AppError::from_core(e);
            err.log();
            template.error = Some(err.message().to_string());
            return render(err.status(), template);
        }
    };

    let months = cached.dataset.months();
    let Some(&last) = months.last() else {
        template.no_months = true;
        return render(StatusCode::OK, template);
    };

    let selected = params
        .month
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(last);

    template.months = months
        .iter()
        .map(|m| MonthOption {
            name: m.to_string(),
            selected: *m == selected,
        })
        .collect();

    match compute(&cached.dataset, selected) {
        Ok(view) => {
            template.view = Some(MonthView::from(&view));
            render(StatusCode::OK, template)
        }
        Err(e) => {
            let err = AppError::from_core(e);
            err.log();
            template.error = Some(err.message().to_string());
            render(err.status(), template)
        }
    }
}
