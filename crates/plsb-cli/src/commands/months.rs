//! Month commands: list months, show a month's metrics, source status

use anyhow::{Context, Result};
use plsb_core::format::{breakdown_shares, format_amount, format_delta};
use plsb_core::{compute, CachedSource, CategoryMetric, MetricsView};

use super::truncate;

pub async fn cmd_months(source: &CachedSource) -> Result<()> {
    let cached = source.dataset().await.context("Failed to load sheet")?;

    if cached.dataset.is_empty() {
        println!("No months found in {}", source.name());
        return Ok(());
    }

    println!();
    println!("📅 Months ({})", cached.dataset.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for (i, month) in cached.dataset.months().iter().enumerate() {
        println!("   {:>3}. {}", i + 1, month);
    }

    Ok(())
}

pub async fn cmd_show(source: &CachedSource, month: &str, json: bool) -> Result<()> {
    let cached = source.dataset().await.context("Failed to load sheet")?;
    let view = compute(&cached.dataset, month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render_view(&view));
    }

    Ok(())
}

pub async fn cmd_status(source: &CachedSource) -> Result<()> {
    println!();
    println!("📊 PLSB Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source.name());
    println!("   Cache TTL: {}s", source.ttl().as_secs());

    match source.dataset().await {
        Ok(cached) => {
            let months = cached.dataset.months();
            println!("   Months: {}", months.len());
            if let (Some(first), Some(last)) = (months.first(), months.last()) {
                println!("   Range: {} → {}", first, last);
            }
            println!("   Fetched: {}", cached.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("   Fingerprint: {}", &cached.fingerprint[..12]);
        }
        Err(e) => {
            println!();
            println!("   ❌ Error loading sheet: {}", e);
        }
    }

    Ok(())
}

/// Render a metrics view as a text report
pub fn render_view(view: &MetricsView) -> String {
    let mut lines = Vec::new();

    lines.push(String::new());
    match &view.previous_month {
        Some(prev) => lines.push(format!("📅 {} (compared with {})", view.month, prev)),
        None => lines.push(format!("📅 {} (first month, no comparison)", view.month)),
    }
    lines.push("   ─────────────────────────────────────────────────────────────".to_string());

    for metric in view.income.iter().chain(view.outcome.iter()) {
        lines.push(format!(
            "   {:8} {:>14}   prev {:>14}   {}",
            format!("{}:", metric.label),
            format_amount(metric.value),
            format_delta(metric),
            metric.direction
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "   {:15} │ {:>14} │ {:>14} │ {}",
        "Category", "Value", "Previous", "Trend"
    ));
    lines.push("   ────────────────┼────────────────┼────────────────┼─────────".to_string());
    for metric in &view.categories {
        lines.push(category_line(metric));
    }

    if !view.breakdown.is_empty() {
        let shares = breakdown_shares(&view.breakdown);
        lines.push(String::new());
        lines.push("   🥧 Breakdown".to_string());
        lines.push(format!("   {:15} │ {:>14} │ {:>6}", "Slice", "Amount", "%"));
        lines.push("   ────────────────┼────────────────┼────────".to_string());
        for (slice, share) in view.breakdown.iter().zip(shares) {
            lines.push(format!(
                "   {:15} │ {:>14} │ {:>5.1}%",
                truncate(&slice.label, 15),
                format_amount(slice.amount),
                share
            ));
        }
    }

    if !view.missing.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "   \x1b[2mNo data for: {}\x1b[0m",
            view.missing.join(", ")
        ));
    }

    lines.join("\n")
}

fn category_line(metric: &CategoryMetric) -> String {
    format!(
        "   {:15} │ {:>14} │ {:>14} │ {}",
        truncate(&metric.label, 15),
        format_amount(metric.value),
        format_delta(metric),
        metric.direction
    )
}
