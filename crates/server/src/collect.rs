//! One-shot collection mode: pull a full cycle from every source, print an
//! operator report and dump the snapshot as JSON.

use crate::config::AppState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mosaiq_core::AggregatedMetric;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CollectionSnapshot {
    pub api: ApiSnapshot,
    pub postgresql: HashMap<String, AggregatedMetric>,
    pub elasticsearch: SearchSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiSnapshot {
    pub weather: HashMap<String, f64>,
    pub crypto: HashMap<String, f64>,
    pub github: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchSnapshot {
    pub logs: HashMap<String, f64>,
    pub application: HashMap<String, f64>,
}

/// Collect from all sources. A failed source logs a warning and contributes
/// an empty section; the cycle always completes.
pub async fn snapshot(state: &AppState) -> CollectionSnapshot {
    CollectionSnapshot {
        api: ApiSnapshot {
            weather: section("weather", state.api.fetch_weather().await),
            crypto: section("crypto", state.api.fetch_crypto().await),
            github: section("github", state.api.fetch_github().await),
        },
        postgresql: section("postgresql", state.db.fetch_aggregated().await),
        elasticsearch: SearchSnapshot {
            logs: section("elastic logs", state.logs.fetch_log_metrics("logs-*", "@timestamp").await),
            application: section(
                "elastic application",
                state.logs.fetch_application_metrics("metrics-*").await,
            ),
        },
        timestamp: Utc::now(),
    }
}

fn section<T: Default, E: std::fmt::Display>(name: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(source = name, error = %err, "source failed during collection");
            T::default()
        }
    }
}

/// Run a collection cycle, print the report and write the JSON dump.
pub async fn run(state: &AppState, output: &Path) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("Multi-Source Data Collection");
    println!("{}", "=".repeat(60));
    println!("Timestamp: {}\n", Utc::now().to_rfc3339());

    let snapshot = snapshot(state).await;

    println!("Weather:");
    print_section(&snapshot.api.weather);

    println!("\nCryptocurrency prices (USD):");
    print_section(&snapshot.api.crypto);

    println!("\nRepository stats:");
    print_section(&snapshot.api.github);

    println!("\nPostgreSQL metrics (24h aggregates):");
    if snapshot.postgresql.is_empty() {
        println!("  no data or connection unavailable");
    } else {
        let mut names: Vec<_> = snapshot.postgresql.keys().collect();
        names.sort();
        for name in names {
            let agg = &snapshot.postgresql[name];
            println!(
                "  {name}: avg {:.2}, max {:.2}, min {:.2}, {} samples",
                agg.avg, agg.max, agg.min, agg.count
            );
        }
    }

    match state.db.fetch_recent().await {
        Ok(samples) => println!("  {} raw samples in the last hour", samples.len()),
        Err(err) => tracing::warn!(error = %err, "recent-sample fetch failed"),
    }

    println!("\nElasticsearch log metrics:");
    print_section(&snapshot.elasticsearch.logs);

    println!("\nElasticsearch application metrics:");
    print_section(&snapshot.elasticsearch.application);

    println!("\n{}", "=".repeat(60));

    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Snapshot saved to {}", output.display());

    Ok(())
}

fn print_section(metrics: &HashMap<String, f64>) {
    if metrics.is_empty() {
        println!("  no data or source unavailable");
        return;
    }
    let mut names: Vec<_> = metrics.keys().collect();
    names.sort();
    for name in names {
        println!("  {name}: {}", metrics[name]);
    }
}
