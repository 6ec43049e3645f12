//! The `fetch` command: cache-aware pipeline run, summary, JSON export.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;

use vivagenda_core::{AgendaTable, AppConfig};
use vivagenda_portal::{normalize, PortalClient, ScheduleQuery};

use crate::cache;

/// Runs the fetch pipeline and reports on the result.
///
/// An empty table is a distinct outcome from a fetch error: the pipeline
/// succeeded but the portal had no usable rows, so the command still exits
/// zero after saying so.
pub async fn run(config: &AppConfig, refresh: bool, out: Option<&Path>) -> anyhow::Result<()> {
    let table = load_table(config, refresh).await?;

    if table.is_empty() {
        tracing::warn!("no usable rows in the portal response, nothing to summarize");
    } else {
        summarize(&table);
    }

    if let Some(out) = out {
        let json = serde_json::to_string_pretty(&table)?;
        std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), rows = table.len(), "normalized table written");
    }

    Ok(())
}

/// Serves the table from the snapshot cache when fresh, otherwise runs the
/// authenticated fetch and refreshes the snapshot.
async fn load_table(config: &AppConfig, refresh: bool) -> anyhow::Result<AgendaTable> {
    if !refresh {
        if let Some(table) =
            cache::load_fresh(&config.cache_path, config.cache_ttl_mins, Utc::now())
        {
            return Ok(table);
        }
    }

    let client = PortalClient::from_config(config)?;
    let query = ScheduleQuery::from_config(config);
    let payload = client.fetch_schedule(&query).await?;
    let mut table = normalize(Some(&payload));
    table.sort_by_schedule();

    if let Err(e) = cache::store(&config.cache_path, &table, Utc::now()) {
        tracing::warn!(
            path = %config.cache_path.display(),
            error = %e,
            "failed to write snapshot cache, continuing without it"
        );
    }

    Ok(table)
}

/// Logs the headline counts the dashboard sidebar used to show: total rows,
/// date span, distinct practitioners and facilities.
fn summarize(table: &AgendaTable) {
    let profissionais: HashSet<&str> = table.iter().map(|r| r.profissional.as_str()).collect();
    let unidades: HashSet<&str> = table.iter().map(|r| r.unidade.as_str()).collect();

    if let Some((first, last)) = table.date_span() {
        tracing::info!(
            rows = table.len(),
            first = %first,
            last = %last,
            profissionais = profissionais.len(),
            unidades = unidades.len(),
            "schedule summary"
        );
    }
}
