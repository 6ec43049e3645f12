//! Time-bounded snapshot cache for the normalized table.
//!
//! A single JSON file holds the last fetched table together with its fetch
//! timestamp. A snapshot younger than the configured TTL is served instead
//! of re-running the login and fetch cycle; `--refresh` bypasses it. A
//! corrupt or unreadable snapshot is treated as absent, never as an error.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use vivagenda_core::AgendaTable;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    fetched_at: DateTime<Utc>,
    records: AgendaTable,
}

/// Loads the cached table if the snapshot at `path` exists, parses, and is
/// younger than `ttl_mins` relative to `now`.
pub fn load_fresh(path: &Path, ttl_mins: u64, now: DateTime<Utc>) -> Option<AgendaTable> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot unreadable, refetching");
            return None;
        }
    };

    let snapshot: Snapshot = match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot corrupt, refetching");
            return None;
        }
    };

    let ttl = i64::try_from(ttl_mins)
        .ok()
        .and_then(Duration::try_minutes)
        .unwrap_or(Duration::MAX);
    let age = now - snapshot.fetched_at;
    if age >= ttl {
        tracing::debug!(path = %path.display(), age_mins = age.num_minutes(), "snapshot expired");
        return None;
    }

    tracing::info!(
        path = %path.display(),
        age_mins = age.num_minutes(),
        rows = snapshot.records.len(),
        "serving table from snapshot cache"
    );
    Some(snapshot.records)
}

/// Writes `records` to `path` stamped with `now`.
///
/// # Errors
///
/// Returns an I/O error if the snapshot cannot be written; callers log and
/// continue, a failed cache write never fails the fetch.
pub fn store(path: &Path, records: &AgendaTable, now: DateTime<Utc>) -> io::Result<()> {
    let snapshot = Snapshot {
        fetched_at: now,
        records: records.clone(),
    };
    let raw = serde_json::to_string(&snapshot).map_err(io::Error::other)?;
    fs::write(path, raw)
}
