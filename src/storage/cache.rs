//! Overview snapshot cache
//!
//! The last committed overview is stored with the time it was saved so a
//! reopened dashboard can render without waiting on the network.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::StoreResult;
use super::kv::{LocalStore, OVERVIEW_SNAPSHOT_KEY};
use crate::view::OverviewView;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at_ms: i64,
    #[serde(default)]
    last_update: Option<String>,
    overview: OverviewView,
}

/// A snapshot that is still inside its freshness window
#[derive(Debug, Clone, PartialEq)]
pub struct CachedOverview {
    pub overview: OverviewView,
    pub last_update: Option<String>,
    pub saved_at_ms: i64,
}

pub struct OverviewCache;

impl OverviewCache {
    pub fn save(
        store: &LocalStore,
        overview: &OverviewView,
        last_update: Option<&str>,
        now_ms: i64,
    ) -> StoreResult<()> {
        let snapshot = Snapshot {
            saved_at_ms: now_ms,
            last_update: last_update.map(str::to_string),
            overview: overview.clone(),
        };
        store.set_json(OVERVIEW_SNAPSHOT_KEY, &snapshot)
    }

    /// The snapshot if `now - saved_at < ttl`. Corrupt snapshots count as
    /// absent.
    pub fn load_fresh(store: &LocalStore, now_ms: i64, ttl: Duration) -> Option<CachedOverview> {
        let snapshot: Snapshot = match store.get_json(OVERVIEW_SNAPSHOT_KEY) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable overview snapshot");
                return None;
            }
        };

        let age_ms = now_ms.saturating_sub(snapshot.saved_at_ms);
        if age_ms < 0 || age_ms as u128 >= ttl.as_millis() {
            return None;
        }
        Some(CachedOverview {
            overview: snapshot.overview,
            last_update: snapshot.last_update,
            saved_at_ms: snapshot.saved_at_ms,
        })
    }

    pub fn clear(store: &LocalStore) -> StoreResult<()> {
        store.remove(OVERVIEW_SNAPSHOT_KEY)?;
        Ok(())
    }
}
