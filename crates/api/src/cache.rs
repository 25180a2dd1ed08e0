//! Short-lived read-through cache for query operations.
//!
//! Every list/detail read is keyed by resource family plus the canonical
//! operation string (path + query). Successful mutations invalidate their
//! family, and families whose payloads embed them, before returning.

use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};

use moka::future::Cache;
use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::client::ApiError;

/// Resource family a cached operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Family {
    Auth,
    Requests,
    Proposals,
    Tags,
    Places,
    Wishlists,
    Stories,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Family::Auth,
        Family::Requests,
        Family::Proposals,
        Family::Tags,
        Family::Places,
        Family::Wishlists,
        Family::Stories,
    ];

    /// Families stale after a mutation in this one. Proposals are embedded
    /// in request payloads, so writing one invalidates both.
    pub fn related(self) -> &'static [Family] {
        match self {
            Family::Auth => &[Family::Auth],
            Family::Requests => &[Family::Requests],
            Family::Proposals => &[Family::Proposals, Family::Requests],
            Family::Tags => &[Family::Tags],
            Family::Places => &[Family::Places],
            Family::Wishlists => &[Family::Wishlists],
            Family::Stories => &[Family::Stories],
        }
    }
}

#[derive(Clone)]
pub struct QueryCache {
    families: Arc<HashMap<Family, Cache<String, Arc<Value>>>>,
}

impl QueryCache {
    const TTL: Duration = Duration::from_secs(30);
    const PER_FAMILY_CAPACITY: u64 = 256;

    pub fn new() -> Self {
        let families = Family::ALL
            .into_iter()
            .map(|family| {
                let cache = Cache::builder()
                    .time_to_live(Self::TTL)
                    .max_capacity(Self::PER_FAMILY_CAPACITY)
                    .build();
                (family, cache)
            })
            .collect();
        Self {
            families: Arc::new(families),
        }
    }

    /// Read through the cache, fetching on miss. An unregistered family
    /// degrades to an uncached fetch.
    pub async fn get_with<F>(
        &self,
        family: Family,
        op: String,
        fetch: F,
    ) -> Result<Arc<Value>, ApiError>
    where
        F: Future<Output = Result<Value, ApiError>>,
    {
        let Some(cache) = self.families.get(&family) else {
            return fetch.await.map(Arc::new);
        };
        cache
            .try_get_with(op, async { fetch.await.map(Arc::new) })
            .await
            .map_err(|e: Arc<ApiError>| (*e).clone())
    }

    /// Drop every cached read in `family` and its related families.
    pub fn invalidate(&self, family: Family) {
        for related in family.related() {
            if let Some(cache) = self.families.get(related) {
                cache.invalidate_all();
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("families", &self.families.len())
            .finish()
    }
}
