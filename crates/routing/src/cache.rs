//! Provider-result cache keyed by fingerprint, shared across screenings
//! within the same origin-scope.

use crate::provider::ProviderResultRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use investigation_core::TenantId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    PaidExternal,
    CustomerProvided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

#[derive(Clone)]
pub struct CacheEntry {
    pub provider_result: ProviderResultRecord,
    pub origin: CacheOrigin,
    pub fresh_until: DateTime<Utc>,
    pub stale_until: DateTime<Utc>,
    /// Only populated when `origin == CustomerProvided`.
    pub tenant_id: Option<TenantId>,
}

/// Keyed by fingerprint = hash(check-type, provider-id, canonical(subject-identifiers), locale).
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn fingerprint(check_type: &str, provider_id: &str, canonical_subject: &str, locale: &str) -> String {
        let mut hasher = DefaultHasher::new();
        check_type.hash(&mut hasher);
        provider_id.hash(&mut hasher);
        canonical_subject.hash(&mut hasher);
        locale.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Looks up a cache entry, returning its freshness relative to `now`.
    /// Cross-tenant sharing is allowed only for `PaidExternal` origin; a
    /// `CustomerProvided` entry scoped to a different tenant is a miss.
    pub fn get(&self, fingerprint: &str, tenant_id: Option<TenantId>, now: DateTime<Utc>) -> Option<(ProviderResultRecord, Freshness)> {
        let entry = self.entries.get(fingerprint)?;

        if entry.origin == CacheOrigin::CustomerProvided && entry.tenant_id != tenant_id {
            return None;
        }

        let freshness = if now < entry.fresh_until {
            Freshness::Fresh
        } else if now < entry.stale_until {
            Freshness::Stale
        } else {
            Freshness::Expired
        };

        if freshness == Freshness::Expired {
            return None;
        }

        Some((entry.provider_result.clone(), freshness))
    }

    pub fn put(&self, fingerprint: String, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry);
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> ProviderResultRecord {
        ProviderResultRecord {
            provider_id: "provider-a".to_string(),
            payload: serde_json::json!({"ok": true}),
            raw_payload_hash: "abc".to_string(),
            latency_ms: 10,
            cost_cents: 0,
            cache_hit: false,
            acquired_at: Utc::now(),
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = CacheStore::fingerprint("CRIMINAL_NATIONAL", "provider-a", "john|1980", "US");
        let b = CacheStore::fingerprint("CRIMINAL_NATIONAL", "provider-a", "john|1980", "US");
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_entry_is_returned_as_fresh() {
        let store = CacheStore::new();
        let fp = "fp1".to_string();
        let now = Utc::now();
        store.put(
            fp.clone(),
            CacheEntry {
                provider_result: record(),
                origin: CacheOrigin::PaidExternal,
                fresh_until: now + Duration::hours(1),
                stale_until: now + Duration::hours(2),
                tenant_id: None,
            },
        );
        let (_, freshness) = store.get(&fp, None, now).unwrap();
        assert_eq!(freshness, Freshness::Fresh);
    }

    #[test]
    fn expired_entry_is_treated_as_miss() {
        let store = CacheStore::new();
        let fp = "fp2".to_string();
        let now = Utc::now();
        store.put(
            fp.clone(),
            CacheEntry {
                provider_result: record(),
                origin: CacheOrigin::PaidExternal,
                fresh_until: now - Duration::hours(2),
                stale_until: now - Duration::hours(1),
                tenant_id: None,
            },
        );
        assert!(store.get(&fp, None, now).is_none());
    }

    #[test]
    fn customer_provided_entry_is_not_shared_cross_tenant() {
        let store = CacheStore::new();
        let fp = "fp3".to_string();
        let now = Utc::now();
        let owner = TenantId(uuid::Uuid::new_v4());
        let other = TenantId(uuid::Uuid::new_v4());
        store.put(
            fp.clone(),
            CacheEntry {
                provider_result: record(),
                origin: CacheOrigin::CustomerProvided,
                fresh_until: now + Duration::hours(1),
                stale_until: now + Duration::hours(2),
                tenant_id: Some(owner),
            },
        );
        assert!(store.get(&fp, Some(other), now).is_none());
        assert!(store.get(&fp, Some(owner), now).is_some());
    }
}
