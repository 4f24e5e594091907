//! Two-tier route/port cache.
//!
//! Tier 1 is an in-process LRU (`RouteCache`) consulted on every lookup.
//! Tier 2 is an optional `SharedCache` (Dragonfly/Redis, see
//! `redis_backend`) consulted on a tier-1 miss and populated on a tier-1
//! write, mirroring the two-level caching the original service ran in
//! front of its route/port queries. Keys are MD5 fingerprints of a
//! canonical JSON encoding of the cacheable inputs; values above 1KiB are
//! zlib-compressed with a one-byte flag, rather than the string prefix
//! the original service used, since our wire format is binary already.

pub mod redis_backend;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::PlannerResult;
use crate::model::RouteRequest;

/// TTL for cached route calculations, in seconds.
pub const ROUTE_TTL_SECONDS: u64 = 1800;
/// TTL for cached port lookups, in seconds.
pub const PORT_TTL_SECONDS: u64 = 86_400;
/// Values at or above this size are zlib-compressed before storage.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1024;

const ROUTE_KEY_PREFIX: &str = "route";
const PORT_KEY_PREFIX: &str = "port";

/// Builds a stable cache key from a namespace prefix and an MD5 digest of
/// `payload`'s canonical JSON form. Canonical here means `serde_json`'s
/// default map-key ordering (BTreeMap-backed when the `preserve_order`
/// feature is off), which is what makes the digest reproducible across
/// requests with identically-valued but differently-constructed inputs.
fn fingerprint(prefix: &str, payload: &impl Serialize) -> PlannerResult<String> {
    let canonical = serde_json::to_vec(payload).map_err(|e| {
        crate::error::PlannerError::Validation(format!("failed to encode cache payload: {e}"))
    })?;
    let digest = md5::compute(&canonical);
    Ok(format!("{prefix}:{digest:x}"))
}

/// Fingerprint of a route request, covering exactly the fields that
/// determine the route calculation's outcome: origin, destination, vessel
/// type and deadweight tonnage, optimization criterion, and the number of
/// connecting ports allowed. Everything else — `departure_time`,
/// `include_alternatives`, `max_alternatives`, `timeout_seconds` — affects
/// execution but not which route is computed, so two requests differing
/// only in those fields share a cache entry.
pub fn route_fingerprint(request: &RouteRequest) -> PlannerResult<String> {
    #[derive(Serialize)]
    struct RouteCacheKey<'a> {
        origin: &'a str,
        destination: &'a str,
        vessel_type: crate::model::VesselType,
        vessel_dwt: Option<u64>,
        criterion: crate::model::OptimizationCriterion,
        max_connecting_ports: u32,
    }

    fingerprint(
        ROUTE_KEY_PREFIX,
        &RouteCacheKey {
            origin: &request.origin_unlocode,
            destination: &request.destination_unlocode,
            vessel_type: request.vessel.vessel_type,
            vessel_dwt: request.vessel.deadweight_tonnage,
            criterion: request.criterion,
            max_connecting_ports: request.max_connecting_ports,
        },
    )
}

/// Fingerprint of a single port lookup.
pub fn port_fingerprint(unlocode: &str) -> String {
    format!("{PORT_KEY_PREFIX}:{unlocode}")
}

/// An entry held in the in-process tier, with its own expiry so a stale
/// entry is never served even if it hasn't yet been evicted by the LRU.
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process LRU cache for fully-assembled route responses. Bounded by
/// capacity (oldest-used eviction) and by a per-entry TTL.
pub struct RouteCache {
    inner: Mutex<LruCache<String, Entry<crate::model::RouteResponse>>>,
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity.max(1)).unwrap();
        RouteCache { inner: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, key: &str) -> Option<crate::model::RouteResponse> {
        let mut guard = self.inner.lock().unwrap();
        match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, value: crate::model::RouteResponse, ttl: Duration) {
        let mut guard = self.inner.lock().unwrap();
        guard.put(key, Entry { value, expires_at: Instant::now() + ttl });
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Backing store for the second cache tier. Implementations own their
/// own serialization/compression and TTL handling; callers pass already
/// namespaced keys.
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> PlannerResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> PlannerResult<()>;
    async fn health_check(&self) -> bool;
}

/// One-byte flag prefixed to every value stored in a `SharedCache`
/// implementation, so `decompress` knows whether to inflate.
const COMPRESSION_FLAG_RAW: u8 = 0x00;
const COMPRESSION_FLAG_DEFLATE: u8 = 0x01;

/// Compresses `value` with zlib if it's at or above
/// `COMPRESSION_THRESHOLD_BYTES`, prefixing a one-byte flag either way.
pub fn compress(value: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    if value.len() < COMPRESSION_THRESHOLD_BYTES {
        let mut out = Vec::with_capacity(value.len() + 1);
        out.push(COMPRESSION_FLAG_RAW);
        out.extend_from_slice(value);
        return out;
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(value).expect("in-memory zlib encode cannot fail");
    let compressed = encoder.finish().expect("in-memory zlib encode cannot fail");

    let mut out = Vec::with_capacity(compressed.len() + 1);
    out.push(COMPRESSION_FLAG_DEFLATE);
    out.extend_from_slice(&compressed);
    out
}

/// Inverse of `compress`.
pub fn decompress(value: &[u8]) -> PlannerResult<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let Some((&flag, body)) = value.split_first() else {
        return Ok(Vec::new());
    };

    match flag {
        COMPRESSION_FLAG_RAW => Ok(body.to_vec()),
        COMPRESSION_FLAG_DEFLATE => {
            let mut decoder = ZlibDecoder::new(body);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| crate::error::PlannerError::UpstreamFailure(format!(
                    "failed to inflate cached value: {e}"
                )))?;
            Ok(out)
        }
        other => Err(crate::error::PlannerError::UpstreamFailure(format!(
            "unrecognized cache compression flag {other:#x}"
        ))),
    }
}

/// Ensures at most one in-flight computation per key: concurrent callers
/// asking for the same key within the same window all await the single
/// computation rather than triggering redundant work (and, for route
/// calculations, redundant upstream store/gRPC traffic).
pub struct SingleFlightGroup<V> {
    inflight: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> Default for SingleFlightGroup<V> {
    fn default() -> Self {
        SingleFlightGroup { inflight: Mutex::new(HashMap::new()) }
    }
}

impl<V: Clone> SingleFlightGroup<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `compute` for `key` if no other caller is already computing
    /// it; otherwise awaits the in-flight computation's result.
    pub async fn execute<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut guard = self.inflight.lock().unwrap();
            guard
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_init(compute).await.clone();

        {
            let mut guard = self.inflight.lock().unwrap();
            // Only the caller that "owns" the only remaining reference
            // removes the entry, so a late joiner still sees the cell.
            if Arc::strong_count(&cell) <= 2 {
                guard.remove(key);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_stored_raw() {
        let payload = b"short";
        let stored = compress(payload);
        assert_eq!(stored[0], COMPRESSION_FLAG_RAW);
        assert_eq!(decompress(&stored).unwrap(), payload);
    }

    #[test]
    fn large_values_round_trip_through_compression() {
        let payload = vec![b'x'; COMPRESSION_THRESHOLD_BYTES * 4];
        let stored = compress(&payload);
        assert_eq!(stored[0], COMPRESSION_FLAG_DEFLATE);
        assert!(stored.len() < payload.len());
        assert_eq!(decompress(&stored).unwrap(), payload);
    }

    #[test]
    fn port_fingerprint_is_namespaced() {
        assert_eq!(port_fingerprint("SGSIN"), "port:SGSIN");
    }

    fn sample_request() -> RouteRequest {
        RouteRequest {
            origin_unlocode: "SGSIN".to_string(),
            destination_unlocode: "NLRTM".to_string(),
            vessel: crate::model::VesselConstraints {
                vessel_type: crate::model::VesselType::Container,
                length_meters: 300.0,
                beam_meters: 45.0,
                draft_meters: 14.0,
                cruise_speed_knots: 18.0,
                deadweight_tonnage: Some(80_000),
                gross_tonnage: None,
                max_range_nautical_miles: 20_000.0,
                suez_compatible: true,
                panama_compatible: true,
            },
            criterion: crate::model::OptimizationCriterion::Balanced,
            departure_time: chrono::Utc::now(),
            include_alternatives: false,
            max_alternatives: 3,
            max_connecting_ports: 1,
            timeout_seconds: 30,
        }
    }

    #[test]
    fn fingerprint_ignores_fields_that_do_not_affect_the_computed_route() {
        let mut a = sample_request();
        let mut b = sample_request();
        b.departure_time += chrono::Duration::days(5);
        b.include_alternatives = true;
        b.max_alternatives = 10;
        b.timeout_seconds = 5;

        assert_eq!(route_fingerprint(&a).unwrap(), route_fingerprint(&b).unwrap());

        a.max_connecting_ports = 2;
        assert_ne!(route_fingerprint(&a).unwrap(), route_fingerprint(&b).unwrap());
    }

    #[tokio::test]
    async fn single_flight_runs_compute_once_for_concurrent_callers() {
        let group = Arc::new(SingleFlightGroup::<u32>::new());
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let group = Arc::clone(&group);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                group
                    .execute("k", || async {
                        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        42u32
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }

        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
