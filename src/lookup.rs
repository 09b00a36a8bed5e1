//! The lookup-and-protect layer: validation, rate limiting, caching and the
//! upstream call, in that order.
//!
//! Concurrent identical lookups are not coalesced. Two callers that miss the cache
//! at the same time will both reach the directory and the later `put` wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::ProfileCache;
use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE, LOOKUP_LATENCY, LOOKUP_TOTAL, RATE_LIMITED, UPSTREAM_CALLS, UPSTREAM_USAGE_UNITS};
use crate::models::{Identifier, NormalizedProfile, RawUserRecord};
use crate::normalize::{extract_identifier, normalize_with_fallback};
use crate::rate_limit::{Admission, RateLimiter};
use crate::upstream::{DirectoryClient, Upstream, UpstreamFailure};

/// Advisory usage units charged per successful directory call.
pub const UPSTREAM_CALL_COST: u64 = 2;

pub struct LookupService {
    config: LookupConfig,
    cache: ProfileCache,
    limiter: RateLimiter,
    upstream: Arc<dyn Upstream>,
    usage_units: AtomicU64,
}

impl LookupService {
    pub fn new(config: LookupConfig, upstream: Arc<dyn Upstream>) -> Result<Self, LookupError> {
        config.validate()?;
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit, config.rate_window),
            cache: ProfileCache::new(),
            upstream,
            usage_units: AtomicU64::new(0),
            config,
        })
    }

    /// Builds the service against the real directory over HTTP.
    pub fn with_directory(config: LookupConfig, client: reqwest::Client) -> Result<Self, LookupError> {
        let directory = DirectoryClient::new(
            client,
            &config.upstream_url,
            config.api_key.clone(),
            config.upstream_timeout,
        )?;
        Self::new(config, Arc::new(directory))
    }

    pub async fn lookup(&self, raw_id: &str, client_key: &str) -> Result<NormalizedProfile, LookupError> {
        LOOKUP_TOTAL.inc();
        let start_time = Instant::now();
        let result = self.resolve(raw_id, client_key).await;
        LOOKUP_LATENCY.observe(start_time.elapsed().as_secs_f64());
        result
    }

    async fn resolve(&self, raw_id: &str, client_key: &str) -> Result<NormalizedProfile, LookupError> {
        let id = Identifier::parse(raw_id)?;

        if self.limiter.admit(client_key) == Admission::Rejected {
            RATE_LIMITED.inc();
            debug!(client = client_key, "rate limit exceeded");
            return Err(LookupError::RateLimited);
        }

        if let Some(raw) = self.cache.get(id.as_str()) {
            CACHE_HITS.inc();
            debug!(%id, "cache hit");
            return Ok(normalize_with_fallback(&raw, id.as_str()));
        }
        CACHE_MISSES.inc();
        debug!(%id, "cache miss, calling directory");

        let records = self.fetch(&id).await.map_err(|failure| self.map_failure(&id, failure))?;

        let Some(record) = records.into_iter().next() else {
            return Err(LookupError::NotFound(id.to_string()));
        };

        let returned_id = extract_identifier(&record).ok_or_else(|| {
            LookupError::UpstreamMalformed(format!("record returned for {id} has no identifier field"))
        })?;
        if returned_id != id.as_str() {
            warn!(requested = %id, returned = %returned_id, "directory returned a different identifier, caching under the returned one");
        }

        let profile = normalize_with_fallback(&record, &returned_id);
        self.cache.put(returned_id, record, self.config.cache_ttl);
        CACHE_SIZE.set(self.cache.len() as f64);

        Ok(profile)
    }

    async fn fetch(&self, id: &Identifier) -> Result<Vec<RawUserRecord>, UpstreamFailure> {
        let timeout = self.config.upstream_timeout;
        let records = tokio::time::timeout(timeout, self.upstream.fetch_users(id))
            .await
            .map_err(|_| UpstreamFailure::Transport(format!("timed out after {timeout:?}")))??;

        UPSTREAM_CALLS.with_label_values(&["success"]).inc();
        self.usage_units.fetch_add(UPSTREAM_CALL_COST, Ordering::Relaxed);
        UPSTREAM_USAGE_UNITS.inc_by(UPSTREAM_CALL_COST);
        Ok(records)
    }

    fn map_failure(&self, id: &Identifier, failure: UpstreamFailure) -> LookupError {
        let (outcome, err) = match failure {
            UpstreamFailure::NotFound => ("not_found", LookupError::NotFound(id.to_string())),
            UpstreamFailure::PaymentRequired => (
                "payment_required",
                LookupError::QuotaExceeded {
                    fallback_url: self.config.fallback_link(id.as_str()),
                },
            ),
            UpstreamFailure::Unauthorized { status } => ("unauthorized", LookupError::UpstreamAuthError { status }),
            UpstreamFailure::Status { status, body } | UpstreamFailure::Malformed { status, body } => {
                warn!(%id, status, body = %body, "directory error body");
                ("error", LookupError::UpstreamError { status, body })
            }
            UpstreamFailure::Transport(reason) => ("transport", LookupError::TransportError(reason)),
        };

        UPSTREAM_CALLS.with_label_values(&[outcome]).inc();
        match &err {
            LookupError::NotFound(_) => debug!(%id, "directory has no such user"),
            LookupError::QuotaExceeded { .. } => info!(%id, "directory quota exhausted"),
            other => warn!(%id, kind = other.kind(), error = %other, "directory call failed"),
        }
        err
    }

    /// Total advisory usage units spent by this service.
    pub fn usage_units(&self) -> u64 {
        self.usage_units.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
