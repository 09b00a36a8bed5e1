use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, IntCounter, IntCounterVec, register_counter, register_gauge,
    register_histogram, register_int_counter, register_int_counter_vec,
};

lazy_static! {
    pub static ref LOOKUP_TOTAL: Counter =
        register_counter!("profile_lookups_total", "Total number of profile lookups").expect("register profile_lookups_total");
    pub static ref RATE_LIMITED: Counter =
        register_counter!("profile_rate_limited_total", "Lookups rejected by the rate limiter").expect("register profile_rate_limited_total");
    pub static ref CACHE_HITS: Counter =
        register_counter!("profile_cache_hits_total", "Total cache hits").expect("register profile_cache_hits_total");
    pub static ref CACHE_MISSES: Counter =
        register_counter!("profile_cache_misses_total", "Total cache misses").expect("register profile_cache_misses_total");
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("profile_cache_size", "Current number of items in cache").expect("register profile_cache_size");
    pub static ref UPSTREAM_CALLS: IntCounterVec = register_int_counter_vec!(
        "profile_upstream_calls_total",
        "Directory calls by outcome",
        &["outcome"]
    )
    .expect("register profile_upstream_calls_total");
    pub static ref UPSTREAM_USAGE_UNITS: IntCounter = register_int_counter!(
        "profile_upstream_usage_units_total",
        "Advisory usage units spent on successful directory calls"
    )
    .expect("register profile_upstream_usage_units_total");
    pub static ref LOOKUP_LATENCY: Histogram = register_histogram!(
        "profile_lookup_latency_seconds",
        "Lookup latency in seconds"
    )
    .expect("register profile_lookup_latency_seconds");
}
