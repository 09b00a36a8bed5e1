use clap::Parser;
use std::path::Path;
use std::time::Duration;

use crate::error::LookupError;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "profile-gateway")]
#[command(about = "Caching, rate-limited proxy for directory profile lookups")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Bulk user lookup endpoint of the directory service
    #[arg(long, env = "DIRECTORY_URL", default_value = "https://api.neynar.com/v2/farcaster/user/bulk")]
    pub upstream_url: String,

    // API key sent as the x-api-key header
    #[arg(long, env = "DIRECTORY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Upstream request timeout in seconds
    #[arg(long, env = "DIRECTORY_TIMEOUT", default_value_t = 10)]
    pub upstream_timeout: u64,

    // Where callers are sent when the directory quota is exhausted
    #[arg(long, env = "PROFILE_LINK_BASE", default_value = "https://warpcast.com/~/profiles")]
    pub profile_link_base: String,

    // Cache TTL in seconds
    #[arg(short, long, env = "CACHE_TTL", default_value_t = 300)]
    pub cache_ttl: u64,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 300)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 3600)]
    pub rate_window: u64,

    // Expired entry sweep interval in seconds, 0 disables it
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Key clients by x-real-ip / x-forwarded-for, only behind a proxy that sets them
    #[arg(long, env = "TRUST_PROXY_HEADERS")]
    pub trust_proxy_headers: bool,
}

/// Loads `path` into the environment. A missing file is not an error.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Validated settings consumed by the lookup service.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub upstream_url: String,
    pub api_key: String,
    pub upstream_timeout: Duration,
    pub profile_link_base: String,
    pub cache_ttl: Duration,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub sweep_interval: Option<Duration>,
}

impl LookupConfig {
    /// Defaults with the given key; still needs [`LookupConfig::validate`].
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            upstream_url: "https://api.neynar.com/v2/farcaster/user/bulk".to_string(),
            api_key: api_key.into(),
            upstream_timeout: Duration::from_secs(10),
            profile_link_base: "https://warpcast.com/~/profiles".to_string(),
            cache_ttl: Duration::from_secs(300),
            rate_limit: 300,
            rate_window: Duration::from_secs(3600),
            sweep_interval: Some(Duration::from_secs(60)),
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, LookupError> {
        let config = Self {
            upstream_url: args.upstream_url.clone(),
            api_key: args.api_key.clone().unwrap_or_default(),
            upstream_timeout: Duration::from_secs(args.upstream_timeout),
            profile_link_base: args.profile_link_base.clone(),
            cache_ttl: Duration::from_secs(args.cache_ttl),
            rate_limit: args.rate_limit,
            rate_window: Duration::from_secs(args.rate_window),
            sweep_interval: (args.sweep_interval > 0).then(|| Duration::from_secs(args.sweep_interval)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LookupError> {
        let fail = |msg: &str| -> Result<(), LookupError> { Err(LookupError::ConfigurationError(msg.to_string())) };

        if self.api_key.trim().is_empty() {
            return fail("directory API key is missing (set DIRECTORY_API_KEY or --api-key)");
        }
        if self.rate_limit == 0 {
            return fail("rate limit must allow at least one request per window");
        }
        if self.rate_window.is_zero() {
            return fail("rate window must be longer than zero seconds");
        }
        if self.cache_ttl.is_zero() {
            return fail("cache TTL must be longer than zero seconds");
        }
        if self.upstream_timeout.is_zero() {
            return fail("upstream timeout must be longer than zero seconds");
        }
        Ok(())
    }

    pub fn fallback_link(&self, identifier: &str) -> String {
        format!("{}/{}", self.profile_link_base.trim_end_matches('/'), identifier)
    }
}
