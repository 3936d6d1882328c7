use serde::{Deserialize, Serialize};

/// How queries are carried to a DoH endpoint (RFC 8484 §4.1).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DohMethod {
    #[default]
    Post,
    Get,
}

impl DohMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// DoH endpoint URLs, tried in order (failover).
    #[serde(default = "default_upstream_urls")]
    pub upstream_urls: Vec<String>,

    #[serde(default)]
    pub doh_method: DohMethod,

    /// Per-query deadline in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Backpressure ceiling on concurrent upstream forwards.
    #[serde(default = "default_max_inflight_forwards")]
    pub max_inflight_forwards: usize,

    /// How long a query may wait for a forward slot before SERVFAIL.
    #[serde(default = "default_queue_wait_ms")]
    pub queue_wait_ms: u64,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// TTL clamps applied to positive answers, in seconds.
    #[serde(default = "default_min_ttl")]
    pub min_ttl: u32,
    #[serde(default = "default_max_ttl")]
    pub max_ttl: u32,

    /// Negative-cache TTL bounds. `negative_max_ttl = 0` disables
    /// negative caching entirely.
    #[serde(default = "default_negative_min_ttl")]
    pub negative_min_ttl: u32,
    #[serde(default = "default_negative_max_ttl")]
    pub negative_max_ttl: u32,
    /// Used when a negative answer carries no SOA.
    #[serde(default = "default_negative_default_ttl")]
    pub negative_default_ttl: u32,

    /// An entry whose remaining TTL drops below this fraction of its
    /// original TTL becomes a prefetch candidate.
    #[serde(default = "default_prefetch_fraction")]
    pub prefetch_fraction: f64,

    #[serde(default = "default_false")]
    pub dnssec_enabled: bool,

    /// Base64 root-zone DNSKEY overriding the built-in root anchor.
    #[serde(default)]
    pub trust_anchor_key: Option<String>,

    /// Consecutive failures before an endpoint is marked unhealthy.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an unhealthy endpoint sits out before being re-probed.
    #[serde(default = "default_upstream_cooldown_secs")]
    pub upstream_cooldown_secs: u64,

    #[serde(default = "default_cache_shard_amount")]
    pub cache_shard_amount: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_urls: default_upstream_urls(),
            doh_method: DohMethod::Post,
            query_timeout_ms: default_query_timeout_ms(),
            max_inflight_forwards: default_max_inflight_forwards(),
            queue_wait_ms: default_queue_wait_ms(),
            cache_enabled: true,
            cache_max_entries: default_cache_max_entries(),
            min_ttl: default_min_ttl(),
            max_ttl: default_max_ttl(),
            negative_min_ttl: default_negative_min_ttl(),
            negative_max_ttl: default_negative_max_ttl(),
            negative_default_ttl: default_negative_default_ttl(),
            prefetch_fraction: default_prefetch_fraction(),
            dnssec_enabled: false,
            trust_anchor_key: None,
            failure_threshold: default_failure_threshold(),
            upstream_cooldown_secs: default_upstream_cooldown_secs(),
            cache_shard_amount: default_cache_shard_amount(),
        }
    }
}

fn default_upstream_urls() -> Vec<String> {
    vec![
        "https://cloudflare-dns.com/dns-query".to_string(),
        "https://dns.google/dns-query".to_string(),
    ]
}

fn default_query_timeout_ms() -> u64 {
    3000
}

fn default_max_inflight_forwards() -> usize {
    512
}

fn default_queue_wait_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_cache_max_entries() -> usize {
    100_000
}

fn default_min_ttl() -> u32 {
    1
}

fn default_max_ttl() -> u32 {
    86_400
}

fn default_negative_min_ttl() -> u32 {
    30
}

fn default_negative_max_ttl() -> u32 {
    3_600
}

fn default_negative_default_ttl() -> u32 {
    60
}

fn default_prefetch_fraction() -> f64 {
    0.10
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_upstream_cooldown_secs() -> u64 {
    30
}

fn default_cache_shard_amount() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus * 4).next_power_of_two().clamp(8, 256)
}
