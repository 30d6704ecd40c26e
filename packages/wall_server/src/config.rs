use incident_directory::{MAX_PAGE_SIZE, StrapiConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   config.toml:     [remote]
//                    base_url = "https://cms.example.org"
//
//   env var:         WALL_REMOTE__BASE_URL=https://cms.example.org
//                    (double underscore = nesting)
//
//   (single underscore stays within field names: WALL_CACHE__STATS_TTL_SECS)

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub remote: RemoteFileConfig,
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub cache: CacheFileConfig,
    #[serde(default)]
    pub locales: LocaleFileConfig,
}

/// Content repository connection (lives under `[remote]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteFileConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Largest page size the remote serves.
    #[serde(default = "default_page_cap")]
    pub page_cap: u32,
    /// 0 = no client-side timeout.
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl Default for RemoteFileConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            page_cap: default_page_cap(),
            request_timeout_secs: 0,
        }
    }
}

/// Listener settings (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Cache lifetimes (lives under `[cache]` in config.toml). 0 disables a cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheFileConfig {
    #[serde(default = "default_listing_ttl")]
    pub listing_ttl_secs: u64,
    #[serde(default = "default_stats_ttl")]
    pub stats_ttl_secs: u64,
}

impl Default for CacheFileConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: default_listing_ttl(),
            stats_ttl_secs: default_stats_ttl(),
        }
    }
}

/// Served locales (lives under `[locales]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocaleFileConfig {
    #[serde(default = "default_supported_locales")]
    pub supported: Vec<String>,
    #[serde(default = "default_locale")]
    pub default: String,
}

impl Default for LocaleFileConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_locales(),
            default: default_locale(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:1337".to_string()
}
fn default_collection() -> String {
    "the-wall-of-shames".to_string()
}
fn default_page_cap() -> u32 {
    MAX_PAGE_SIZE
}
fn default_listing_ttl() -> u64 {
    60
}
fn default_stats_ttl() -> u64 {
    3600
}
fn default_supported_locales() -> Vec<String> {
    ["fr-CH", "de-CH", "it-CH", "en"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_locale() -> String {
    "fr-CH".to_string()
}

/// Build a figment that layers: defaults → config file → WALL_* env vars.
///
/// A missing config file is not an error; its layer is simply empty.
///
/// Env vars use double-underscore for nesting into sections:
///   `WALL_REMOTE__PAGE_CAP=50`  →  `remote.page_cap = 50`
///   `WALL_SERVER__PORT=8080`    →  `server.port = 8080`
pub fn load_config(config_file: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_file))
        .merge(Env::prefixed("WALL_").split("__"))
}

// =============================================================================
// Runtime config structs (derived from FileConfig)
// =============================================================================

impl RemoteFileConfig {
    pub fn strapi_config(&self) -> StrapiConfig {
        let mut config = StrapiConfig::new(&self.base_url, &self.collection);
        if self.request_timeout_secs > 0 {
            config.timeout = Some(Duration::from_secs(self.request_timeout_secs));
        }
        config
    }
}

/// Cache lifetimes (runtime view).
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub listing_ttl: Duration,
    pub stats_ttl: Duration,
}

impl CacheConfig {
    pub fn from_file(fc: &CacheFileConfig) -> Self {
        Self {
            listing_ttl: Duration::from_secs(fc.listing_ttl_secs),
            stats_ttl: Duration::from_secs(fc.stats_ttl_secs),
        }
    }
}

/// Served locales (runtime view). The default is always supported.
#[derive(Clone, Debug)]
pub struct LocaleConfig {
    supported: Vec<String>,
    default: String,
}

impl LocaleConfig {
    pub fn from_file(fc: &LocaleFileConfig) -> Self {
        let default = match fc.default.trim() {
            "" => default_locale(),
            locale => locale.to_string(),
        };
        let mut supported: Vec<String> = fc
            .supported
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if !supported.contains(&default) {
            supported.insert(0, default.clone());
        }
        Self { supported, default }
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// The requested locale if it is served, the default otherwise.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(lang) if self.supported.iter().any(|l| l == lang) => lang,
            _ => &self.default,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::from_file(&LocaleFileConfig::default())
    }
}
