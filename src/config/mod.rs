use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::StageKind;
use crate::errors::{FeedImageError, FeedImageResult};
use crate::http::HostPolicyRegistry;
use crate::images::{ImageValidator, TitleCleaner};
use crate::stages::DEFAULT_FALLBACK_QUERY;

const MIB: u64 = 1024 * 1024;

/// Limits applied to every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub image_timeout: Duration,
    pub page_timeout: Duration,
    pub api_timeout: Duration,
    pub max_image_bytes: u64,
    pub max_page_bytes: u64,
    pub max_redirects: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(30),
            page_timeout: Duration::from_secs(30),
            api_timeout: Duration::from_secs(15),
            max_image_bytes: 5 * MIB,
            max_page_bytes: 2 * MIB,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    pub min_bytes: usize,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_bytes: 512,
            min_width: 100,
            min_height: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSettings {
    pub pexels_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub pexels_hourly_quota: u32,
    pub unsplash_hourly_quota: u32,
    pub results_per_query: u32,
    pub min_result_width: Option<u32>,
    pub fallback_query: String,
}

impl StockSettings {
    pub fn has_credentials(&self) -> bool {
        self.pexels_api_key.is_some() || self.unsplash_access_key.is_some()
    }
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            pexels_api_key: None,
            unsplash_access_key: None,
            pexels_hourly_quota: 200,
            unsplash_hourly_quota: 50,
            results_per_query: 5,
            min_result_width: None,
            fallback_query: DEFAULT_FALLBACK_QUERY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub fetch: FetchSettings,
    pub validation: ValidationSettings,
    pub stock: StockSettings,
    pub stage_order: Vec<StageKind>,
    pub workers: usize,
    pub log_level: String,
    pub asset_dir: Option<PathBuf>,
    pub host_policies_path: Option<PathBuf>,
    pub boilerplate_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            validation: ValidationSettings::default(),
            stock: StockSettings::default(),
            stage_order: StageKind::STANDARD_ORDER.to_vec(),
            workers: 4,
            log_level: "info".to_string(),
            asset_dir: None,
            host_policies_path: None,
            boilerplate_path: None,
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeedImageResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> FeedImageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let d = &defaults.fetch;
        let fetch = FetchSettings {
            connect_timeout: secs(&get, "FEEDIMAGE_CONNECT_TIMEOUT_SECS", d.connect_timeout)?,
            image_timeout: secs(&get, "FEEDIMAGE_IMAGE_TIMEOUT_SECS", d.image_timeout)?,
            page_timeout: secs(&get, "FEEDIMAGE_PAGE_TIMEOUT_SECS", d.page_timeout)?,
            api_timeout: secs(&get, "FEEDIMAGE_API_TIMEOUT_SECS", d.api_timeout)?,
            max_image_bytes: number(&get, "FEEDIMAGE_MAX_IMAGE_BYTES", d.max_image_bytes)?,
            max_page_bytes: number(&get, "FEEDIMAGE_MAX_PAGE_BYTES", d.max_page_bytes)?,
            max_redirects: number(&get, "FEEDIMAGE_MAX_REDIRECTS", d.max_redirects)?,
        };

        let v = &defaults.validation;
        let validation = ValidationSettings {
            min_bytes: number(&get, "FEEDIMAGE_MIN_IMAGE_BYTES", v.min_bytes)?,
            min_width: number(&get, "FEEDIMAGE_MIN_WIDTH", v.min_width)?,
            min_height: number(&get, "FEEDIMAGE_MIN_HEIGHT", v.min_height)?,
        };

        let st = &defaults.stock;
        let stock = StockSettings {
            pexels_api_key: get("FEEDIMAGE_PEXELS_API_KEY").or_else(|| get("PEXELS_API_KEY")),
            unsplash_access_key: get("FEEDIMAGE_UNSPLASH_ACCESS_KEY")
                .or_else(|| get("UNSPLASH_ACCESS_KEY")),
            pexels_hourly_quota: positive(
                &get,
                "FEEDIMAGE_PEXELS_HOURLY_QUOTA",
                st.pexels_hourly_quota,
            )?,
            unsplash_hourly_quota: positive(
                &get,
                "FEEDIMAGE_UNSPLASH_HOURLY_QUOTA",
                st.unsplash_hourly_quota,
            )?,
            results_per_query: positive(&get, "FEEDIMAGE_STOCK_RESULTS", st.results_per_query)?,
            min_result_width: get("FEEDIMAGE_STOCK_MIN_WIDTH")
                .map(|raw| parse_value("FEEDIMAGE_STOCK_MIN_WIDTH", &raw))
                .transpose()?,
            fallback_query: get("FEEDIMAGE_FALLBACK_QUERY")
                .unwrap_or_else(|| st.fallback_query.clone()),
        };

        let stage_order = match get("FEEDIMAGE_STAGE_ORDER") {
            Some(raw) => parse_stage_order(&raw)?,
            None => defaults.stage_order.clone(),
        };

        Ok(Self {
            fetch,
            validation,
            stock,
            stage_order,
            workers: positive(&get, "FEEDIMAGE_WORKERS", defaults.workers)?,
            log_level: get("FEEDIMAGE_LOG_LEVEL").unwrap_or_else(|| defaults.log_level.clone()),
            asset_dir: get("FEEDIMAGE_ASSET_DIR").map(PathBuf::from),
            host_policies_path: get("FEEDIMAGE_HOST_POLICIES").map(PathBuf::from),
            boilerplate_path: get("FEEDIMAGE_BOILERPLATE").map(PathBuf::from),
        })
    }

    /// Built-in registry unless a policy document is configured.
    pub fn host_registry(&self) -> FeedImageResult<HostPolicyRegistry> {
        match &self.host_policies_path {
            Some(path) => HostPolicyRegistry::load(path),
            None => Ok(HostPolicyRegistry::builtin()),
        }
    }

    pub fn title_cleaner(&self) -> FeedImageResult<TitleCleaner> {
        match &self.boilerplate_path {
            Some(path) => TitleCleaner::load(path),
            None => TitleCleaner::standard(),
        }
    }

    pub fn validator(&self) -> ImageValidator {
        ImageValidator::new(
            self.validation.min_bytes,
            self.validation.min_width,
            self.validation.min_height,
        )
    }
}

/// Comma separated stage names. Each stage may appear once.
pub fn parse_stage_order(raw: &str) -> FeedImageResult<Vec<StageKind>> {
    let mut order = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = StageKind::from_str(name).map_err(FeedImageError::Config)?;
        if order.contains(&kind) {
            return Err(FeedImageError::Config(format!(
                "Stage {} listed twice in FEEDIMAGE_STAGE_ORDER",
                kind
            )));
        }
        order.push(kind);
    }
    if order.is_empty() {
        return Err(FeedImageError::Config(
            "FEEDIMAGE_STAGE_ORDER names no stages".to_string(),
        ));
    }
    Ok(order)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> FeedImageResult<T> {
    raw.parse::<T>()
        .map_err(|_| FeedImageError::Config(format!("{} has invalid value {:?}", key, raw)))
}

fn number<T, G>(get: &G, key: &str, default: T) -> FeedImageResult<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn positive<T, G>(get: &G, key: &str, default: T) -> FeedImageResult<T>
where
    T: FromStr + PartialOrd + Default,
    G: Fn(&str) -> Option<String>,
{
    let value = number(get, key, default)?;
    if value <= T::default() {
        return Err(FeedImageError::Config(format!("{} must be at least 1", key)));
    }
    Ok(value)
}

fn secs<G>(get: &G, key: &str, default: Duration) -> FeedImageResult<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = positive(get, key, default.as_secs())?;
    Ok(Duration::from_secs(secs))
}
