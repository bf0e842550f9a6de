use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{FeedImageError, FeedImageResult};

pub const DEFAULT_PROFILE: &str = "default";
pub const BROWSER_PROFILE: &str = "browser";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// College athletics CDNs known to reject non-browser clients.
const BUILTIN_BROWSER_SUFFIXES: &[&str] = &[
    "sidearmsports.com",
    "sidearmdev.com",
    "prestosports.com",
    "careyathletics.com",
    "bmcusports.com",
    "nwccrangers.com",
    "jcbobcats.com",
    "gojsutigers.com",
    "hailstate.com",
    "olemisssports.com",
    "southernmiss.com",
];

/// Named set of request headers sent to an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProfile {
    pub name: String,
    pub headers: BTreeMap<String, String>,
    pub send_referer: bool,
}

impl HeaderProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: BTreeMap::new(),
            send_referer: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_referer(mut self, send_referer: bool) -> Self {
        self.send_referer = send_referer;
        self
    }

    /// Concrete headers for a request to `url`.
    pub fn headers_for(&self, url: &Url) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if self.send_referer {
            if let Some(host) = url.host_str() {
                headers.push(("Referer".to_string(), format!("{}://{}/", url.scheme(), host)));
            }
        }

        headers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMatch {
    Exact,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    pub host: String,
    pub match_kind: HostMatch,
    pub profile: String,
}

impl HostPolicy {
    pub fn matches(&self, host: &str) -> bool {
        match self.match_kind {
            HostMatch::Exact => host == self.host,
            HostMatch::Suffix => {
                host == self.host
                    || (host.len() > self.host.len()
                        && host.ends_with(&self.host)
                        && host.as_bytes()[host.len() - self.host.len() - 1] == b'.')
            }
        }
    }
}

/// On-disk form of the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostPolicyDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
    pub profiles: BTreeMap<String, ProfileSpec>,
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSpec {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub send_referer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    pub host: String,
    #[serde(rename = "match", default = "default_match")]
    pub match_kind: HostMatch,
    pub profile: String,
}

fn default_version() -> u32 {
    1
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_match() -> HostMatch {
    HostMatch::Suffix
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Read-only mapping from origin host to header profile.
#[derive(Debug, Clone)]
pub struct HostPolicyRegistry {
    version: u32,
    default_profile: HeaderProfile,
    profiles: HashMap<String, HeaderProfile>,
    policies: Vec<HostPolicy>,
}

impl HostPolicyRegistry {
    /// Registry shipped with the binary, used when no document is configured
    pub fn builtin() -> Self {
        let default_profile = HeaderProfile::new(DEFAULT_PROFILE).with_header(
            "User-Agent",
            concat!("feedimage/", env!("CARGO_PKG_VERSION")),
        );
        let browser = HeaderProfile::new(BROWSER_PROFILE)
            .with_header("User-Agent", BROWSER_USER_AGENT)
            .with_header(
                "Accept",
                "text/html,application/xhtml+xml,image/avif,image/webp,image/*,*/*;q=0.8",
            )
            .with_header("Accept-Language", "en-US,en;q=0.9")
            .with_referer(true);

        let policies = BUILTIN_BROWSER_SUFFIXES
            .iter()
            .map(|host| HostPolicy {
                host: host.to_string(),
                match_kind: HostMatch::Suffix,
                profile: BROWSER_PROFILE.to_string(),
            })
            .collect();

        let mut profiles = HashMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), default_profile.clone());
        profiles.insert(BROWSER_PROFILE.to_string(), browser);

        Self {
            version: 1,
            default_profile,
            profiles,
            policies,
        }
    }

    pub fn from_document(document: HostPolicyDocument) -> FeedImageResult<Self> {
        let profiles: HashMap<String, HeaderProfile> = document
            .profiles
            .into_iter()
            .map(|(name, spec)| {
                let profile = HeaderProfile {
                    name: name.clone(),
                    headers: spec.headers,
                    send_referer: spec.send_referer,
                };
                (name, profile)
            })
            .collect();

        let default_profile = profiles
            .get(&document.default_profile)
            .cloned()
            .ok_or_else(|| {
                FeedImageError::HostPolicy(format!(
                    "default profile '{}' is not defined",
                    document.default_profile
                ))
            })?;

        let mut policies = Vec::with_capacity(document.hosts.len());
        for entry in document.hosts {
            let host = normalize_host(&entry.host);
            if host.is_empty() {
                return Err(FeedImageError::HostPolicy("empty host entry".to_string()));
            }
            if !profiles.contains_key(&entry.profile) {
                return Err(FeedImageError::HostPolicy(format!(
                    "host '{}' references unknown profile '{}'",
                    entry.host, entry.profile
                )));
            }
            policies.push(HostPolicy {
                host,
                match_kind: entry.match_kind,
                profile: entry.profile,
            });
        }

        Ok(Self {
            version: document.version,
            default_profile,
            profiles,
            policies,
        })
    }

    pub fn from_json(json: &str) -> FeedImageResult<Self> {
        let document: HostPolicyDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> FeedImageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Profile for `host`. Exact entries win over suffix entries and the
    /// longest matching suffix wins among suffixes.
    pub fn lookup(&self, host: &str) -> &HeaderProfile {
        let host = normalize_host(host);

        let exact = self
            .policies
            .iter()
            .find(|p| p.match_kind == HostMatch::Exact && p.matches(&host));

        let policy = exact.or_else(|| {
            self.policies
                .iter()
                .filter(|p| p.match_kind == HostMatch::Suffix && p.matches(&host))
                .max_by_key(|p| p.host.len())
        });

        policy
            .and_then(|p| self.profiles.get(&p.profile))
            .unwrap_or(&self.default_profile)
    }

    pub fn lookup_url(&self, url: &Url) -> &HeaderProfile {
        match url.host_str() {
            Some(host) => self.lookup(host),
            None => &self.default_profile,
        }
    }

    pub fn default_profile(&self) -> &HeaderProfile {
        &self.default_profile
    }

    pub fn policies(&self) -> &[HostPolicy] {
        &self.policies
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for HostPolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
