use url::Url;

/// Ad networks, social trackers and watermarked stock sites.
const BLOCKED_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "adnxs.com",
    "adsrvr.org",
    "amazon-adsystem.com",
    "advertising.com",
    "pubmatic.com",
    "rubiconproject.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "facebook.com",
    "facebook.net",
    "twitter.com",
    "shutterstock.com",
    "istockphoto.com",
    "gettyimages.com",
];

const BLOCKED_KEYWORDS: &[&str] = &[
    "pixel.",
    "/pixel",
    "spacer",
    "1x1",
    "tracking",
    "beacon",
    "analytics",
    "gravatar",
];

/// Image URLs that are never fetched.
#[derive(Debug, Clone)]
pub struct UrlBlocklist {
    domains: Vec<String>,
    keywords: Vec<String>,
}

impl UrlBlocklist {
    pub fn new(domains: Vec<String>, keywords: Vec<String>) -> Self {
        Self {
            domains: domains.into_iter().map(|d| d.to_ascii_lowercase()).collect(),
            keywords: keywords.into_iter().map(|k| k.to_ascii_lowercase()).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(
            BLOCKED_DOMAINS.iter().map(|s| s.to_string()).collect(),
            BLOCKED_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// The rule that blocks `url`, if any. Domains match the host on a
    /// label boundary. Keywords only match the path and query, as whole
    /// tokens.
    pub fn blocked_by(&self, url: &Url) -> Option<&str> {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let domain = self.domains.iter().find(|d| {
            host == d.as_str() || host.ends_with(&format!(".{}", d))
        });
        if let Some(domain) = domain {
            return Some(domain.as_str());
        }

        let mut target = url.path().to_ascii_lowercase();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(&query.to_ascii_lowercase());
        }
        self.keywords
            .iter()
            .find(|k| contains_token(&target, k))
            .map(|k| k.as_str())
    }

    pub fn is_blocked(&self, url: &Url) -> bool {
        self.blocked_by(url).is_some()
    }
}

/// `needle` occurs in `haystack` without alphanumerics glued to its
/// alphanumeric ends.
fn contains_token(haystack: &str, needle: &str) -> bool {
    let glued = |c: Option<char>| c.map_or(false, |c| c.is_ascii_alphanumeric());
    let starts_alnum = needle.starts_with(|c: char| c.is_ascii_alphanumeric());
    let ends_alnum = needle.ends_with(|c: char| c.is_ascii_alphanumeric());

    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !(starts_alnum && glued(before)) && !(ends_alnum && glued(after))
    })
}

impl Default for UrlBlocklist {
    fn default() -> Self {
        Self::standard()
    }
}
