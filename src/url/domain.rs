use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use estate_harvest::url::extract_domain;
///
/// let url = Url::parse("https://JIJI.ng/lagos").unwrap();
/// assert_eq!(extract_domain(&url), Some("jiji.ng".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a pattern
///
/// `"jiji.ng"` matches only itself; `"*.jiji.ng"` matches `jiji.ng` and any
/// subdomain of it.
///
/// ```
/// use estate_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.jiji.ng", "jiji.ng"));
/// assert!(matches_wildcard("*.jiji.ng", "www.jiji.ng"));
/// assert!(!matches_wildcard("*.jiji.ng", "notjiji.ng"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Strips a leading `www.` so `www.site.ng` and `site.ng` compare equal
pub fn strip_www(domain: &str) -> &str {
    domain.strip_prefix("www.").unwrap_or(domain)
}
