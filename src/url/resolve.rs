use url::Url;

/// Resolves a listing card `href` into the canonical listing URL
///
/// * `/path` is joined onto the site root
/// * `//host/path` gets an `https:` scheme
/// * absolute `http(s)` links are kept verbatim
/// * other relative links are resolved against the root
///
/// Anything that cannot be resolved, or is not a web link, yields an empty
/// string. Empty URLs never pass deduplication.
pub fn resolve_listing_href(href: &str, root: &Url) -> String {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return String::new();
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    if href.starts_with('/') {
        let origin = root.origin().ascii_serialization();
        return format!("{}{}", origin, href);
    }

    root.join(href)
        .map(|url| url.to_string())
        .unwrap_or_default()
}

/// Normalizes an image `src`: protocol-relative sources become `https://`
pub fn normalize_image_src(src: &str) -> String {
    let src = src.trim();
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => src.to_string(),
    }
}
