use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_audit::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Compares two hostnames, treating a leading `www.` as insignificant
///
/// `example.com` and `www.example.com` are the same site; any other
/// subdomain is not.
pub fn same_site(a: &str, b: &str) -> bool {
    strip_www(&a.to_lowercase()) == strip_www(&b.to_lowercase())
}

/// Returns true if `url` lives on the same site as `host`
pub fn is_internal(url: &Url, host: &str) -> bool {
    url.host_str().map(|h| same_site(h, host)).unwrap_or(false)
}

/// Rewrites a same-site URL onto the root's exact host spelling
///
/// `www.example.com` and `example.com` are one site; without this the
/// frontier would fetch both spellings of every page. URLs on other hosts
/// are returned unchanged.
pub fn on_root_host(mut url: Url, root: &Url) -> Url {
    let (Some(host), Some(root_host)) = (url.host_str(), root.host_str()) else {
        return url;
    };
    if host != root_host && same_site(host, root_host) {
        let root_host = root_host.to_string();
        if url.set_host(Some(&root_host)).is_err() {
            tracing::debug!("Could not move {} onto host {}", url, root_host);
        }
    }
    url
}

/// Number of non-empty path segments (`/` is 0, `/about` is 1)
pub fn path_depth(url: &Url) -> usize {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).count())
        .unwrap_or(0)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
