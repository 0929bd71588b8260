//! Host matching used to pair frames with sites.
//!
//! Two hosts match when, after lowercasing and dropping a leading `www.`,
//! they are equal or one is a subdomain of the other.

use url::Url;

/// Lowercase a hostname and drop one leading `www.`.
pub fn normalize_hostname(hostname: &str) -> String {
    let lower = hostname.to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Subdomain tolerant host comparison.
pub fn matches_host(host_a: &str, host_b: &str) -> bool {
    let a = normalize_hostname(host_a);
    let b = normalize_hostname(host_b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.ends_with(&format!(".{}", b)) || b.ends_with(&format!(".{}", a))
}

/// Hostname of an absolute URL, `None` when it does not parse or has no host.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
}

/// Whether `url` points at the same site as `site_url`.
pub fn url_matches_host(url: &str, site_url: &str) -> bool {
    match (host_of(url), host_of(site_url)) {
        (Some(a), Some(b)) => matches_host(&a, &b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_www_and_case() {
        assert_eq!(normalize_hostname("WWW.Example.COM"), "example.com");
        assert_eq!(normalize_hostname("chat.example.com"), "chat.example.com");
    }

    #[test]
    fn test_normalize_strips_only_one_www() {
        assert_eq!(normalize_hostname("www.www.example.com"), "www.example.com");
    }

    #[test]
    fn test_matches_www_variant() {
        assert!(matches_host("www.Example.com", "example.com"));
    }

    #[test]
    fn test_matches_subdomain_both_directions() {
        assert!(matches_host("chat.example.com", "example.com"));
        assert!(matches_host("example.com", "chat.example.com"));
    }

    #[test]
    fn test_unrelated_hosts_do_not_match() {
        assert!(!matches_host("example.com", "other.com"));
        assert!(!matches_host("notexample.com", "example.com"));
    }

    #[test]
    fn test_empty_host_never_matches() {
        assert!(!matches_host("", "example.com"));
        assert!(!matches_host("", ""));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://gemini.google.com/app?hl=en").as_deref(),
            Some("gemini.google.com")
        );
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("about:blank"), None);
    }

    #[test]
    fn test_url_matches_host() {
        assert!(url_matches_host("https://www.perplexity.ai/search/abc", "https://perplexity.ai"));
        assert!(!url_matches_host("https://grok.com/", "https://chatgpt.com"));
        assert!(!url_matches_host("garbage", "https://chatgpt.com"));
    }
}
