//! Canonical conversation URLs.

use chatcast_dom::{find_str, Document};
use chatcast_protocols::UrlExtractor;
use regex::Regex;
use tracing::debug;
use url::Url;

/// Derive the URL worth keeping for a conversation.
///
/// `location` is the frame's current URL and `doc` its snapshot, when one
/// is available.
pub fn canonical_url(location: &str, doc: Option<&Document>, extractor: &UrlExtractor) -> String {
    let mut url = alternate_link(location, doc, extractor).unwrap_or_else(|| location.to_string());

    if let Some(pattern) = extractor.url_pattern.as_deref() {
        match Regex::new(pattern) {
            Ok(re) => {
                if let Some(caps) = re.captures(&url) {
                    let hit = caps.get(1).or_else(|| caps.get(0));
                    if let Some(hit) = hit {
                        url = hit.as_str().to_string();
                    }
                }
            }
            Err(e) => debug!(pattern, error = %e, "ignoring invalid url pattern"),
        }
    }

    if extractor.remove_params.is_empty() {
        return url;
    }
    strip_params(&url, &extractor.remove_params).unwrap_or(url)
}

fn alternate_link(location: &str, doc: Option<&Document>, extractor: &UrlExtractor) -> Option<String> {
    let doc = doc?;
    let selector = extractor.alternate_link_selector.as_deref()?;
    let node = find_str(doc, selector, doc.root()).ok().flatten()?;
    let href = doc.attr(node, "href").filter(|h| !h.trim().is_empty())?;
    match Url::parse(location).and_then(|base| base.join(href)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(href.to_string()),
    }
}

fn strip_params(url: &str, remove: &[String]) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !remove.iter().any(|r| r == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcast_dom::parse_html;

    fn extractor(selector: Option<&str>, pattern: Option<&str>, remove: &[&str]) -> UrlExtractor {
        UrlExtractor {
            alternate_link_selector: selector.map(String::from),
            url_pattern: pattern.map(String::from),
            remove_params: remove.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_location_passes_through() {
        let url = "https://chat.example.com/c/123?model=x";
        assert_eq!(canonical_url(url, None, &UrlExtractor::default()), url);
    }

    #[test]
    fn test_alternate_link_resolved_against_location() {
        let doc = parse_html(r#"<link rel="canonical" href="/share/abc"><p>hi</p>"#);
        let ext = extractor(Some("link[rel=canonical]"), None, &[]);
        assert_eq!(
            canonical_url("https://chat.example.com/c/1", Some(&doc), &ext),
            "https://chat.example.com/share/abc"
        );
    }

    #[test]
    fn test_missing_alternate_link_falls_back() {
        let doc = parse_html("<p>hi</p>");
        let ext = extractor(Some("link[rel=canonical]"), None, &[]);
        assert_eq!(
            canonical_url("https://chat.example.com/c/1", Some(&doc), &ext),
            "https://chat.example.com/c/1"
        );
    }

    #[test]
    fn test_url_pattern_capture_group() {
        let ext = extractor(None, Some(r"(https://chat\.example\.com/c/[0-9]+)"), &[]);
        assert_eq!(
            canonical_url("https://chat.example.com/c/42/extra", None, &ext),
            "https://chat.example.com/c/42"
        );
    }

    #[test]
    fn test_invalid_pattern_ignored() {
        let ext = extractor(None, Some("(unclosed"), &[]);
        assert_eq!(
            canonical_url("https://chat.example.com/c/1", None, &ext),
            "https://chat.example.com/c/1"
        );
    }

    #[test]
    fn test_remove_params() {
        let ext = extractor(None, None, &["utm_source", "ref"]);
        assert_eq!(
            canonical_url("https://chat.example.com/c/1?utm_source=x&model=y&ref=z", None, &ext),
            "https://chat.example.com/c/1?model=y"
        );
        assert_eq!(
            canonical_url("https://chat.example.com/c/1?ref=z", None, &ext),
            "https://chat.example.com/c/1"
        );
    }
}
