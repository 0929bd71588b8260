//! Response header rewriting for framed documents.

use crate::cdp::HeaderEntry;

/// Headers with framing restrictions removed, or `None` when nothing changes.
///
/// `X-Frame-Options` is dropped and the `frame-ancestors` directive is cut out
/// of every `Content-Security-Policy`; a policy left empty is dropped too.
pub fn strip_frame_headers(headers: &[HeaderEntry]) -> Option<Vec<HeaderEntry>> {
    let mut changed = false;
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        if header.name.eq_ignore_ascii_case("x-frame-options") {
            changed = true;
            continue;
        }
        if header.name.eq_ignore_ascii_case("content-security-policy") {
            if let Some(policy) = without_frame_ancestors(&header.value) {
                changed = true;
                if !policy.is_empty() {
                    out.push(HeaderEntry::new(header.name.clone(), policy));
                }
                continue;
            }
        }
        out.push(header.clone());
    }
    changed.then_some(out)
}

/// The policy rebuilt without `frame-ancestors`, or `None` when it has none.
fn without_frame_ancestors(policy: &str) -> Option<String> {
    let directives: Vec<&str> = policy
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    let kept: Vec<&str> = directives
        .iter()
        .copied()
        .filter(|d| {
            let name = d.split_whitespace().next().unwrap_or("");
            !name.eq_ignore_ascii_case("frame-ancestors")
        })
        .collect();
    (kept.len() != directives.len()).then(|| kept.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str, value: &str) -> HeaderEntry {
        HeaderEntry::new(name, value)
    }

    #[test]
    fn test_x_frame_options_removed() {
        let out = strip_frame_headers(&[h("X-Frame-Options", "DENY"), h("content-type", "text/html")]).unwrap();
        assert_eq!(out, vec![h("content-type", "text/html")]);

        let lower = strip_frame_headers(&[h("x-frame-options", "SAMEORIGIN")]).unwrap();
        assert!(lower.is_empty());
    }

    #[test]
    fn test_frame_ancestors_directive_stripped() {
        let out = strip_frame_headers(&[h(
            "Content-Security-Policy",
            "default-src 'self'; frame-ancestors 'self' https://chatgpt.com; img-src *",
        )])
        .unwrap();
        assert_eq!(out, vec![h("Content-Security-Policy", "default-src 'self'; img-src *")]);
    }

    #[test]
    fn test_policy_of_only_frame_ancestors_is_dropped() {
        let out = strip_frame_headers(&[h("content-security-policy", "frame-ancestors 'none'")]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_unrelated_headers_are_untouched() {
        let headers = [
            h("Content-Security-Policy", "default-src 'self';  script-src 'unsafe-inline'"),
            h("Cache-Control", "no-store"),
        ];
        assert_eq!(strip_frame_headers(&headers), None);
        assert_eq!(strip_frame_headers(&[]), None);
    }
}
