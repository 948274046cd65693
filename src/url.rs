//! Extract a post id from the URL forms users paste.
//!
//! Accepted: `twitter.com/<user>/status/<id>`, `x.com/<user>/status/<id>`,
//! the `/i/web/status/<id>` form of either domain, and a bare numeric id.

/// Post id from a URL or bare id, or `None` when the input matches nothing.
pub fn extract_post_id(input: &str) -> Option<String> {
    let input = input.trim();

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return Some(input.to_string());
    }

    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let path = rest
        .strip_prefix("twitter.com/")
        .or_else(|| rest.strip_prefix("x.com/"))?;

    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["i", "web", "status", id, ..] => clean_id(id),
        [_user, "status", id, ..] => clean_id(id),
        _ => None,
    }
}

/// Strip query/fragment noise and require a purely numeric id.
fn clean_id(raw: &str) -> Option<String> {
    let id = raw.split(['?', '#']).next().unwrap_or("");
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twitter_status_url() {
        assert_eq!(
            extract_post_id("https://twitter.com/someone/status/123456789"),
            Some("123456789".to_string())
        );
    }

    #[test]
    fn test_x_status_url() {
        assert_eq!(
            extract_post_id("https://x.com/someone/status/987"),
            Some("987".to_string())
        );
    }

    #[test]
    fn test_i_web_status_url() {
        assert_eq!(
            extract_post_id("https://twitter.com/i/web/status/555"),
            Some("555".to_string())
        );
        assert_eq!(
            extract_post_id("https://x.com/i/web/status/556"),
            Some("556".to_string())
        );
    }

    #[test]
    fn test_url_with_query_params() {
        assert_eq!(
            extract_post_id("https://x.com/someone/status/123?s=20&t=abc"),
            Some("123".to_string())
        );
    }

    #[test]
    fn test_www_and_http() {
        assert_eq!(
            extract_post_id("http://www.twitter.com/someone/status/42"),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_bare_id() {
        assert_eq!(extract_post_id("123456"), Some("123456".to_string()));
    }

    #[test]
    fn test_rejects_other_domains() {
        assert_eq!(extract_post_id("https://example.com/a/status/123"), None);
    }

    #[test]
    fn test_rejects_non_status_paths() {
        assert_eq!(extract_post_id("https://x.com/someone"), None);
        assert_eq!(extract_post_id("https://x.com/someone/likes"), None);
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        assert_eq!(extract_post_id("https://x.com/someone/status/abc"), None);
        assert_eq!(extract_post_id("not-a-url"), None);
        assert_eq!(extract_post_id(""), None);
    }
}
