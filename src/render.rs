//! Render a reconstructed thread as markdown or plain text.

use crate::api::Post;

/// Clean markdown rendition of a thread. Posts are numbered `**i/**` only when
/// there is more than one, so a single post reads as prose, not a thread.
pub fn to_markdown(posts: &[Post], author_username: Option<&str>) -> String {
    if posts.is_empty() {
        return String::new();
    }

    let mut parts: Vec<String> = Vec::with_capacity(posts.len() + 1);
    if let Some(author) = author_username {
        parts.push(format!("# Thread by @{author}\n"));
    }

    for (i, post) in posts.iter().enumerate() {
        let text = post.text.trim();
        if posts.len() > 1 {
            parts.push(format!("**{}/**\n{text}", i + 1));
        } else {
            parts.push(text.to_string());
        }
    }

    parts.join("\n\n")
}

/// Plain-text rendition with `Tweet i:` blocks.
pub fn to_plain_text(posts: &[Post]) -> String {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| format!("Tweet {}:\n{}", i + 1, post.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Canonical URL for a post.
pub fn post_url(author_username: Option<&str>, post_id: &str) -> String {
    format!(
        "https://x.com/{}/status/{post_id}",
        author_username.unwrap_or("unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, text: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: None,
            author_username: None,
            conversation_id: None,
            text: text.to_string(),
            created_at: None,
            in_reply_to: None,
        }
    }

    #[test]
    fn test_markdown_multi_post_numbering() {
        let posts = [post("1", "first"), post("2", "second")];
        let md = to_markdown(&posts, Some("someone"));
        assert_eq!(
            md,
            "# Thread by @someone\n\n\n**1/**\nfirst\n\n**2/**\nsecond"
        );
    }

    #[test]
    fn test_markdown_single_post_has_no_numbering() {
        let posts = [post("1", "just one")];
        let md = to_markdown(&posts, Some("someone"));
        assert!(!md.contains("**1/**"));
        assert!(md.contains("just one"));
    }

    #[test]
    fn test_markdown_without_author_has_no_header() {
        let posts = [post("1", "text")];
        assert_eq!(to_markdown(&posts, None), "text");
    }

    #[test]
    fn test_markdown_empty_thread() {
        assert_eq!(to_markdown(&[], Some("someone")), "");
    }

    #[test]
    fn test_plain_text_blocks() {
        let posts = [post("1", "first"), post("2", "second")];
        assert_eq!(to_plain_text(&posts), "Tweet 1:\nfirst\n\nTweet 2:\nsecond");
    }

    #[test]
    fn test_post_url() {
        assert_eq!(
            post_url(Some("someone"), "123"),
            "https://x.com/someone/status/123"
        );
        assert_eq!(post_url(None, "123"), "https://x.com/unknown/status/123");
    }
}
