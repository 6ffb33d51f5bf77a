//! Body cleanup: blank lines, URLs, and unreadable lines are removed.

use std::sync::LazyLock;

use regex::Regex;

use super::readable::is_readable;

/// `http://` or `https://` followed by URL-safe characters or `%XX` escapes.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9$-_@.&+!*(),]|%[0-9a-fA-F]{2})+")
        .expect("URL pattern is valid")
});

/// Reduce a decoded body to its readable lines.
///
/// Steps, in order: trim the body, drop whitespace-only lines, strip URLs
/// (anywhere, so text around a URL on the same line survives), keep only
/// lines accepted by [`is_readable`], join with `\n`. May return `""`.
pub fn clean(body: &str) -> String {
    let non_blank = body
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let without_urls = URL_PATTERN.replace_all(&non_blank, "");

    without_urls
        .lines()
        .filter(|line| is_readable(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_removed_mid_sentence() {
        let cleaned = clean("Have a look at https://example.com/a?b=1 and tell me what you think");
        assert_eq!(cleaned, "Have a look at  and tell me what you think");
    }

    #[test]
    fn test_whitespace_lines_dropped() {
        let cleaned = clean("I sent the file.\n   \n\t\nIt is on the shared drive.");
        assert_eq!(cleaned, "I sent the file.\nIt is on the shared drive.");
    }

    #[test]
    fn test_url_only_line_disappears() {
        let cleaned = clean("Thanks for the update.\nhttp://tracker.example.net/px.gif\nSee you at lunch.");
        assert_eq!(cleaned, "Thanks for the update.\nSee you at lunch.");
    }

    #[test]
    fn test_noise_lines_filtered() {
        let body = "Hi Sam,\nThe invoice is attached to this email.\nQWxhZGRpbjpvcGVuIHNlc2FtZQ==\n----------\n";
        assert_eq!(clean(body), "The invoice is attached to this email.");
    }

    #[test]
    fn test_empty_output_is_legal() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n\n  "), "");
        assert_eq!(clean("https://only.example.com"), "");
    }

    #[test]
    fn test_crlf_bodies() {
        let cleaned = clean("I will be at the office.\r\n\r\nCall me if you need anything.\r\n");
        assert_eq!(cleaned, "I will be at the office.\nCall me if you need anything.");
    }
}
