//! HTML to plain-text conversion for message bodies.

/// Elements whose whole content is dropped.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "title"];

/// Elements that start or end a line.
const BLOCK_ELEMENTS: &[&str] = &[
    "br", "p", "div", "tr", "li", "ul", "ol", "table", "blockquote", "pre", "hr", "h1", "h2",
    "h3", "h4", "h5", "h6",
];

/// Table cells, kept apart by a space.
const CELL_ELEMENTS: &[&str] = &["td", "th"];

/// Convert HTML to a plain-text approximation.
///
/// - `<br>`, `<p>`, `<div>` and other block elements become line breaks
/// - table cells are separated by a space
/// - `<a href="…">label</a>` keeps only `label`; URLs are never rendered
/// - `<script>`, `<style>` and `<head>` blocks are removed
/// - a `<` that cannot open a tag (`<5%`, `a < b`) is kept as text
/// - named and numeric entities are decoded
/// - Runs of blank lines collapse to one
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if !opens_tag(after) {
            out.push('<');
            rest = after;
            continue;
        }
        let Some(close) = after.find('>') else {
            // Unterminated tag: drop the remainder
            rest = "";
            break;
        };
        let tag = &after[..close];
        rest = &after[close + 1..];

        if tag.starts_with("!--") {
            rest = skip_comment(tag, rest);
            continue;
        }

        let name = tag_name(tag);
        if SKIPPED_ELEMENTS.contains(&name.as_str()) && !tag.starts_with('/') && !tag.ends_with('/')
        {
            rest = skip_element(rest, &name);
            continue;
        }
        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            out.push('\n');
        } else if CELL_ELEMENTS.contains(&name.as_str())
            && !out.is_empty()
            && !out.ends_with(char::is_whitespace)
        {
            out.push(' ');
        }
    }
    out.push_str(rest);

    collapse_blank_lines(&decode_entities(&out))
}

/// `true` when the text after a `<` starts a tag, closing tag, comment or doctype.
fn opens_tag(after: &str) -> bool {
    after
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Lowercase element name of a tag body such as `/DIV`, `br/` or `a href="x"`.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Skip past `</name>`, matched ASCII case-insensitively.
fn skip_element<'a>(rest: &'a str, name: &str) -> &'a str {
    let closing = format!("</{name}");
    // ASCII lowercasing keeps byte offsets aligned with `rest`.
    let lower = rest.to_ascii_lowercase();
    match lower.find(&closing) {
        Some(pos) => match rest[pos..].find('>') {
            Some(end) => &rest[pos + end + 1..],
            None => "",
        },
        None => "",
    }
}

/// Skip the remainder of an HTML comment whose opening tag body is `tag`.
fn skip_comment<'a>(tag: &str, rest: &'a str) -> &'a str {
    if tag.ends_with("--") {
        return rest;
    }
    match rest.find("-->") {
        Some(end) => &rest[end + 3..],
        None => "",
    }
}

/// Named entities seen in mail bodies. Anything else is left as written.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("rsquo", "\u{2019}"),
    ("lsquo", "\u{2018}"),
    ("rdquo", "\u{201D}"),
    ("ldquo", "\u{201C}"),
    ("sbquo", "\u{201A}"),
    ("bdquo", "\u{201E}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{00B7}"),
    ("laquo", "\u{00AB}"),
    ("raquo", "\u{00BB}"),
    ("copy", "\u{00A9}"),
    ("reg", "\u{00AE}"),
    ("trade", "\u{2122}"),
    ("euro", "\u{20AC}"),
    ("pound", "\u{00A3}"),
    ("yen", "\u{00A5}"),
    ("cent", "\u{00A2}"),
    ("deg", "\u{00B0}"),
    ("times", "\u{00D7}"),
    ("shy", ""),
    ("zwnj", ""),
    ("zwj", ""),
];

/// Longest entity body (between `&` and `;`) worth looking at.
const MAX_ENTITY_LEN: usize = 10;

/// Decode entities in a single pass, so `&amp;lt;` yields `&lt;`.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&after[..end]).map(|s| (s, end)));
        match decoded {
            Some((replacement, end)) => {
                out.push_str(&replacement);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one entity body such as `amp`, `#8212` or `#x2014`.
fn decode_entity(body: &str) -> Option<String> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return match code {
            0xA0 => Some(" ".to_string()),
            _ => char::from_u32(code).filter(|c| *c != '\0').map(String::from),
        };
    }
    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, value)| (*value).to_string())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut prev_was_blank = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_was_blank {
                cleaned.push('\n');
                prev_was_blank = true;
            }
        } else {
            cleaned.push_str(trimmed);
            cleaned.push('\n');
            prev_was_blank = false;
        }
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        let text = html_to_text("<p>Hello <b>world</b></p><p>Second paragraph</p>");
        assert_eq!(text, "Hello world\n\nSecond paragraph");
    }

    #[test]
    fn test_links_keep_label_only() {
        let text = html_to_text(r#"Read <a href="https://example.com/x">the notes</a> today"#);
        assert_eq!(text, "Read the notes today");
        assert!(!text.contains("example.com"));
    }

    #[test]
    fn test_entities() {
        assert_eq!(html_to_text("Tom &amp; Jerry &lt;3&gt;"), "Tom & Jerry <3>");
        assert_eq!(html_to_text("a&amp;lt;b"), "a&lt;b");
    }

    #[test]
    fn test_scripts_styles_and_head_removed() {
        let html = "<html><HEAD><title>T</title><style>p{}</style></HEAD>\
                    <body>Before<script>alert('x')</script>After</body></html>";
        assert_eq!(html_to_text(html), "BeforeAfter");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(html_to_text("a<!-- hidden <b>x</b> -->b"), "ab");
    }

    #[test]
    fn test_br_variants() {
        assert_eq!(html_to_text("one<br>two<BR/>three<br />four"), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_less_than_in_prose_is_kept() {
        let text = html_to_text(
            "<p>Costs were <5% of the budget for the year.</p><p>See you at the party.</p>",
        );
        assert_eq!(
            text,
            "Costs were <5% of the budget for the year.\n\nSee you at the party."
        );
        assert_eq!(html_to_text("if a < b then"), "if a < b then");
        assert_eq!(html_to_text("trailing <"), "trailing <");
    }

    #[test]
    fn test_table_cells_are_separated() {
        assert_eq!(
            html_to_text("<table><tr><td>Hello</td><td>world</td></tr></table>"),
            "Hello world"
        );
        assert_eq!(html_to_text("<th>Name</th><th>Total</th>"), "Name Total");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(html_to_text("done &#8212; ok"), "done \u{2014} ok");
        assert_eq!(html_to_text("done &#x2014; ok"), "done \u{2014} ok");
        assert_eq!(html_to_text("a&#160;b"), "a b");
        assert_eq!(html_to_text("bad &#xZZ; kept"), "bad &#xZZ; kept");
    }

    #[test]
    fn test_named_typographic_entities() {
        assert_eq!(
            html_to_text("<td>Hello</td><td>world</td>It&rsquo;s done &mdash; ok"),
            "Hello world It\u{2019}s done \u{2014} ok"
        );
        assert_eq!(html_to_text("Fish &amp chips &unknown;"), "Fish &amp chips &unknown;");
    }

    #[test]
    fn test_non_ascii_text_survives() {
        assert_eq!(html_to_text("<div>Café İstanbul</div>"), "Café İstanbul");
    }
}
