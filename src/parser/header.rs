//! RFC 5322 header handling: folding, encoded-words (RFC 2047), and timestamps.

use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, warn};

use crate::model::message::Headers;

/// Placeholder written when no timestamp strategy understands the Date header.
pub const UNKNOWN_TIMESTAMP: &str = "Unknown";

/// Output format of record timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Split the header block off a raw message and parse it.
pub fn parse_header_block(raw: &[u8]) -> Headers {
    let end = find_header_end(raw).unwrap_or(raw.len());
    let text = decode_header_bytes(&raw[..end]);
    Headers::new(unfold_headers(&text))
}

/// Byte offset of the blank line that ends the header block.
pub fn find_header_end(data: &[u8]) -> Option<usize> {
    (0..data.len()).find(|&i| {
        data[i..].starts_with(b"\n\n") || data[i..].starts_with(b"\r\n\r\n")
    })
}

/// Decode raw header bytes to a string, one line at a time.
///
/// Each line is tried as UTF-8 and falls back to Windows-1252 (which accepts
/// every byte) on its own, so one stray byte cannot garble its neighbours.
fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    let mut text = String::with_capacity(bytes.len());
    for (i, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            text.push('\n');
        }
        match std::str::from_utf8(line) {
            Ok(s) => text.push_str(s),
            Err(_) => {
                let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(line);
                text.push_str(&decoded);
            }
        }
    }
    text
}

/// Join continuation lines onto the header they continue.
///
/// Returns `(name, raw_value)` pairs in wire order.
fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
        } else if let Some((name, value)) = line.split_once(':') {
            result.push((name.trim().to_string(), value.trim().to_string()));
        }
        // mbox "From " separators and other colon-less lines are ignored
    }

    result
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Malformed words are kept verbatim; bytes the charset cannot map become
/// U+FFFD. Never fails.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two adjacent encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let word = &remaining[start + 2..];
        match decode_one_word(word) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &word[consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = word;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decode `charset?encoding?text?=`; returns the text and bytes consumed.
fn decode_one_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];
    if charset.contains(char::is_whitespace) || encoding.len() != 1 {
        return None;
    }
    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded)?,
        "Q" | "q" => decode_q(encoded),
        _ => return None,
    };

    // RFC 2231 language suffix: "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((decode_charset(charset, &bytes), consumed))
}

/// Standard-alphabet base64; whitespace is skipped, padding optional.
fn decode_base64(input: &str) -> Option<Vec<u8>> {
    fn value(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some(u32::from(c - b'A')),
            b'a'..=b'z' => Some(u32::from(c - b'a') + 26),
            b'0'..=b'9' => Some(u32::from(c - b'0') + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let mut out = Vec::with_capacity(input.len() * 3 / 4);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for c in input.bytes() {
        if c == b'=' {
            break;
        }
        if c.is_ascii_whitespace() {
            continue;
        }
        acc = (acc << 6) | value(c)?;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    Some(out)
}

/// Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        result.push(byte);
                        i += 3;
                    }
                    None => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Decode bytes using a named charset, lossily.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    match encoding_rs::Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            warn!(charset, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

// ── Timestamps ──────────────────────────────────────────────────

type TimestampStrategy = fn(&str) -> Option<NaiveDateTime>;

/// Tried in order; the first that parses wins. All keep the sender's wall-clock time.
const TIMESTAMP_STRATEGIES: &[(&str, TimestampStrategy)] = &[
    ("rfc2822", parse_rfc2822),
    ("legacy", parse_legacy),
    ("mail-parser", parse_with_mail_parser),
];

/// Format a `Date:` header value as `YYYY-MM-DD HH:MM:SS`, or `"Unknown"`.
pub fn format_timestamp(date: Option<&str>) -> String {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return UNKNOWN_TIMESTAMP.to_string();
    };

    for (name, strategy) in TIMESTAMP_STRATEGIES {
        if let Some(parsed) = strategy(date) {
            debug!(strategy = name, date, "Parsed timestamp");
            return parsed.format(TIMESTAMP_FORMAT).to_string();
        }
    }

    warn!(date, "Could not parse date");
    UNKNOWN_TIMESTAMP.to_string()
}

fn parse_rfc2822(input: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc2822(input)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Real-world variants: no day-of-week, IMAP `DD-MMM-YYYY`, named zones,
/// trailing `(EST)` comments, ISO 8601.
fn parse_legacy(input: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    let base = strip_comment(input);
    let base = strip_day_of_week(base);
    let normalized = normalize_imap_date(base);
    let zoned = replace_named_tz(&normalized);

    for candidate in [base, normalized.as_str(), zoned.as_str()] {
        for fmt in FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.naive_local());
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(ndt);
            }
        }
    }
    None
}

/// Wrap the value in a minimal message and let `mail-parser` have a go.
fn parse_with_mail_parser(input: &str) -> Option<NaiveDateTime> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = mail_parser::MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Drop a trailing `(comment)`, e.g. `"... -0500 (EST)"`.
fn strip_comment(s: &str) -> &str {
    match s.rfind('(') {
        Some(pos) if s.trim_end().ends_with(')') => s[..pos].trim_end(),
        _ => s,
    }
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> &str {
    const DAYS: &[&str] = &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with(',') || rest.starts_with(' ') {
                return rest.trim_start_matches(',').trim_start();
            }
        }
    }
    s
}

/// `"16-JUL-2025 03:01:03"` → `"16 Jul 2025 03:01:03"`.
fn normalize_imap_date(s: &str) -> String {
    const MONTHS: &[&str] = &[
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    if !s.contains('-') {
        return s.to_string();
    }
    for month in MONTHS {
        for variant in [month.to_uppercase(), month.to_lowercase(), (*month).to_string()] {
            let pattern = format!("-{variant}-");
            if s.contains(&pattern) {
                return s.replacen(&pattern, &format!(" {month} "), 1);
            }
        }
    }
    s.to_string()
}

/// Replace a trailing timezone abbreviation with its numeric offset.
fn replace_named_tz(s: &str) -> String {
    const ZONES: &[(&str, &str)] = &[
        ("CEST", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("UT", "+0000"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    for (name, offset) in ZONES {
        if let Some(head) = s.strip_suffix(name) {
            if head.ends_with(' ') {
                return format!("{head}{offset}");
            }
        }
    }
    s.to_string()
}
