//! Heuristic test for "is this line prose a person wrote?".
//!
//! Rejects tracking junk, encoded blobs and repeated boilerplate. False
//! positives and negatives are expected; the function is pure.

/// Function words that almost every English sentence contains at least one of.
const COMMON_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at",
];

const MIN_VOWEL_RATIO: f64 = 0.2;
const MIN_DIVERSITY: f64 = 0.5;
const MAX_AVG_TOKEN_LEN: f64 = 15.0;

/// Decide whether `line` is readable prose.
///
/// All of the following must hold:
/// - it contains at least one alphanumeric token
/// - one token is a common function word
/// - vowels / consonants ≥ 0.2 (no consonants at all fails)
/// - distinct tokens / tokens ≥ 0.5
/// - average token length ≤ 15 characters
pub fn is_readable(line: &str) -> bool {
    let lower = line.to_lowercase();
    let tokens = tokenize(&lower);
    if tokens.is_empty() {
        return false;
    }

    if !tokens.iter().any(|t| COMMON_WORDS.contains(t)) {
        return false;
    }

    if vowel_ratio(&lower).is_none_or(|ratio| ratio < MIN_VOWEL_RATIO) {
        return false;
    }

    let total = tokens.len() as f64;
    let mut distinct = tokens.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if (distinct.len() as f64) / total < MIN_DIVERSITY {
        return false;
    }

    let chars: usize = tokens.iter().map(|t| t.chars().count()).sum();
    (chars as f64) / total <= MAX_AVG_TOKEN_LEN
}

/// Split into maximal runs of alphanumeric characters.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Vowels over consonants among alphabetic characters; `None` without consonants.
fn vowel_ratio(text: &str) -> Option<f64> {
    let (vowels, consonants) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(v, c), ch| {
            if matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u') {
                (v + 1, c)
            } else {
                (v, c + 1)
            }
        });
    (consonants > 0).then(|| vowels as f64 / consonants as f64)
}
