//! Phrase, wordlist, and command-name matching
//!
//! Pure text utilities backing speech, act, and command triggers. All
//! comparisons are ASCII-case-insensitive.

/// How a typed command word must relate to a trigger's command names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMatch {
    /// Typed word must equal one of the names
    Exact,
    /// Typed word must be a proper, non-empty prefix of one of the names
    Abbrev,
}

/// Split the first phrase off an input string.
///
/// A leading double-quoted phrase is one token (quotes stripped); otherwise
/// the first whitespace-delimited word is taken. Returns the phrase and the
/// remainder with leading whitespace trimmed.
pub fn extract_first_phrase(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix('"') {
        match rest.find('"') {
            Some(end) => (&rest[..end], rest[end + 1..].trim_start()),
            None => (rest, ""),
        }
    } else {
        match input.find(char::is_whitespace) {
            Some(end) => (&input[..end], input[end..].trim_start()),
            None => (input, ""),
        }
    }
}

fn is_boundary(byte: Option<u8>) -> bool {
    match byte {
        None => true,
        Some(b) => b.is_ascii_whitespace() || b.is_ascii_punctuation(),
    }
}

/// True iff `needle` occurs in `haystack` bounded on both sides by string
/// start/end, whitespace, or punctuation.
///
/// Prevents "cat" from matching inside "category".
pub fn is_word_boundary_substring(needle: &str, haystack: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let needle = needle.to_ascii_lowercase();
    let haystack = haystack.to_ascii_lowercase();
    let hay = haystack.as_bytes();

    let mut start = 0;
    while let Some(found) = haystack[start..].find(&needle) {
        let at = start + found;
        let end = at + needle.len();
        let before = at.checked_sub(1).map(|i| hay[i]);
        let after = hay.get(end).copied();
        if is_boundary(before) && is_boundary(after) {
            return true;
        }
        start = at + 1;
    }
    false
}

/// True if any phrase of `wordlist` is a word-boundary substring of `text`.
///
/// Phrases may be double-quoted to contain spaces; a bare `*` matches
/// unconditionally.
pub fn matches_wordlist(text: &str, wordlist: &str) -> bool {
    let mut rest = wordlist;
    loop {
        let (phrase, remainder) = extract_first_phrase(rest);
        if phrase.is_empty() {
            return false;
        }
        if phrase == "*" || is_word_boundary_substring(phrase, text) {
            return true;
        }
        rest = remainder;
    }
}

/// Match a typed command word against a pattern of space-separated command
/// names, or `*` for match-all.
pub fn matches_command(typed: &str, pattern: &str, mode: CommandMatch) -> bool {
    for name in pattern.split_whitespace() {
        if name == "*" {
            return true;
        }
        let matched = match mode {
            CommandMatch::Exact => typed.eq_ignore_ascii_case(name),
            CommandMatch::Abbrev => {
                !typed.is_empty()
                    && typed.len() < name.len()
                    && name
                        .get(..typed.len())
                        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(typed))
            }
        };
        if matched {
            return true;
        }
    }
    false
}
