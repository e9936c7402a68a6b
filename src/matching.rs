//! Equality predicates deciding whether two records are "the same game".
//!
//! From strict to permissive: [exact_match] ignores only the 9 digit tie-breaker,
//! [prefix_only_match] also ignores the move text, [smart_match] requires matching prefixes and
//! matching main line moves.

use std::borrow::Cow;

use crate::moves::main_line;
use crate::record::{sort_prefix, HEADER_MARKER};

const TIE_BREAKER_WIDTH: usize = 9;
const TIE_BREAKER_MASK: &str = "#########";
/// Main lines this short are too common to identify a game
const MIN_MAIN_LINE_LEN: usize = 10;

/// Return a copy of the sort prefix `prefix` with its 9 digit tie-breaker replaced by `#########`.
///
/// The tie-breaker is the field before the last space of the prefix. When that field is not 9
/// digits bounded by spaces the prefix is returned as is, it is treated as having no tie-breaker.
pub fn mask_tie_breaker(prefix: &str) -> Cow<'_, str> {
    let trimmed = prefix.trim_end();
    let bytes = trimmed.as_bytes();
    let last_space = match trimmed.rfind(' ') {
        Some(position) if position > TIE_BREAKER_WIDTH + 1 => position,
        _ => return Cow::Borrowed(prefix),
    };
    let start = last_space - TIE_BREAKER_WIDTH;
    let is_tie_breaker = bytes[start - 1] == b' '
        && bytes[start..last_space].iter().all(|b| b.is_ascii_digit());
    if !is_tie_breaker {
        return Cow::Borrowed(prefix);
    }
    let mut masked = String::with_capacity(prefix.len());
    masked.push_str(&prefix[..start]);
    masked.push_str(TIE_BREAKER_MASK);
    masked.push_str(&prefix[last_space..]);
    Cow::Owned(masked)
}

/// Byte identical, or identical from `@H` on with sort prefixes that differ only in the tie-breaker.
pub fn exact_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (a.find(HEADER_MARKER), b.find(HEADER_MARKER)) {
        (Some(a_position), Some(b_position)) if a_position == b_position => {
            a[a_position..] == b[b_position..]
                && mask_tie_breaker(&a[..a_position]) == mask_tie_breaker(&b[..b_position])
        }
        _ => false,
    }
}

/// Sort prefixes that differ at most in the tie-breaker, move text is not looked at.
pub fn prefix_only_match(a: &str, b: &str) -> bool {
    mask_tie_breaker(sort_prefix(a)) == mask_tie_breaker(sort_prefix(b))
}

/// Identical, non trivial main lines.
pub fn moves_match(a: &str, b: &str) -> bool {
    let a_moves = main_line(a);
    a_moves.len() > MIN_MAIN_LINE_LEN && a_moves == main_line(b)
}

/// The same game: [prefix_only_match] and [moves_match] both hold.
pub fn smart_match(a: &str, b: &str) -> bool {
    prefix_only_match(a, b) && moves_match(a, b)
}
