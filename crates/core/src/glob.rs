//! Glob matching with the semantics the server applies to `PSUBSCRIBE`
//! patterns.
//!
//! Supported syntax: `*` (any run of bytes), `?` (any single byte), `[abc]`,
//! `[^abc]`, `[a-z]` and backslash escapes. An unterminated `[` class extends
//! to the end of the pattern.

/// Bytes that make a destination name a pattern when unescaped.
pub const GLOB_CHARS: [u8; 3] = [b'?', b'*', b'['];

/// Return `true` if `pattern` matches the whole of `input`.
///
/// Only the most recent `*` is kept as a backtrack point, so matching is
/// linear in the number of stars.
pub fn matches(pattern: &[u8], input: &[u8]) -> bool {
    let mut pi = 0;
    let mut si = 0;
    let mut star: Option<(usize, usize)> = None;

    while si < input.len() {
        let current = input[si];
        match pattern.get(pi) {
            Some(b'*') => {
                star = Some((pi, si));
                pi += 1;
                continue;
            }
            Some(b'?') => {
                pi += 1;
                si += 1;
                continue;
            }
            Some(b'[') => {
                let (matched, consumed) = match_class(&pattern[pi + 1..], current);
                if matched {
                    pi += 1 + consumed;
                    si += 1;
                    continue;
                }
            }
            Some(b'\\') if pi + 1 < pattern.len() => {
                if pattern[pi + 1] == current {
                    pi += 2;
                    si += 1;
                    continue;
                }
            }
            Some(&literal) if literal == current => {
                pi += 1;
                si += 1;
                continue;
            }
            _ => {}
        }

        let Some((star_pi, star_si)) = star else {
            return false;
        };
        star = Some((star_pi, star_si + 1));
        pi = star_pi + 1;
        si = star_si + 1;
    }

    pattern[pi.min(pattern.len())..].iter().all(|&c| c == b'*')
}

/// Match `current` against the class body following `[`.
///
/// Returns whether it matched and how many pattern bytes the class consumed,
/// including the closing `]` when present.
fn match_class(class: &[u8], current: u8) -> (bool, usize) {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        match class.get(i) {
            None => break,
            Some(b']') => {
                i += 1;
                break;
            }
            Some(b'\\') if i + 1 < class.len() => {
                matched |= class[i + 1] == current;
                i += 2;
            }
            Some(&start) if class.get(i + 1) == Some(&b'-') && i + 2 < class.len() => {
                let end = class[i + 2];
                let (low, high) = if start <= end { (start, end) } else { (end, start) };
                matched |= (low..=high).contains(&current);
                i += 3;
            }
            Some(&literal) => {
                matched |= literal == current;
                i += 1;
            }
        }
    }

    (matched != negate, i)
}

/// Return `true` if `glob` occurs in `input` and never occurs escaped.
///
/// A single `\\` escaped occurrence stops that glob character from making the
/// name a pattern.
pub fn contains_unescaped(input: &str, glob: u8) -> bool {
    let bytes = input.as_bytes();
    bytes.contains(&glob) && !bytes.windows(2).any(|w| w == [b'\\', glob])
}

/// Return `true` if `input` contains any unescaped glob character.
///
/// Each glob character is checked on its own: an escaped `\\*` does not hide an
/// unescaped `?` elsewhere in the name.
pub fn contains_pattern_globs(input: &str) -> bool {
    GLOB_CHARS.iter().any(|&glob| contains_unescaped(input, glob))
}
