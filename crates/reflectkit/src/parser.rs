//! Parameter Parser
//!
//! Recovers parameter names and default-value presence from the textual
//! representation of a function. This information is not otherwise available
//! at runtime, so the reflection facade feeds declared source text through
//! this scanner to enumerate parameters.
//!
//! The scanner is a single left-to-right pass with no backtracking. It tracks
//! parenthesis depth, string literals (three quote styles, backslash-escape
//! aware) and comments, so commas, parentheses, and `=` inside default-value
//! expressions do not corrupt the result. Malformed input (unterminated
//! comment or string, unbalanced parentheses) degrades by treating the end of
//! input as the end of the scan; the parser never panics and never errors.
//!
//! Rest and destructured parameters are extracted best-effort: only their
//! identifier-looking pieces are captured.

use serde::{Deserialize, Serialize};

/// A parameter extracted from a function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParameter {
    /// Zero-based position within the parameter list.
    pub index: usize,
    /// The parameter's identifier.
    pub name: String,
    /// Whether the parameter declares a default value.
    pub has_default: bool,
}

/// Parses parameters from the first outermost parenthesized group in the
/// given function source.
///
/// Input with no parameter list at all yields an empty vector.
pub fn parse(input: &str) -> Vec<ExtractedParameter> {
    scan(input, None).unwrap_or_default()
}

/// Scans for a parameter list immediately preceded by the identifier `target`
/// and parses it.
///
/// Returns `None` when no such function is found. This is distinct from
/// `Some(vec![])`, which means the function was found with zero parameters.
/// The reflection facade uses this to locate `constructor` within a class
/// body when walking an inheritance chain.
pub fn find_named(input: &str, target: &str) -> Option<Vec<ExtractedParameter>> {
    scan(input, Some(target))
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Finds `needle` in `haystack` starting at byte offset `from`.
///
/// Operates on raw bytes rather than `&str` slices because the scan position
/// may sit inside a multi-byte character (e.g. within a string literal).
fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn push_param(params: &mut Vec<ExtractedParameter>, name: &mut String, has_default: &mut bool) {
    if !name.is_empty() {
        params.push(ExtractedParameter {
            index: params.len(),
            name: std::mem::take(name),
            has_default: *has_default,
        });
    }
    name.clear();
    *has_default = false;
}

fn scan(input: &str, target: Option<&str>) -> Option<Vec<ExtractedParameter>> {
    let bytes = input.as_bytes();
    let mut params = Vec::new();

    let mut depth = 0usize;
    let mut string_delim: Option<u8> = None;
    let mut escaped = false;

    // Identifier word preceding a parameter list, used to match `target`.
    let mut word = String::new();
    let mut prev_ident = false;

    // Whether the currently open outermost group is the one to extract from.
    let mut capturing = false;

    let mut name = String::new();
    let mut has_default = false;

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];

        // Close strings, honoring backslash escapes.
        if let Some(delim) = string_delim {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == delim {
                string_delim = None;
            }
            i += 1;
            continue;
        }

        match b {
            // Block comments; an unterminated comment ends the scan.
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                match find_bytes(bytes, i + 2, b"*/") {
                    Some(end) => {
                        i = end + 2;
                        continue;
                    }
                    None => break,
                }
            }

            // Line comments.
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                match find_bytes(bytes, i + 2, b"\n") {
                    Some(newline) => {
                        i = newline + 1;
                        continue;
                    }
                    None => break,
                }
            }

            b'"' | b'\'' | b'`' => {
                string_delim = Some(b);
            }

            b'(' => {
                depth += 1;
                if depth == 1 {
                    capturing = match target {
                        Some(t) => word == t,
                        None => true,
                    };
                    name.clear();
                    has_default = false;
                }
            }

            b')' => {
                if depth > 0 {
                    depth -= 1;
                }
                if depth == 0 {
                    if capturing {
                        push_param(&mut params, &mut name, &mut has_default);
                        return Some(params);
                    }
                    word.clear();
                    prev_ident = false;
                }
            }

            // Outside any parameter list: accumulate the preceding word.
            // Whitespace between the word and `(` keeps the word intact;
            // any other separator starts a fresh word.
            _ if depth == 0 => {
                if is_ident_part(b) {
                    if !prev_ident {
                        word.clear();
                    }
                    word.push(b as char);
                    prev_ident = true;
                } else if b.is_ascii_whitespace() {
                    prev_ident = false;
                } else {
                    word.clear();
                    prev_ident = false;
                }
            }

            // Inside the captured parameter list. Parameter boundaries are
            // only meaningful at depth 1; deeper levels belong to default
            // value expressions.
            _ if capturing && depth == 1 => match b {
                b'=' => {
                    has_default = true;
                }
                b',' => {
                    push_param(&mut params, &mut name, &mut has_default);
                }
                _ if !has_default => {
                    if name.is_empty() {
                        // Names must not start with a digit.
                        if is_ident_start(b) {
                            name.push(b as char);
                        }
                    } else if is_ident_part(b) {
                        name.push(b as char);
                    }
                }
                _ => {}
            },

            _ => {}
        }

        i += 1;
    }

    // End of input ends the scan. If we were mid-list (unbalanced input),
    // finalize what we have; otherwise report not-found for named lookups.
    if capturing {
        push_param(&mut params, &mut name, &mut has_default);
        return Some(params);
    }

    if target.is_some() {
        None
    } else {
        Some(params)
    }
}
