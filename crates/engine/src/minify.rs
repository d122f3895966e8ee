//! Default text minifier.
//!
//! Conservative and deterministic: comments go, whitespace collapses, string
//! literals are copied verbatim. Anything smarter plugs in through
//! [`Minifier`].

use crate::error::{EngineError, Result};
use clientlib_model::ClientlibType;

/// Pluggable minification backend
pub trait Minifier: Send + Sync {
    /// Minify `source` of `kind`; `path` is only used in error reports.
    fn minify(&self, kind: ClientlibType, path: &str, source: &str) -> Result<String>;
}

/// Comment-stripping, whitespace-collapsing minifier
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceMinifier;

impl Minifier for WhitespaceMinifier {
    fn minify(&self, kind: ClientlibType, path: &str, source: &str) -> Result<String> {
        let out = match kind {
            ClientlibType::Js => {
                let stripped = strip_comments(source, true).map_err(|message| {
                    EngineError::Minify {
                        path: path.to_string(),
                        message,
                    }
                })?;
                squeeze_lines(&stripped)
            }
            ClientlibType::Css => {
                let stripped = strip_comments(source, false).map_err(|message| {
                    EngineError::Minify {
                        path: path.to_string(),
                        message,
                    }
                })?;
                collapse_css(&stripped)
            }
            ClientlibType::Link | ClientlibType::Img => source.to_string(),
        };
        Ok(out)
    }
}

enum State {
    Normal,
    AfterSlash,
    InString(char),
    InStringEscape(char),
    InBlockComment,
    InBlockCommentEnd,
    InLineComment,
}

/// Remove `/* */` comments and, when `line_comments` is set, `//` comments.
/// Quotes (and template literals) are copied unchanged.
fn strip_comments(input: &str, line_comments: bool) -> std::result::Result<String, String> {
    let mut output = String::with_capacity(input.len());
    let mut state = State::Normal;

    for ch in input.chars() {
        state = match state {
            State::Normal => normal(&mut output, ch),
            State::AfterSlash => match ch {
                '*' => {
                    output.pop();
                    State::InBlockComment
                }
                '/' if line_comments => {
                    output.pop();
                    State::InLineComment
                }
                _ => normal(&mut output, ch),
            },
            State::InString(quote) => {
                output.push(ch);
                if ch == '\\' {
                    State::InStringEscape(quote)
                } else if ch == quote {
                    State::Normal
                } else {
                    State::InString(quote)
                }
            }
            State::InStringEscape(quote) => {
                output.push(ch);
                State::InString(quote)
            }
            State::InBlockComment => match ch {
                '*' => State::InBlockCommentEnd,
                _ => State::InBlockComment,
            },
            State::InBlockCommentEnd => match ch {
                '/' => {
                    // keep tokens on both sides apart
                    output.push(' ');
                    State::Normal
                }
                '*' => State::InBlockCommentEnd,
                _ => State::InBlockComment,
            },
            State::InLineComment => {
                if ch == '\n' || ch == '\r' {
                    output.push(ch);
                    State::Normal
                } else {
                    State::InLineComment
                }
            }
        };
    }

    match state {
        State::InString(_) | State::InStringEscape(_) => Err("unterminated string literal".into()),
        State::InBlockComment | State::InBlockCommentEnd => {
            Err("unterminated block comment".into())
        }
        _ => Ok(output),
    }
}

fn normal(output: &mut String, ch: char) -> State {
    output.push(ch);
    match ch {
        '"' | '\'' | '`' => State::InString(ch),
        '/' => State::AfterSlash,
        _ => State::Normal,
    }
}

/// Trim every line and drop blank ones. Line breaks stay so automatic
/// semicolon insertion keeps working. Whitespace inside a string that spans
/// lines (template literals, `\` continuations) is kept.
fn squeeze_lines(input: &str) -> String {
    let mut lines = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for line in input.lines() {
        let starts_inside = quote.is_some();
        for ch in line.chars() {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == q {
                        quote = None;
                    }
                }
                None if matches!(ch, '"' | '\'' | '`') => quote = Some(ch),
                None => {}
            }
        }
        // a trailing backslash escapes the line break itself
        escaped = false;

        let line = match (starts_inside, quote.is_some()) {
            (true, true) => line,
            (true, false) => line.trim_end(),
            (false, true) => line.trim_start(),
            (false, false) => line.trim(),
        };
        if line.is_empty() && !starts_inside {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Collapse whitespace runs to one space and drop it next to CSS punctuation.
/// A space before `:` is kept: in a selector it separates a descendant
/// pseudo-class (`.nav :first-child`).
fn collapse_css(input: &str) -> String {
    const TIGHT_BEFORE: &[char] = &['{', '}', ';', ',', '>'];
    const TIGHT_AFTER: &[char] = &['{', '}', ';', ':', ',', '>'];

    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for ch in input.chars() {
        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space && !TIGHT_BEFORE.contains(&ch) && !out.ends_with(TIGHT_AFTER) {
            out.push(' ');
        }
        pending_space = false;
        if ch == '}' && out.ends_with(';') {
            out.pop();
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        }
        out.push(ch);
    }
    out
}
