use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref INT_CONSTANT:  Regex = Regex::new(r"^[+-]?[0-9]+").unwrap();
    pub static ref HEX_CONSTANT:  Regex = Regex::new(r"^0x([0-9A-Fa-f]+)").unwrap();
    pub static ref DUB_CONSTANT:  Regex = Regex::new(
        r"^(?:[+-]?[0-9]+\.[0-9]+(?:[eE][+-]?[0-9]+)?|[+-]?[0-9]+[eE][+-]?[0-9]+|[+-]?\.[0-9]+(?:[eE][+-]?[0-9]+)?)"
    ).unwrap();
    pub static ref IDENTIFIER:    Regex = Regex::new(r"^[a-zA-Z_][.a-zA-Z_0-9]*").unwrap();
    pub static ref WHITESPACE:    Regex = Regex::new(r"^\s+").unwrap();
    pub static ref BLOCK_COMMENT: Regex = Regex::new(r"^/\*((?s:.*?))\*/").unwrap();
    pub static ref LINE_COMMENT:  Regex = Regex::new(r"^(?:#|//)([^\n]*)").unwrap();
}

/// Matches an anchored rule at the start of `input`.
pub fn scan<'a>(rule: &Regex, input: &'a str) -> Option<&'a str> {
    rule.find(input).map(|m| m.as_str())
}

/// True when `c` may continue an identifier, so a keyword followed by it is
/// really the start of a longer name.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Matches `word` at the start of `input` unless it runs on into an
/// identifier.
pub fn scan_keyword(word: &str, input: &str) -> bool {
    input.starts_with(word)
        && !input[word.len()..].chars().next().map_or(false, is_identifier_char)
}

/// Reads a single- or double-quoted string literal. Returns the unescaped text
/// and the number of bytes consumed.
///
/// `\r`, `\n`, `\t`, `\"`, `\'` and `\\` are escapes; any other backslash is
/// kept as written.
pub fn scan_literal(input: &str) -> Option<(String, usize)> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c @ ('"' | '\''))) => c,
        _ => return None,
    };

    let mut text = String::new();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Some((text, i + c.len_utf8()));
        }
        if c == '\\' {
            let rest = &input[i + 1..];
            let escaped = match rest.chars().next() {
                Some('r')  => Some('\r'),
                Some('n')  => Some('\n'),
                Some('t')  => Some('\t'),
                Some('"')  => Some('"'),
                Some('\'') => Some('\''),
                Some('\\') => Some('\\'),
                _ => None,
            };
            if let Some(escaped) = escaped {
                text.push(escaped);
                chars.next();
                continue;
            }
        }
        text.push(c);
    }
    None
}

/// Parses the text of an integer token, decimal or `0x` hex.
pub fn parse_int(text: &str) -> Option<i64> {
    match HEX_CONSTANT.captures(text) {
        Some(caps) => i64::from_str_radix(&caps[1], 16).ok(),
        None => text.parse().ok(),
    }
}

/// 1-based line and column of the byte offset `pos`.
pub fn line_column(source: &str, pos: usize) -> (usize, usize) {
    let before = &source[..pos.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
