//! Splits one source line into a keyword and its parameter tokens

use regex::Regex;

use crate::assembler::Error;
use crate::assembler::tree::Parameter;

pub const CHAR_COMMENT: char = ';';
pub const CHAR_PARAM_SEPARATOR: char = ',';
pub const CHAR_DIRECTIVE_PREFIX: char = '.';
pub const CHAR_STRING: char = '"';
pub const CHAR_ESCAPE: char = '\\';
pub const CHAR_LABEL_POSTFIX: char = ':';
pub const CHAR_DECIMAL_POSTFIX: char = 't';
pub const CHAR_BINARY_POSTFIX: char = 'b';

/// A span of text in a source line. Used to neatly underline errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    start: usize,
    end: usize,
}

impl TokenSpan {
    /// Create a new token span
    pub fn new(start: usize, end: usize) -> TokenSpan {
        TokenSpan { start, end }
    }

    /// Get the start index of the token span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end index of the token span
    pub fn end(&self) -> usize {
        self.end
    }
}

/// The tokens of one meaningful source line
#[derive(Debug, Clone)]
pub struct LineTokens {
    pub keyword: String,
    pub keyword_span: TokenSpan,
    pub parameters: Vec<Parameter>,
}

/// Split a source line into its keyword and parameter tokens
///
/// Returns `None` for blank and comment-only lines. A `;` outside of a
/// quoted string ends the line early, a trailing `,` on a parameter is
/// stripped, and quoted strings are accumulated across whitespace into a
/// single parameter with their escape sequences converted.
pub fn tokenize_line(
    line: &str,
    line_number: usize,
    file: &str,
) -> Result<Option<LineTokens>, Error> {
    let scanner = Regex::new(r"\S+").unwrap();

    let mut keyword: Option<(String, TokenSpan)> = None;
    let mut parameters = Vec::new();
    // (accumulated raw body, span start) of an open quoted string
    let mut open_string: Option<(String, usize)> = None;

    for token in scanner.find_iter(line) {
        let text = token.as_str();

        if keyword.is_none() {
            if text.starts_with(CHAR_COMMENT) {
                return Ok(None);
            }
            keyword = Some((text.to_string(), TokenSpan::new(token.start(), token.end())));
            continue;
        }

        if let Some((mut body, start)) = open_string.take() {
            if closes_string(text) {
                body.push(' ');
                body.push_str(&text[..text.len() - 1]);
                parameters.push(Parameter {
                    text: convert_escapes(&body),
                    span: TokenSpan::new(start, token.end()),
                });
            } else {
                body.push(' ');
                body.push_str(text);
                open_string = Some((body, start));
            }
            continue;
        }

        if text.starts_with(CHAR_COMMENT) {
            break;
        }

        if let Some(rest) = text.strip_prefix(CHAR_STRING) {
            if !rest.is_empty() && closes_string(rest) {
                parameters.push(Parameter {
                    text: convert_escapes(&rest[..rest.len() - 1]),
                    span: TokenSpan::new(token.start(), token.end()),
                });
            } else {
                open_string = Some((rest.to_string(), token.start()));
            }
            continue;
        }

        let stripped = text.strip_suffix(CHAR_PARAM_SEPARATOR).unwrap_or(text);
        parameters.push(Parameter {
            text: stripped.to_string(),
            span: TokenSpan::new(token.start(), token.end()),
        });
    }

    if open_string.is_some() {
        return Err(Error::StringNotClosed {
            file: file.to_string(),
            line_number,
            line: line.to_string(),
        });
    }

    Ok(keyword.map(|(keyword, keyword_span)| LineTokens {
        keyword,
        keyword_span,
        parameters,
    }))
}

/// Whether a string fragment ends its quoted string: its final character is
/// a `"` that is not preceded by the escape character
fn closes_string(fragment: &str) -> bool {
    let bytes = fragment.as_bytes();
    match bytes.len() {
        0 => false,
        1 => bytes[0] == CHAR_STRING as u8,
        n => bytes[n - 1] == CHAR_STRING as u8 && bytes[n - 2] != CHAR_ESCAPE as u8,
    }
}

/// Convert the escape sequences in a string body to their characters
///
/// Unrecognized escapes are kept verbatim.
fn convert_escapes(text: &str) -> String {
    let mut converted = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != CHAR_ESCAPE {
            converted.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => converted.push('\n'),
            Some('t') => converted.push('\t'),
            Some('r') => converted.push('\r'),
            Some('0') => converted.push('\0'),
            Some('\\') => converted.push('\\'),
            Some('"') => converted.push('"'),
            Some(other) => {
                converted.push(CHAR_ESCAPE);
                converted.push(other);
            }
            None => converted.push(CHAR_ESCAPE),
        }
    }
    converted
}
