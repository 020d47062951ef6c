//! Path expression tokenizer.
//!
//! Converts a path string into a flat sequence of [`Token`]s for the
//! recursive-descent parser in [`super::parser`]. The token set covers the
//! XPath subset this crate accepts: separators, brackets, parentheses,
//! unions, attribute and function markers, quoted strings, signed integers,
//! and Unicode-aware identifiers.
//!
//! Lexemes are borrowed slices of the source path; tokens never outlive
//! compilation. Only `String`, `Ident`, and `Number` tokens carry
//! meaningful lexeme content.

use crate::error::PathError;

/// The kind of a path token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `/` -- segment separator.
    Sep,
    /// `//` -- recursive separator (descendants).
    SepRecurse,
    /// `[` -- filter open.
    LBracket,
    /// `]` -- filter close.
    RBracket,
    /// `(` -- group or function-call open.
    LParen,
    /// `)` -- group or function-call close.
    RParen,
    /// `|` -- union.
    Union,
    /// `=` -- value comparison inside a filter.
    Equal,
    /// `:` -- namespace-prefix separator in a qualified name.
    Colon,
    /// `@` -- attribute marker.
    At,
    /// `.` -- current element.
    Dot,
    /// `..` -- parent element.
    DotDot,
    /// `*` -- all element children.
    Star,
    /// A quoted string literal; the lexeme is the content between quotes.
    String,
    /// An identifier (tag, attribute, or function name).
    Ident,
    /// A signed integer literal.
    Number,
    /// End of input.
    Eof,
}

/// A token produced by the path lexer.
///
/// The lexeme borrows from the source path string, and `pos` is the byte
/// offset of the lexeme's first character (used for error reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The token kind.
    pub kind: TokenKind,
    /// The token's text. For `String` tokens, the content between the
    /// quotes; for punctuation, the punctuation itself.
    pub lexeme: &'a str,
    /// Byte offset of the token in the source path.
    pub pos: usize,
}

/// Tokenizes a path string.
///
/// The returned vector always ends with a single `Eof` token.
///
/// # Errors
///
/// Returns [`PathError`] when an unrecognized character begins a lexeme, a
/// number is a lone `-`, a quoted string is unterminated, or a newline
/// appears outside a quoted string.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, PathError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    Ok(tokens)
}

/// Path expression tokenizer over a borrowed input string.
struct Lexer<'a> {
    /// The source path.
    input: &'a str,
    /// Current byte offset into the input.
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Reads the next token, skipping any leading spaces and tabs.
    fn next_token(&mut self) -> Result<Token<'a>, PathError> {
        self.skip_blank();

        let start = self.pos;
        let Some(b) = self.peek_byte() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        // Single-byte dispatch covers every ASCII lexeme start; identifiers
        // beginning with a non-ASCII character fall through to the char
        // classifier below.
        match b {
            b'[' => Ok(self.single(TokenKind::LBracket)),
            b']' => Ok(self.single(TokenKind::RBracket)),
            b'(' => Ok(self.single(TokenKind::LParen)),
            b')' => Ok(self.single(TokenKind::RParen)),
            b'|' => Ok(self.single(TokenKind::Union)),
            b'=' => Ok(self.single(TokenKind::Equal)),
            b':' => Ok(self.single(TokenKind::Colon)),
            b'@' => Ok(self.single(TokenKind::At)),
            b'*' => Ok(self.single(TokenKind::Star)),
            b'/' => Ok(self.read_slash()),
            b'.' => Ok(self.read_dot()),
            b'\'' | b'"' => self.read_string(),
            b'-' | b'0'..=b'9' => self.read_number(),
            b'\n' | b'\r' => Err(self.error("newline in path", start)),
            _ => self.read_ident(),
        }
    }

    /// Reads `/` or `//`.
    fn read_slash(&mut self) -> Token<'a> {
        let start = self.pos;
        self.advance(1);
        if self.peek_byte() == Some(b'/') {
            self.advance(1);
            self.spanned(TokenKind::SepRecurse, start)
        } else {
            self.spanned(TokenKind::Sep, start)
        }
    }

    /// Reads `.` or `..`.
    fn read_dot(&mut self) -> Token<'a> {
        let start = self.pos;
        self.advance(1);
        if self.peek_byte() == Some(b'.') {
            self.advance(1);
            self.spanned(TokenKind::DotDot, start)
        } else {
            self.spanned(TokenKind::Dot, start)
        }
    }

    /// Reads a quoted string literal. Either quote kind delimits; the other
    /// kind appears literally inside. There are no escapes.
    fn read_string(&mut self) -> Result<Token<'a>, PathError> {
        let start = self.pos;
        let quote = self.input.as_bytes()[self.pos];
        self.advance(1);

        let content_start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b == quote {
                let token = Token {
                    kind: TokenKind::String,
                    lexeme: &self.input[content_start..self.pos],
                    pos: start,
                };
                self.advance(1);
                return Ok(token);
            }
            self.advance(1);
        }

        Err(self.error("unterminated string", start))
    }

    /// Reads a signed integer literal. A lone `-` is an error.
    fn read_number(&mut self) -> Result<Token<'a>, PathError> {
        let start = self.pos;
        if self.peek_byte() == Some(b'-') {
            self.advance(1);
        }

        let digits_start = self.pos;
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.advance(1);
        }
        if self.pos == digits_start {
            return Err(self.error("expected digits after '-'", start));
        }

        Ok(self.spanned(TokenKind::Number, start))
    }

    /// Reads an identifier using the XML Name character classes.
    fn read_ident(&mut self) -> Result<Token<'a>, PathError> {
        let start = self.pos;
        let first = self.peek_char().unwrap_or('\0');
        if !is_name_start_char(first) {
            return Err(self.error(&format!("unexpected character '{first}'"), start));
        }
        self.advance(first.len_utf8());

        while let Some(c) = self.peek_char() {
            if !is_name_char(c) {
                break;
            }
            self.advance(c.len_utf8());
        }

        Ok(self.spanned(TokenKind::Ident, start))
    }

    // --- Utility methods ---

    /// Skips spaces and tabs between lexemes.
    fn skip_blank(&mut self) {
        while matches!(self.peek_byte(), Some(b' ' | b'\t')) {
            self.advance(1);
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    /// Consumes one byte and produces its token.
    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.pos;
        self.advance(1);
        self.spanned(kind, start)
    }

    /// Produces a token whose lexeme spans `start..self.pos`.
    fn spanned(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.input[start..self.pos],
            pos: start,
        }
    }

    /// Produces an empty-lexeme token at `start`.
    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            lexeme: "",
            pos: start,
        }
    }

    fn error(&self, message: &str, position: usize) -> PathError {
        PathError::new(message, position)
    }
}

/// Returns `true` if `c` may start an identifier.
///
/// The accepted set is the XML `NameStartChar` class minus `:` (which is
/// always a prefix separator in paths).
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '_'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}')
}

/// Returns `true` if `c` may continue an identifier (XML `NameChar`).
fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '0'..='9'
            | '-'
            | '.'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Helper to tokenize and return `(kind, lexeme)` pairs, panicking on
    /// error and dropping the trailing Eof.
    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        tokens[..tokens.len() - 1]
            .iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn test_tokenize_single_char_tokens() {
        assert_eq!(
            kinds("[]()|=:@*"),
            vec![
                (TokenKind::LBracket, "["),
                (TokenKind::RBracket, "]"),
                (TokenKind::LParen, "("),
                (TokenKind::RParen, ")"),
                (TokenKind::Union, "|"),
                (TokenKind::Equal, "="),
                (TokenKind::Colon, ":"),
                (TokenKind::At, "@"),
                (TokenKind::Star, "*"),
            ]
        );
    }

    #[test]
    fn test_tokenize_separators() {
        assert_eq!(
            kinds("a//b/c"),
            vec![
                (TokenKind::Ident, "a"),
                (TokenKind::SepRecurse, "//"),
                (TokenKind::Ident, "b"),
                (TokenKind::Sep, "/"),
                (TokenKind::Ident, "c"),
            ]
        );
    }

    #[test]
    fn test_tokenize_dots() {
        assert_eq!(
            kinds(".././"),
            vec![
                (TokenKind::DotDot, ".."),
                (TokenKind::Sep, "/"),
                (TokenKind::Dot, "."),
                (TokenKind::Sep, "/"),
            ]
        );
    }

    #[test]
    fn test_tokenize_qualified_path() {
        assert_eq!(
            kinds("./bookstore/book[@category='WEB']/p:price"),
            vec![
                (TokenKind::Dot, "."),
                (TokenKind::Sep, "/"),
                (TokenKind::Ident, "bookstore"),
                (TokenKind::Sep, "/"),
                (TokenKind::Ident, "book"),
                (TokenKind::LBracket, "["),
                (TokenKind::At, "@"),
                (TokenKind::Ident, "category"),
                (TokenKind::Equal, "="),
                (TokenKind::String, "WEB"),
                (TokenKind::RBracket, "]"),
                (TokenKind::Sep, "/"),
                (TokenKind::Ident, "p"),
                (TokenKind::Colon, ":"),
                (TokenKind::Ident, "price"),
            ]
        );
    }

    #[test]
    fn test_tokenize_strings_both_quote_kinds() {
        assert_eq!(kinds("'it\"s'"), vec![(TokenKind::String, "it\"s")]);
        assert_eq!(kinds("\"it's\""), vec![(TokenKind::String, "it's")]);
        // Empty strings are legal at the lexical level.
        assert_eq!(kinds("''"), vec![(TokenKind::String, "")]);
    }

    #[test]
    fn test_tokenize_string_may_contain_newline() {
        assert_eq!(kinds("'a\nb'"), vec![(TokenKind::String, "a\nb")]);
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("[12][-3][0]"),
            vec![
                (TokenKind::LBracket, "["),
                (TokenKind::Number, "12"),
                (TokenKind::RBracket, "]"),
                (TokenKind::LBracket, "["),
                (TokenKind::Number, "-3"),
                (TokenKind::RBracket, "]"),
                (TokenKind::LBracket, "["),
                (TokenKind::Number, "0"),
                (TokenKind::RBracket, "]"),
            ]
        );
    }

    #[test]
    fn test_tokenize_function_filter() {
        assert_eq!(
            kinds("local-name()='price'"),
            vec![
                (TokenKind::Ident, "local-name"),
                (TokenKind::LParen, "("),
                (TokenKind::RParen, ")"),
                (TokenKind::Equal, "="),
                (TokenKind::String, "price"),
            ]
        );
    }

    #[test]
    fn test_tokenize_blank_skipping() {
        assert_eq!(
            kinds(" a \t| b "),
            vec![
                (TokenKind::Ident, "a"),
                (TokenKind::Union, "|"),
                (TokenKind::Ident, "b"),
            ]
        );
    }

    #[test]
    fn test_tokenize_unicode_identifier() {
        assert_eq!(kinds("bücher"), vec![(TokenKind::Ident, "bücher")]);
        assert_eq!(kinds("日本語"), vec![(TokenKind::Ident, "日本語")]);
    }

    #[test]
    fn test_tokenize_ident_continuation_chars() {
        // `-` and `.` continue an identifier but cannot start one.
        assert_eq!(kinds("local-name"), vec![(TokenKind::Ident, "local-name")]);
        assert_eq!(kinds("a.b"), vec![(TokenKind::Ident, "a.b")]);
    }

    #[test]
    fn test_tokenize_token_positions() {
        let tokens = tokenize("a/'x'").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(positions, vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_tokenize_unterminated_string_error() {
        let err = tokenize("tag[@a='oops]").unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_tokenize_lone_minus_error() {
        assert!(tokenize("[-]").is_err());
    }

    #[test]
    fn test_tokenize_newline_error() {
        assert!(tokenize("a\nb").is_err());
        assert!(tokenize("a\r").is_err());
    }

    #[test]
    fn test_tokenize_illegal_character_error() {
        let err = tokenize("a$b").unwrap_err();
        assert!(err.message.contains("unexpected character"));
        assert_eq!(err.position, 1);
    }
}
