//! String literal lexing.
//!
//! Strings are double-quote delimited and single-line. Recognized escapes
//! are `\\ \" \' \n \t \r \b \f \0`. An unknown escape turns the whole
//! literal into an error token whose offset points at the backslash.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a string literal.
    pub(crate) fn lex_string(&mut self) -> Token {
        self.cursor.advance();

        let mut value = String::new();
        // Offset of the first bad escape's backslash, if any.
        let mut bad_escape: Option<usize> = None;

        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                return self.error_token("unterminated string literal".to_string(), 0);
            }

            let c = self.cursor.current_char();
            if c == '"' {
                self.cursor.advance();
                break;
            }

            if c == '\\' {
                let offset = self.offset_in_token();
                self.cursor.advance();
                match self.escape_char() {
                    Some(decoded) => value.push(decoded),
                    None => {
                        if bad_escape.is_none() {
                            bad_escape = Some(offset);
                        }
                    }
                }
            } else {
                value.push(c);
                self.cursor.advance();
            }
        }

        if let Some(offset) = bad_escape {
            return self.error_token("invalid escape sequence in string literal".to_string(), offset);
        }

        self.make_token(TokenKind::Str, &value)
    }

    /// Decodes the escape character after a consumed backslash.
    ///
    /// Returns `None` for unknown escapes; the cursor still advances past
    /// the escape character so scanning continues.
    fn escape_char(&mut self) -> Option<char> {
        let c = self.cursor.current_char();
        if c == '\n' || self.cursor.is_at_end() {
            // A backslash at end of line falls into the unterminated case
            // on the next loop iteration.
            return None;
        }
        self.cursor.advance();
        match c {
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'b' => Some('\u{0008}'),
            'f' => Some('\u{000C}'),
            '0' => Some('\0'),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_util::Handler;

    fn first(source: &str) -> (Token, Handler) {
        let handler = Handler::new();
        let token = {
            let mut lexer = Lexer::new(source, &handler);
            lexer.next_token()
        };
        (token, handler)
    }

    #[test]
    fn test_simple_string() {
        let (tok, handler) = first("\"hello\"");
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.text.as_str(), "hello");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_escapes_decoded() {
        let (tok, _) = first(r#""a\tb\nc\\d\"e""#);
        assert_eq!(tok.text.as_str(), "a\tb\nc\\d\"e");
    }

    #[test]
    fn test_backslash_counting() {
        // \\" closes the string: the backslash escapes a backslash, then
        // the quote terminates.
        let (tok, _) = first(r#""x\\""#);
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.text.as_str(), "x\\");
    }

    #[test]
    fn test_unknown_escape_offset() {
        let (tok, handler) = first(r#""ab\qcd";"#);
        assert_eq!(tok.kind, TokenKind::Error);
        // Offset points at the backslash: column 4 within the token that
        // starts at column 1.
        assert_eq!(tok.error_offset, 3);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_unterminated_at_newline() {
        let (tok, handler) = first("\"abc\ndef\"");
        assert_eq!(tok.kind, TokenKind::Error);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_unterminated_at_eof() {
        let (tok, handler) = first("\"abc");
        assert_eq!(tok.kind, TokenKind::Error);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_scanning_continues_after_bad_string() {
        let handler = Handler::new();
        let tokens = Lexer::new("\"a\\q\" 42", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[1].kind, TokenKind::Int);
    }
}
