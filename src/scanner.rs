//! Scanner for the Tinycat BASIC Language
//!
//! Unlike a conventional compiler pipeline, Tinycat BASIC has no separate
//! tokenization pass: the scanner and the recursive-descent parser are
//! interleaved. Each `match_*` method attempts to recognize one lexical
//! element starting at the current cursor; on success it both consumes the
//! input and records the matched text, on failure it leaves the cursor
//! untouched. The parser calls these directly while building up statements
//! and expressions, rather than pulling from a pre-built token stream.
//!
//! ## Scanner Triple
//!
//! The scanner's complete state is three pieces of data: the current line
//! text, the cursor position within it, and the text of the last token
//! matched. The reference implementation keeps these as process-wide
//! globals; here they are fields of one [`Scanner`] value that the
//! interpreter owns, passes around by mutable reference, and — critically —
//! saves and restores wholesale around user-defined function calls (see
//! `interpreter::call_user_function`), since evaluating a function body
//! requires temporarily scanning a different line.
//!
//! ## Matcher Ordering
//!
//! `match_relation` must try longer operator spellings before their
//! prefixes (`<=` before `<`, `>=` before `>`, `<>` before `<`) or the
//! longer form would never be reached.

use crate::error::{BasicError, Result};

/// Scanning state over a single line of source text.
pub struct Scanner {
    line: String,
    cursor: usize,
    token: String,
}

impl Scanner {
    /// Creates a scanner positioned at the start of an empty line.
    pub fn new() -> Self {
        Self {
            line: String::new(),
            cursor: 0,
            token: String::new(),
        }
    }

    /// Installs a new line of source text and resets the cursor to zero.
    ///
    /// Used both to feed the next stored program line into the engine and
    /// to swap in a user-defined function's body during a call.
    pub fn set_line(&mut self, line: impl Into<String>) {
        self.line = line.into();
        self.cursor = 0;
    }

    /// The line currently being scanned.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Current cursor position, as a byte offset from the start of the
    /// line (always a char boundary, never mid-sequence of a multi-byte
    /// UTF-8 character).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text of the most recently matched token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decodes the full Unicode scalar value starting at byte offset `i`,
    /// not just its lead byte — `i` must be a char boundary, an invariant
    /// every matcher below maintains by advancing the cursor in whole
    /// `char`s (via `len_utf8`), never a fixed one byte at a time.
    fn at(&self, i: usize) -> Option<char> {
        self.line[i..].chars().next()
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.line.len()
    }

    /// Advances the cursor over any whitespace starting at the cursor,
    /// Unicode whitespace (NBSP, em space, ...) included, not just ASCII
    /// space/tab.
    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.at(self.cursor) {
            if c.is_whitespace() {
                self.cursor += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// True iff, after skipping whitespace, the cursor is at the end of the line.
    pub fn match_eol(&mut self) -> bool {
        self.skip_whitespace();
        self.is_at_end()
    }

    /// Matches a run of one or more ASCII letters (no leading whitespace skip
    /// is performed here in the reference implementation, but callers that
    /// want whitespace-tolerant keyword matching should `skip_whitespace`
    /// first or use [`Scanner::match_nocase`]).
    pub fn match_keyword(&mut self) -> bool {
        if self.is_at_end() || !self.at(self.cursor).unwrap().is_ascii_alphabetic() {
            return false;
        }
        let mark = self.cursor;
        while let Some(c) = self.at(self.cursor) {
            if c.is_ascii_alphabetic() {
                self.cursor += 1;
            } else {
                break;
            }
        }
        self.token = self.line[mark..self.cursor].to_string();
        true
    }

    /// Matches an identifier: a letter followed by letters or digits.
    pub fn match_varname(&mut self) -> bool {
        self.skip_whitespace();
        if self.is_at_end() || !self.at(self.cursor).unwrap().is_ascii_alphabetic() {
            return false;
        }
        let mark = self.cursor;
        while let Some(c) = self.at(self.cursor) {
            if c.is_ascii_alphanumeric() {
                self.cursor += 1;
            } else {
                break;
            }
        }
        self.token = self.line[mark..self.cursor].to_string();
        true
    }

    /// Matches a numeric literal: digits, optionally `.` and more digits.
    /// No leading sign — unary minus is handled syntactically by the parser.
    pub fn match_number(&mut self) -> bool {
        self.skip_whitespace();
        if self.is_at_end() || !self.at(self.cursor).unwrap().is_ascii_digit() {
            return false;
        }
        let mark = self.cursor;
        while let Some(c) = self.at(self.cursor) {
            if c.is_ascii_digit() {
                self.cursor += 1;
            } else {
                break;
            }
        }
        if self.at(self.cursor) == Some('.') {
            self.cursor += 1;
            while let Some(c) = self.at(self.cursor) {
                if c.is_ascii_digit() {
                    self.cursor += 1;
                } else {
                    break;
                }
            }
        }
        self.token = self.line[mark..self.cursor].to_string();
        true
    }

    /// Matches a double-quoted string literal. The token is the content
    /// without the surrounding quotes; there is no escape syntax.
    ///
    /// # Errors
    /// Returns `Index` error if the line ends before the closing quote.
    pub fn match_string(&mut self) -> Result<bool> {
        self.skip_whitespace();
        if self.at(self.cursor) != Some('"') {
            return Ok(false);
        }
        let mark = self.cursor;
        self.cursor += 1;
        loop {
            match self.at(self.cursor) {
                None => return Err(BasicError::Index("Unclosed string".to_string())),
                Some('"') => break,
                Some(c) => self.cursor += c.len_utf8(),
            }
        }
        self.cursor += 1;
        self.token = self.line[mark + 1..self.cursor - 1].to_string();
        Ok(true)
    }

    /// Matches a literal prefix (after skipping whitespace), e.g. `"="`,
    /// `"("`, `","`. Consumes it on success.
    pub fn match_literal(&mut self, text: &str) -> bool {
        self.skip_whitespace();
        if self.line[self.cursor..].starts_with(text) {
            self.cursor += text.len();
            true
        } else {
            false
        }
    }

    /// Case-insensitive keyword match. Atomic: the cursor is restored to its
    /// pre-call position on failure, so callers don't need to save it
    /// themselves before a speculative keyword check.
    pub fn match_nocase(&mut self, keyword: &str) -> bool {
        let mark = self.cursor;
        self.skip_whitespace();
        if !self.match_keyword() {
            self.cursor = mark;
            return false;
        }
        if !self.token.eq_ignore_ascii_case(keyword) {
            self.cursor = mark;
            return false;
        }
        true
    }

    /// Matches one of the six relational operators. Longer spellings are
    /// tried before their prefixes so `<=`/`>=`/`<>` are never shadowed by
    /// `<`/`>`.
    pub fn match_relation(&mut self) -> Option<Relation> {
        self.skip_whitespace();
        const OPS: [(&str, Relation); 6] = [
            ("<=", Relation::Le),
            (">=", Relation::Ge),
            ("<>", Relation::Ne),
            ("=", Relation::Eq),
            ("<", Relation::Lt),
            (">", Relation::Gt),
        ];
        for (text, rel) in OPS {
            if self.line[self.cursor..].starts_with(text) {
                self.token = text.to_string();
                self.cursor += text.len();
                return Some(rel);
            }
        }
        None
    }

    /// Recognizes a bare line-number prefix: one or more digits with no
    /// decimal point, used only by the top-level line dispatcher to tell a
    /// stored-line definition (`10 PRINT X`) apart from an immediate
    /// statement. `match_number` is not reused here because it would also
    /// (wrongly) accept a fractional line number.
    pub fn match_line_number(&mut self) -> Option<i64> {
        self.skip_whitespace();
        let mark = self.cursor;
        while let Some(c) = self.at(self.cursor) {
            if c.is_ascii_digit() {
                self.cursor += 1;
            } else {
                break;
            }
        }
        if self.cursor > mark {
            self.line[mark..self.cursor].parse().ok()
        } else {
            None
        }
    }

    /// The remainder of the line from the cursor to the end, used by
    /// statements that consume the rest of the line verbatim (`REM`, the
    /// right-hand side of `DEF FN`).
    pub fn rest_of_line(&self) -> &str {
        &self.line[self.cursor..]
    }

    /// Jumps the cursor to the end of the line, as `REM` does.
    pub fn consume_to_eol(&mut self) {
        self.cursor = self.line.len();
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// A relational operator recognized by [`Scanner::match_relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_whitespace_then_keyword() {
        let mut s = Scanner::new();
        s.set_line("   PRINT");
        assert!(!s.match_keyword()); // match_keyword does not itself skip ws
        s.skip_whitespace();
        assert!(s.match_keyword());
        assert_eq!(s.token(), "PRINT");
        assert_eq!(s.cursor(), 8);
    }

    #[test]
    fn match_keyword_stops_at_digit() {
        let mut s = Scanner::new();
        s.set_line("ab12");
        assert!(s.match_keyword());
        assert_eq!(s.token(), "ab");
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn match_varname_consumes_digits() {
        let mut s = Scanner::new();
        s.set_line("ab12 = 3");
        assert!(s.match_varname());
        assert_eq!(s.token(), "ab12");
    }

    #[test]
    fn match_number_integer_and_decimal() {
        let mut s = Scanner::new();
        s.set_line("42");
        assert!(s.match_number());
        assert_eq!(s.token(), "42");

        let mut s2 = Scanner::new();
        s2.set_line("3.14");
        assert!(s2.match_number());
        assert_eq!(s2.token(), "3.14");
    }

    #[test]
    fn match_string_ok() {
        let mut s = Scanner::new();
        s.set_line("\"hello world\" rest");
        assert!(s.match_string().unwrap());
        assert_eq!(s.token(), "hello world");
    }

    #[test]
    fn match_string_unclosed_errors() {
        let mut s = Scanner::new();
        s.set_line("\"oops");
        let err = s.match_string().unwrap_err();
        assert!(matches!(err, BasicError::Index(_)));
    }

    #[test]
    fn relation_longer_forms_before_shorter() {
        for (src, expected) in [
            ("<=", Relation::Le),
            (">=", Relation::Ge),
            ("<>", Relation::Ne),
            ("<", Relation::Lt),
            (">", Relation::Gt),
            ("=", Relation::Eq),
        ] {
            let mut s = Scanner::new();
            s.set_line(src);
            assert_eq!(s.match_relation(), Some(expected), "src={}", src);
        }
    }

    #[test]
    fn match_nocase_restores_cursor_on_failure() {
        let mut s = Scanner::new();
        s.set_line("THEN rest");
        assert!(!s.match_nocase("else"));
        assert_eq!(s.cursor(), 0);
        assert!(s.match_nocase("then"));
        assert_eq!(s.cursor(), 4);
    }

    #[test]
    fn match_line_number_rejects_decimal_point() {
        let mut s = Scanner::new();
        s.set_line("10 PRINT X");
        assert_eq!(s.match_line_number(), Some(10));
        assert_eq!(s.rest_of_line(), " PRINT X");

        let mut s2 = Scanner::new();
        s2.set_line("PRINT X");
        assert_eq!(s2.match_line_number(), None);
    }

    #[test]
    fn cursor_at_end_after_full_line_consumed() {
        let mut s = Scanner::new();
        s.set_line("RETURN");
        assert!(s.match_keyword());
        assert!(s.match_eol());
    }

    #[test]
    fn skip_whitespace_advances_over_unicode_whitespace() {
        // U+00A0 NBSP and U+2003 EM SPACE are both multi-byte in UTF-8; a
        // byte-at-a-time cursor would stop on their lead byte instead of
        // recognizing them as whitespace.
        let mut s = Scanner::new();
        s.set_line("\u{00A0}\u{2003}PRINT");
        s.skip_whitespace();
        assert!(s.match_keyword());
        assert_eq!(s.token(), "PRINT");
    }

    #[test]
    fn match_string_handles_multibyte_content() {
        let mut s = Scanner::new();
        s.set_line("\"caf\u{00E9}\" rest");
        assert!(s.match_string().unwrap());
        assert_eq!(s.token(), "caf\u{00E9}");
        assert_eq!(s.rest_of_line(), " rest");
    }
}
