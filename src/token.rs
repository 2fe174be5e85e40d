//! Lexical scanner for PGN text.
//!
//! # Examples
//!
//! ```
//! use pgn_tree::token::{Token, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new("1. e4 {best by test} *");
//!
//! let first = tokenizer.next_token()?.expect("move");
//! assert_eq!(first.token, Token::Move("e4"));
//! assert_eq!(first.pos, 0);
//!
//! assert!(matches!(tokenizer.next_token()?.map(|t| t.token), Some(Token::Comment(_))));
//! assert!(matches!(tokenizer.next_token()?.map(|t| t.token), Some(Token::EndOfGame(_))));
//! assert!(tokenizer.next_token()?.is_none());
//! # Ok::<_, pgn_tree::PgnError>(())
//! ```

use crate::{
    comment::RawComment,
    errors::{PgnError, PgnErrorKind},
    game::GameResult,
    header::RawHeader,
    nag::Nag,
};

/// A single PGN token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token<'a> {
    /// `[Key "value"]`
    Header { key: &'a str, value: RawHeader<'a> },
    /// A move in SAN, including a check or checkmate suffix, but without
    /// the move number. `--` for a null move.
    Move(&'a str),
    Nag(Nag),
    /// `{...}`
    Comment(RawComment<'a>),
    /// `(`
    BeginVariation,
    /// `)`
    EndVariation,
    /// `1-0`, `0-1`, `1/2-1/2` or `*`.
    EndOfGame(GameResult),
}

/// A token with its location.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    /// Byte offset of the token, including the move number of a move.
    pub pos: usize,
    /// Whether at least two line breaks precede the token.
    pub after_blank_line: bool,
}

/// Splits PGN text into tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Tokenizer<'a> {
        Tokenizer { text, pos: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Length of the text, the offset reported for errors at the end of
    /// the input.
    pub(crate) fn end(&self) -> usize {
        self.text.len()
    }

    /// Reads the next token, or `None` at the end of the text.
    ///
    /// # Errors
    ///
    /// Returns [`PgnErrorKind::InvalidPgnToken`] if the text after the
    /// cursor is not a token. The cursor is left at the start of the
    /// offending text.
    pub fn next_token(&mut self) -> Result<Option<Spanned<'a>>, PgnError> {
        let after_blank_line = self.skip_blanks();
        if self.pos >= self.text.len() {
            return Ok(None);
        }

        let pos = self.pos;
        let (token, len) = Tokenizer::scan(self).ok_or_else(|| self.invalid_token())?;
        self.pos += len;
        Ok(Some(Spanned {
            token,
            pos,
            after_blank_line,
        }))
    }

    /// Skips spaces and line breaks. Returns `true` if there were at least
    /// two line breaks.
    fn skip_blanks(&mut self) -> bool {
        let bytes = self.text.as_bytes();
        let mut line_breaks = 0;
        while let Some(&ch) = bytes.get(self.pos) {
            match ch {
                b' ' | b'\t' | b'\x0b' | b'\x0c' => self.pos += 1,
                b'\r' if bytes.get(self.pos + 1) == Some(&b'\n') => {
                    self.pos += 2;
                    line_breaks += 1;
                }
                b'\r' | b'\n' => {
                    self.pos += 1;
                    line_breaks += 1;
                }
                _ => break,
            }
        }
        line_breaks >= 2
    }

    fn invalid_token(&self) -> PgnError {
        let rest = &self.text[self.pos..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        PgnError::new(PgnErrorKind::InvalidPgnToken, self.pos, &rest[..end])
    }

    /// Matches a token at the cursor. Returns the token and its length.
    fn scan(&self) -> Option<(Token<'a>, usize)> {
        let text: &'a str = &self.text[self.pos..];
        let bytes = text.as_bytes();

        if let Some(header) = scan_header(text) {
            return Some(header);
        }
        if let Some((start, end)) = scan_move(bytes) {
            return Some((Token::Move(&text[start..end]), end));
        }
        if let Some((nag, len)) = Nag::scan(bytes) {
            // An out of range NAG is not a token.
            return nag.ok().map(|nag| (Token::Nag(nag), len));
        }
        if let Some(end) = scan_comment(bytes) {
            return Some((Token::Comment(RawComment(&text[1..end - 1])), end));
        }
        match bytes[0] {
            b'(' => return Some((Token::BeginVariation, 1)),
            b')' => return Some((Token::EndVariation, 1)),
            _ => (),
        }
        GameResult::ALL
            .iter()
            .find(|result| bytes.starts_with(result.as_str().as_bytes()))
            .map(|&result| (Token::EndOfGame(result), result.as_str().len()))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Spanned<'a>, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.pos = self.text.len();
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

/// `[ key "value" ]`
fn scan_header(text: &str) -> Option<(Token<'_>, usize)> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let key_start = 1 + whitespace(&bytes[1..]);
    let key_end = key_start
        + bytes[key_start..]
            .iter()
            .take_while(|&&ch| ch.is_ascii_alphanumeric() || ch == b'_')
            .count();
    if key_end == key_start {
        return None;
    }

    let ws = whitespace(&bytes[key_end..]);
    let quote = key_end + ws;
    if ws == 0 || bytes.get(quote) != Some(&b'"') {
        return None;
    }

    let value_start = quote + 1;
    let mut value_end = value_start;
    loop {
        match bytes.get(value_end)? {
            b'"' => break,
            b'\\' => match bytes.get(value_end + 1)? {
                b'\\' | b'"' | b'[' | b']' => value_end += 2,
                _ => return None,
            },
            b'[' | b']' => return None,
            _ => value_end += 1,
        }
    }

    let ket = value_end + 1 + whitespace(&bytes[value_end + 1..]);
    if bytes.get(ket) != Some(&b']') {
        return None;
    }

    Some((
        Token::Header {
            key: &text[key_start..key_end],
            value: RawHeader(&text[value_start..value_end]),
        },
        ket + 1,
    ))
}

/// Optional move number, then a move. Returns the span of the move
/// itself.
fn scan_move(bytes: &[u8]) -> Option<(usize, usize)> {
    if let Some(start) = move_number(bytes) {
        if let Some(end) = san(&bytes[start..]) {
            return Some((start, start + end));
        }
    }
    san(bytes).map(|end| (0, end))
}

/// `1.`, `12. ` or `3...`, with optional whitespace before and after the
/// dots.
fn move_number(bytes: &[u8]) -> Option<usize> {
    if !matches!(bytes.first(), Some(b'1'..=b'9')) {
        return None;
    }
    let mut i = bytes.iter().take_while(|ch| ch.is_ascii_digit()).count();
    i += whitespace(&bytes[i..]);
    if bytes.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;
    if bytes[i..].starts_with(b"..") {
        i += 2;
    }
    Some(i + whitespace(&bytes[i..]))
}

fn whitespace(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&ch| matches!(ch, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r'))
        .count()
}

fn is_file(ch: Option<&u8>) -> bool {
    matches!(ch, Some(b'a'..=b'h'))
}

fn is_rank(ch: Option<&u8>) -> bool {
    matches!(ch, Some(b'1'..=b'8'))
}

fn is_square(bytes: &[u8], i: usize) -> bool {
    is_file(bytes.get(i)) && is_rank(bytes.get(i + 1))
}

/// Length of the SAN at the start of `bytes`, including a check or
/// checkmate suffix.
fn san(bytes: &[u8]) -> Option<usize> {
    if bytes.starts_with(b"--") {
        return Some(2);
    }

    let end = if bytes.starts_with(b"O-O-O") {
        5
    } else if bytes.starts_with(b"O-O") {
        3
    } else if matches!(bytes.first(), Some(b'K' | b'Q' | b'R' | b'B' | b'N')) {
        piece_move(bytes)?
    } else {
        pawn_move(bytes)?
    };

    Some(match bytes.get(end) {
        Some(b'+' | b'#') => end + 1,
        _ => end,
    })
}

/// `[KQRBN][a-h]?[1-8]?x?[a-h][1-8]`, preferring to assign the optional
/// parts in order.
fn piece_move(bytes: &[u8]) -> Option<usize> {
    for file in [true, false] {
        if file && !is_file(bytes.get(1)) {
            continue;
        }
        let i = 1 + usize::from(file);
        for rank in [true, false] {
            if rank && !is_rank(bytes.get(i)) {
                continue;
            }
            let i = i + usize::from(rank);
            for capture in [true, false] {
                if capture && bytes.get(i) != Some(&b'x') {
                    continue;
                }
                let i = i + usize::from(capture);
                if is_square(bytes, i) {
                    return Some(i + 2);
                }
            }
        }
    }
    None
}

/// `([a-h]x?)?[a-h][1-8](=?[KQRBNP])?`
fn pawn_move(bytes: &[u8]) -> Option<usize> {
    let mut starts = Vec::with_capacity(3);
    if is_file(bytes.first()) {
        if bytes.get(1) == Some(&b'x') {
            starts.push(2);
        }
        starts.push(1);
    }
    starts.push(0);

    let to = starts.into_iter().find(|&i| is_square(bytes, i))?;
    let end = to + 2;
    let is_piece = |ch: Option<&u8>| matches!(ch, Some(b'K' | b'Q' | b'R' | b'B' | b'N' | b'P'));
    Some(if bytes.get(end) == Some(&b'=') && is_piece(bytes.get(end + 1)) {
        end + 2
    } else if is_piece(bytes.get(end)) {
        end + 1
    } else {
        end
    })
}

/// `{...}` with escaped braces and backslashes. Returns the length
/// including the braces.
fn scan_comment(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'{') {
        return None;
    }
    let mut i = 1;
    loop {
        i += memchr::memchr3(b'{', b'}', b'\\', &bytes[i..])?;
        match bytes[i] {
            b'}' => return Some(i + 1),
            b'\\' if matches!(bytes.get(i + 1), Some(b'{' | b'}' | b'\\')) => i += 2,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token<'_>> {
        Tokenizer::new(text)
            .map(|token| token.expect("valid token").token)
            .collect()
    }

    fn invalid(text: &str) -> PgnError {
        Tokenizer::new(text)
            .find_map(Result::err)
            .expect("invalid token")
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            tokens(r#"[White "Kasparov, G."] [ Black_2   "\"Deep\" \[Blue\]" ]"#),
            [
                Token::Header {
                    key: "White",
                    value: RawHeader("Kasparov, G.")
                },
                Token::Header {
                    key: "Black_2",
                    value: RawHeader(r#"\"Deep\" \[Blue\]"#)
                },
            ]
        );
        assert_eq!(
            tokens("[Event\n\"\"\n]"),
            [Token::Header {
                key: "Event",
                value: RawHeader("")
            }]
        );

        for text in [
            r#"[White"Kasparov"]"#,
            r#"[White "Kasparov]"#,
            r#"[White "a]b"]"#,
            r#"[White "a\nb"]"#,
            r#"["Kasparov"]"#,
        ] {
            assert_eq!(invalid(text).kind(), PgnErrorKind::InvalidPgnToken, "{text}");
        }
    }

    #[test]
    fn test_moves() {
        assert_eq!(
            tokens("1.e4 e5 2. Nf3 2...Nc6 3 . Bb5 O-O-O O-O+ exd8=Q# e8Q Raxb1 R1a3 Qh4xe1 --"),
            [
                Token::Move("e4"),
                Token::Move("e5"),
                Token::Move("Nf3"),
                Token::Move("Nc6"),
                Token::Move("Bb5"),
                Token::Move("O-O-O"),
                Token::Move("O-O+"),
                Token::Move("exd8=Q#"),
                Token::Move("e8Q"),
                Token::Move("Raxb1"),
                Token::Move("R1a3"),
                Token::Move("Qh4xe1"),
                Token::Move("--"),
            ]
        );
    }

    #[test]
    fn test_moves_without_separators() {
        assert_eq!(tokens("e4e5"), [Token::Move("e4"), Token::Move("e5")]);
        assert_eq!(tokens("Nbd7"), [Token::Move("Nbd7")]);
        assert_eq!(tokens("Ne4e5"), [Token::Move("Ne4e5")]);
        assert_eq!(
            tokens("e8=?"),
            [
                Token::Move("e8"),
                Token::Nag(Nag::DRAWISH_POSITION),
                Token::Nag(Nag::MISTAKE)
            ]
        );
    }

    #[test]
    fn test_move_positions() {
        let tokens = Tokenizer::new("1. e4\n\n 1... e5")
            .collect::<Result<Vec<_>, _>>()
            .expect("valid tokens");
        assert_eq!(
            tokens,
            [
                Spanned {
                    token: Token::Move("e4"),
                    pos: 0,
                    after_blank_line: false
                },
                Spanned {
                    token: Token::Move("e5"),
                    pos: 8,
                    after_blank_line: true
                },
            ]
        );
    }

    #[test]
    fn test_nags() {
        assert_eq!(
            tokens("$3 !! ?! +/- =+ = ~ inf $255 $256"),
            [
                Token::Nag(Nag(3)),
                Token::Nag(Nag(3)),
                Token::Nag(Nag(6)),
                Token::Nag(Nag(16)),
                Token::Nag(Nag(15)),
                Token::Nag(Nag(10)),
                Token::Nag(Nag(13)),
                Token::Nag(Nag(13)),
                Token::Nag(Nag(255)),
                Token::Nag(Nag(256)),
            ]
        );

        let err = invalid("e4 $4294967296");
        assert_eq!(err.kind(), PgnErrorKind::InvalidPgnToken);
        assert_eq!(err.position(), Some(3));
        assert_eq!(err.token(), "$4294967296");
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens(r"{a \{nested\} \\ comment}{}"),
            [
                Token::Comment(RawComment(r"a \{nested\} \\ comment")),
                Token::Comment(RawComment("")),
            ]
        );
        for text in ["{unterminated", "{a {b}", r"{a \n b}"] {
            assert_eq!(invalid(text).position(), Some(0), "{text}");
        }
    }

    #[test]
    fn test_variations_and_results() {
        assert_eq!(
            tokens("(e4) 1-0 0-1 1/2-1/2 *"),
            [
                Token::BeginVariation,
                Token::Move("e4"),
                Token::EndVariation,
                Token::EndOfGame(GameResult::WhiteWins),
                Token::EndOfGame(GameResult::BlackWins),
                Token::EndOfGame(GameResult::Draw),
                Token::EndOfGame(GameResult::LineInProgress),
            ]
        );
    }

    #[test]
    fn test_blank_lines() {
        let blank_lines = |text| {
            Tokenizer::new(text)
                .map(|token| token.expect("valid token").after_blank_line)
                .collect::<Vec<_>>()
        };
        assert_eq!(blank_lines("e4\ne5"), [false, false]);
        assert_eq!(blank_lines("e4\n \ne5"), [false, true]);
        assert_eq!(blank_lines("e4\r\n\r\ne5"), [false, true]);
        assert_eq!(blank_lines("e4\r\ne5"), [false, false]);
        assert_eq!(blank_lines("e4\r\re5"), [false, true]);
        assert_eq!(blank_lines("\n\ne4"), [true]);
    }

    #[test]
    fn test_invalid_token() {
        let mut tokenizer = Tokenizer::new("1. e4 ; comment\n*");
        assert!(tokenizer.next().is_some_and(|token| token.is_ok()));
        let err = tokenizer.next().expect("error").expect_err("invalid token");
        assert_eq!(err.kind(), PgnErrorKind::InvalidPgnToken);
        assert_eq!(err.position(), Some(6));
        assert_eq!(err.token(), ";");
        assert!(tokenizer.next().is_none());

        assert_eq!(invalid("1.Pe4").token(), "1.Pe4");
        assert_eq!(invalid("e9").position(), Some(0));
    }

    #[test]
    fn test_empty() {
        assert!(tokens("").is_empty());
        assert!(tokens(" \n\t\r\n ").is_empty());
    }
}
