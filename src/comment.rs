use std::{borrow::Cow, fmt};

/// A comment, excluding the braces, as it appears in the PGN text.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawComment<'a>(pub &'a str);

impl<'a> RawComment<'a> {
    /// Returns the raw text of the comment, still escaped.
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// Decodes escaped braces and backslashes. Allocates only when the
    /// comment actually contains escape sequences.
    pub fn unescape(&self) -> Cow<'a, str> {
        unescape(self.0, b"{}\\")
    }

    /// Decodes the comment: unescapes it, extracts the embedded
    /// `[%key value]` directives, then trims the remaining text and collapses
    /// whitespace runs.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgn_tree::comment::RawComment;
    ///
    /// let comment = RawComment("[%eval 0.3]  good\n  move ").decode();
    /// assert_eq!(comment.text.as_deref(), Some("good move"));
    /// assert_eq!(comment.tags, vec![("eval".to_owned(), "0.3".to_owned())]);
    /// ```
    pub fn decode(&self) -> Comment {
        let unescaped = self.unescape();
        let mut tags = Vec::new();
        let mut text = String::with_capacity(unescaped.len());

        let mut head = 0;
        for start in memchr::memmem::find_iter(unescaped.as_bytes(), b"[%") {
            if start < head {
                continue;
            }
            if let Some((key, value, end)) = scan_directive(&unescaped[start..]) {
                text.push_str(&unescaped[head..start]);
                text.push(' ');
                tags.push((key.to_owned(), value.to_owned()));
                head = start + end;
            }
        }
        text.push_str(&unescaped[head..]);

        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Comment {
            text: if text.is_empty() { None } else { Some(text) },
            tags,
        }
    }
}

impl fmt::Debug for RawComment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A decoded comment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Comment {
    /// Visible text, `None` if nothing but whitespace and directives.
    pub text: Option<String>,
    /// `[%key value]` directives, in order of appearance.
    pub tags: Vec<(String, String)>,
}

/// Matches `[%key value]` at the start of `s`, where the key consists of
/// ASCII letters and the value of anything but brackets.
fn scan_directive(s: &str) -> Option<(&str, &str, usize)> {
    let bytes = s.as_bytes();
    let key_end = 2 + bytes[2..].iter().take_while(|ch| ch.is_ascii_alphabetic()).count();
    if key_end == 2 || bytes.get(key_end) != Some(&b' ') {
        return None;
    }
    let value_start = key_end + 1;
    let value_end = value_start + memchr::memchr2(b'[', b']', &bytes[value_start..])?;
    if value_end == value_start || bytes[value_end] != b']' {
        return None;
    }
    Some((&s[2..key_end], &s[value_start..value_end], value_end + 1))
}

/// Removes the backslash in front of each character of `escapable`.
pub(crate) fn unescape<'a>(raw: &'a str, escapable: &[u8]) -> Cow<'a, str> {
    let bytes = raw.as_bytes();
    let mut decoded = String::new();
    let mut head = 0;
    let mut search = 0;
    while let Some(delta) = memchr::memchr(b'\\', &bytes[search..]) {
        let escape = search + delta;
        match bytes.get(escape + 1) {
            Some(ch) if escapable.contains(ch) => {
                decoded.push_str(&raw[head..escape]);
                head = escape + 1;
                search = escape + 2;
            }
            _ => search = escape + 1,
        }
    }
    if head == 0 {
        Cow::Borrowed(raw)
    } else {
        decoded.push_str(&raw[head..]);
        Cow::Owned(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("plain", b"{}\\"), Cow::Borrowed("plain"));
        assert_eq!(unescape(r"a \{b\} c", b"{}\\"), "a {b} c");
        assert_eq!(unescape(r"\\\{", b"{}\\"), r"\{");
        assert_eq!(unescape(r#"say \"hi\"\\"#, b"\\\"[]"), r#"say "hi"\"#);
        assert_eq!(unescape(r"keep \n", b"{}\\"), r"keep \n");
    }

    #[test]
    fn test_collapse_whitespace() {
        let comment = RawComment("  a   b  ").decode();
        assert_eq!(comment.text.as_deref(), Some("a b"));
        assert!(comment.tags.is_empty());

        let comment = RawComment(" \n\t ").decode();
        assert_eq!(comment, Comment::default());
    }

    #[test]
    fn test_directives() {
        let comment = RawComment("[%eval 0.3] good move").decode();
        assert_eq!(comment.text.as_deref(), Some("good move"));
        assert_eq!(comment.tags, tags(&[("eval", "0.3")]));

        let comment = RawComment("before[%clk 1:02:03]after [%csl Ra1,Gb2]").decode();
        assert_eq!(comment.text.as_deref(), Some("before after"));
        assert_eq!(comment.tags, tags(&[("clk", "1:02:03"), ("csl", "Ra1,Gb2")]));

        let comment = RawComment("[%clk 0:01] [%clk 0:02]").decode();
        assert_eq!(comment.text, None);
        assert_eq!(comment.tags, tags(&[("clk", "0:01"), ("clk", "0:02")]));
    }

    #[test]
    fn test_malformed_directives() {
        for raw in ["[%eval]", "[%eval 0.3", "[% 0.3]", "[%ev2 0.3]", "[%eval [0.3]]"] {
            let comment = RawComment(raw).decode();
            assert!(comment.tags.is_empty(), "{raw}");
        }

        let comment = RawComment("[%a [%b c]").decode();
        assert_eq!(comment.text.as_deref(), Some("[%a"));
        assert_eq!(comment.tags, tags(&[("b", "c")]));
    }

    #[test]
    fn test_escaped_braces() {
        let comment = RawComment(r"see \{this\}").decode();
        assert_eq!(comment.text.as_deref(), Some("see {this}"));
    }
}
