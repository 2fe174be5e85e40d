use std::{error::Error, fmt, str::FromStr};

/// A numeric annotation glyph like `?`, `+/-` or `$42`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Nag(pub u32);

/// Symbolic glyphs, ordered so that the longest spelling of each family is
/// tried first.
const GLYPHS: [(&[u8], Nag); 17] = [
    (b"!!", Nag::BRILLIANT_MOVE),
    (b"!?", Nag::SPECULATIVE_MOVE),
    (b"?!", Nag::DUBIOUS_MOVE),
    (b"??", Nag::BLUNDER),
    (b"!", Nag::GOOD_MOVE),
    (b"?", Nag::MISTAKE),
    (b"+/-", Nag::WHITE_MODERATE_ADVANTAGE),
    (b"+/=", Nag::WHITE_SLIGHT_ADVANTAGE),
    (b"+-", Nag::WHITE_DECISIVE_ADVANTAGE),
    (b"+=", Nag::WHITE_SLIGHT_ADVANTAGE),
    (b"-/+", Nag::BLACK_MODERATE_ADVANTAGE),
    (b"=/+", Nag::BLACK_SLIGHT_ADVANTAGE),
    (b"-+", Nag::BLACK_DECISIVE_ADVANTAGE),
    (b"=+", Nag::BLACK_SLIGHT_ADVANTAGE),
    (b"=", Nag::DRAWISH_POSITION),
    (b"inf", Nag::UNCLEAR_POSITION),
    (b"~", Nag::UNCLEAR_POSITION),
];

impl Nag {
    /// Tries to parse a NAG from ASCII.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgn_tree::Nag;
    ///
    /// assert_eq!(Nag::from_ascii(b"??"), Ok(Nag(4)));
    /// assert_eq!(Nag::from_ascii(b"+/-"), Ok(Nag(16)));
    /// assert_eq!(Nag::from_ascii(b"$24"), Ok(Nag(24)));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidNag`] error if the input is neither a known glyph
    /// (`?!`, `+-`, `inf`, ...) nor a positive numeric annotation (`$1`, `$42`, ...) that fits
    /// into a `u32`.
    pub fn from_ascii(s: &[u8]) -> Result<Nag, InvalidNag> {
        match Nag::scan(s) {
            Some((nag, len)) if len == s.len() => nag,
            _ => Err(InvalidNag),
        }
    }

    /// Matches a NAG at the start of `s`. Returns the parsed NAG and the
    /// number of bytes it spans, or `None` if `s` does not start with a
    /// glyph.
    ///
    /// A numeric glyph too large for a `u32` still spans its digits, but is
    /// reported as [`InvalidNag`].
    pub(crate) fn scan(s: &[u8]) -> Option<(Result<Nag, InvalidNag>, usize)> {
        if let Some(digits) = s.strip_prefix(b"$") {
            if !matches!(digits.first(), Some(b'1'..=b'9')) {
                return None;
            }
            let len = digits.iter().take_while(|ch| ch.is_ascii_digit()).count();
            let nag = btoi::btou(&digits[..len]).map(Nag).map_err(|_| InvalidNag);
            return Some((nag, len + 1));
        }

        GLYPHS
            .iter()
            .find(|(glyph, _)| s.starts_with(glyph))
            .map(|&(glyph, nag)| (Ok(nag), glyph.len()))
    }

    /// A good move (`!`).
    pub const GOOD_MOVE: Nag = Nag(1);

    /// A mistake (`?`).
    pub const MISTAKE: Nag = Nag(2);

    /// A brilliant move (`!!`).
    pub const BRILLIANT_MOVE: Nag = Nag(3);

    /// A blunder (`??`).
    pub const BLUNDER: Nag = Nag(4);

    /// A speculative move (`!?`).
    pub const SPECULATIVE_MOVE: Nag = Nag(5);

    /// A dubious move (`?!`).
    pub const DUBIOUS_MOVE: Nag = Nag(6);

    /// A drawish position (`=`).
    pub const DRAWISH_POSITION: Nag = Nag(10);

    /// An unclear position (`~` or `inf`).
    pub const UNCLEAR_POSITION: Nag = Nag(13);

    /// White has a slight advantage (`+/=` or `+=`).
    pub const WHITE_SLIGHT_ADVANTAGE: Nag = Nag(14);

    /// Black has a slight advantage (`=/+` or `=+`).
    pub const BLACK_SLIGHT_ADVANTAGE: Nag = Nag(15);

    /// White has a moderate advantage (`+/-`).
    pub const WHITE_MODERATE_ADVANTAGE: Nag = Nag(16);

    /// Black has a moderate advantage (`-/+`).
    pub const BLACK_MODERATE_ADVANTAGE: Nag = Nag(17);

    /// White has a decisive advantage (`+-`).
    pub const WHITE_DECISIVE_ADVANTAGE: Nag = Nag(18);

    /// Black has a decisive advantage (`-+`).
    pub const BLACK_DECISIVE_ADVANTAGE: Nag = Nag(19);
}

impl fmt::Display for Nag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<u32> for Nag {
    fn from(nag: u32) -> Nag {
        Nag(nag)
    }
}

impl From<Nag> for u32 {
    fn from(Nag(nag): Nag) -> u32 {
        nag
    }
}

impl FromStr for Nag {
    type Err = InvalidNag;

    fn from_str(s: &str) -> Result<Nag, InvalidNag> {
        Nag::from_ascii(s.as_bytes())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Nag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Nag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(Nag)
    }
}

/// Error when parsing an invalid NAG.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct InvalidNag;

impl fmt::Display for InvalidNag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid nag")
    }
}

impl Error for InvalidNag {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nag() {
        assert_eq!(Nag::from_ascii(b"$1"), Ok(Nag(1)));
        assert_eq!(Nag::from_ascii(b"$12"), Ok(Nag(12)));
        assert_eq!(Nag::from_ascii(b"$123"), Ok(Nag(123)));
        assert_eq!(Nag::from_ascii(b"$255"), Ok(Nag(255)));
        assert_eq!(Nag::from_ascii(b"$256"), Ok(Nag(256)));
        assert_eq!(Nag::from_ascii(b"$4294967295"), Ok(Nag(u32::MAX)));
        assert_eq!(Nag::from_ascii(b"$4294967296"), Err(InvalidNag));
        assert_eq!(Nag::from_ascii(b"$0"), Err(InvalidNag));
        assert_eq!(Nag::from_ascii(b"$"), Err(InvalidNag));
        assert_eq!(Nag::from_ascii(b"!!!"), Err(InvalidNag));
    }

    #[test]
    fn test_glyphs() {
        for (glyph, code) in [
            ("!!", 3),
            ("!", 1),
            ("!?", 5),
            ("?!", 6),
            ("?", 2),
            ("??", 4),
            ("+-", 18),
            ("+/-", 16),
            ("+/=", 14),
            ("+=", 14),
            ("=", 10),
            ("~", 13),
            ("inf", 13),
            ("=/+", 15),
            ("=+", 15),
            ("-/+", 17),
            ("-+", 19),
        ] {
            assert_eq!(glyph.parse::<Nag>(), Ok(Nag(code)), "glyph {glyph}");
        }
    }

    #[test]
    fn test_scan_is_greedy() {
        assert_eq!(Nag::scan(b"=+ e5"), Some((Ok(Nag(15)), 2)));
        assert_eq!(Nag::scan(b"= e5"), Some((Ok(Nag(10)), 1)));
        assert_eq!(Nag::scan(b"!?e5"), Some((Ok(Nag(5)), 2)));
        assert_eq!(Nag::scan(b"$14x"), Some((Ok(Nag(14)), 3)));
        assert_eq!(Nag::scan(b"$999"), Some((Ok(Nag(999)), 4)));
        assert_eq!(Nag::scan(b"$99999999999 e4"), Some((Err(InvalidNag), 12)));
        assert_eq!(Nag::scan(b"+/x"), None);
        assert_eq!(Nag::scan(b"e4"), None);
    }
}
