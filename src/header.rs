//! Game headers such as `[White "Kasparov, G."]`.

use std::{borrow::Cow, error::Error, fmt, str::FromStr};

use shakmaty::{fen::Fen, Chess, Color, PositionError};

use crate::{
    comment::unescape,
    errors::{PgnError, PgnErrorKind},
    game::Variant,
};

/// A header value, excluding the quotes, as it appears in the PGN text.
///
/// Provides helper methods for decoding [backslash
/// escaped](http://www.saremba.de/chessgml/standards/pgn/pgn-complete.htm#c7)
/// values.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawHeader<'a>(pub &'a str);

impl<'a> RawHeader<'a> {
    /// Returns the raw text of the header value, still escaped.
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// Decodes escaped quotes, brackets and backslashes. Allocates only when
    /// the value actually contains escape sequences.
    pub fn decode(&self) -> Cow<'a, str> {
        unescape(self.0, b"\\\"[]")
    }
}

impl fmt::Debug for RawHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.decode())
    }
}

/// A (possibly partial) game date.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Date {
    /// Only the year is known, like `1997.??.??`.
    Year { year: u16 },
    /// Year and month are known, like `1997.05.??`.
    Month { year: u16, month: u8 },
    /// Full date, like `1997.05.11`.
    Day { year: u16, month: u8, day: u8 },
}

impl Date {
    /// Parses a date in the format of the `Date` header: `YYYY.MM.DD`,
    /// `YYYY.MM.??`, `YYYY.??.??` or just `YYYY`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseDateError`] for any other shape, or if the month is
    /// not in `1..=12` or the day not in `1..=31`.
    pub fn from_ascii(s: &[u8]) -> Result<Date, ParseDateError> {
        let year = match s.get(..4) {
            Some(digits) if digits.iter().all(u8::is_ascii_digit) => {
                btoi::btou(digits).map_err(|_| ParseDateError)?
            }
            _ => return Err(ParseDateError),
        };

        match &s[4..] {
            b"" | b".??.??" => Ok(Date::Year { year }),
            [b'.', m1, m2, b'.', b'?', b'?'] => Ok(Date::Month {
                year,
                month: month(*m1, *m2)?,
            }),
            [b'.', m1, m2, b'.', d1, d2] => Ok(Date::Day {
                year,
                month: month(*m1, *m2)?,
                day: match two_digits(*d1, *d2)? {
                    day @ 1..=31 => day,
                    _ => return Err(ParseDateError),
                },
            }),
            _ => Err(ParseDateError),
        }
    }

    pub fn year(self) -> u16 {
        match self {
            Date::Year { year } | Date::Month { year, .. } | Date::Day { year, .. } => year,
        }
    }

    pub fn month(self) -> Option<u8> {
        match self {
            Date::Year { .. } => None,
            Date::Month { month, .. } | Date::Day { month, .. } => Some(month),
        }
    }

    pub fn day(self) -> Option<u8> {
        match self {
            Date::Day { day, .. } => Some(day),
            _ => None,
        }
    }
}

fn two_digits(a: u8, b: u8) -> Result<u8, ParseDateError> {
    if a.is_ascii_digit() && b.is_ascii_digit() {
        Ok((a - b'0') * 10 + (b - b'0'))
    } else {
        Err(ParseDateError)
    }
}

fn month(a: u8, b: u8) -> Result<u8, ParseDateError> {
    match two_digits(a, b)? {
        month @ 1..=12 => Ok(month),
        _ => Err(ParseDateError),
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Date::Year { year } => write!(f, "{year:04}.??.??"),
            Date::Month { year, month } => write!(f, "{year:04}.{month:02}.??"),
            Date::Day { year, month, day } => write!(f, "{year:04}.{month:02}.{day:02}"),
        }
    }
}

impl FromStr for Date {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Date, ParseDateError> {
        Date::from_ascii(s.as_bytes())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DateVisitor;

        impl serde::de::Visitor<'_> for DateVisitor {
            type Value = Date;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("pgn date")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(DateVisitor)
    }
}

/// Error when parsing an invalid date.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseDateError;

impl fmt::Display for ParseDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid date")
    }
}

impl Error for ParseDateError {}

/// Name, rating and title of a player.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Player {
    name: Option<String>,
    elo: Option<String>,
    title: Option<String>,
}

impl Player {
    /// Name of the player, `None` if unknown.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rating of the player, exactly as written in the header.
    pub fn elo(&self) -> Option<&str> {
        self.elo.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Metadata of a game, collected from its headers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Headers {
    white: Player,
    black: Player,
    event: Option<String>,
    round: Option<String>,
    site: Option<String>,
    date: Option<Date>,
    annotator: Option<String>,
}

impl Headers {
    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn player_mut(&mut self, color: Color) -> &mut Player {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn round(&self) -> Option<&str> {
        self.round.as_deref()
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn date(&self) -> Option<Date> {
        self.date
    }

    pub fn annotator(&self) -> Option<&str> {
        self.annotator.as_deref()
    }

    /// Interprets a header. `pos` is the offset of the header in the PGN
    /// text. Unknown keys are ignored.
    pub(crate) fn apply(
        &mut self,
        start: &mut StartingPosition,
        key: &str,
        value: &str,
        pos: usize,
    ) -> Result<(), PgnError> {
        let value = value.trim();
        match key {
            "White" => self.white.name = nullable(value),
            "Black" => self.black.name = nullable(value),
            "WhiteElo" | "BlackElo" => {
                self.player_mut(color_of(key)).elo = Some(value.to_owned());
            }
            "WhiteTitle" | "BlackTitle" => {
                self.player_mut(color_of(key)).title = Some(value.to_owned());
            }
            "Event" => self.event = nullable(value),
            "Round" => self.round = nullable(value),
            "Site" => self.site = nullable(value),
            "Date" => self.date = value.parse().ok(),
            "Annotator" => self.annotator = Some(value.to_owned()),
            "FEN" => start.fen = Some((value.to_owned(), pos)),
            "Variant" => match value.parse() {
                Ok(Variant::Chess960) => start.variant = Variant::Chess960,
                _ => return Err(PgnError::new(PgnErrorKind::UnknownVariant, pos, value)),
            },
            _ => {}
        }
        Ok(())
    }
}

fn nullable(value: &str) -> Option<String> {
    if value == "?" {
        None
    } else {
        Some(value.to_owned())
    }
}

fn color_of(key: &str) -> Color {
    if key.starts_with("White") {
        Color::White
    } else {
        Color::Black
    }
}

/// Initial position of a game, as requested by its `FEN` and `Variant`
/// headers. Materialized once the move text begins.
#[derive(Clone, Debug, Default)]
pub(crate) struct StartingPosition {
    fen: Option<(String, usize)>,
    variant: Variant,
}

impl StartingPosition {
    pub(crate) fn variant(&self) -> Variant {
        self.variant
    }

    /// Sets up the initial position. Errors are reported at the offset of
    /// the `FEN` header.
    ///
    /// Castling rights without a matching king and rook and an unusable en
    /// passant square are dropped. Any other problem with the position is
    /// an error.
    pub(crate) fn into_position(self) -> Result<Chess, PgnError> {
        let (fen, pos) = match self.fen {
            Some((fen, pos)) if !fen.is_empty() => (fen, pos),
            _ => return Ok(Chess::default()),
        };

        let invalid = || PgnError::new(PgnErrorKind::InvalidFenInPgnText, pos, fen.as_str());
        let setup = Fen::from_ascii(fen.as_bytes()).map_err(|err| invalid().with_source(err))?;
        if self.variant == Variant::Regular && !is_standard_castling(&fen) {
            return Err(invalid());
        }
        setup
            .into_position(self.variant.castling_mode())
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .map_err(|err| invalid().with_source(err))
    }
}

/// Castling field of a standard FEN: `-` or letters from `KQkq`. Shredder
/// notation needs the `Variant` header.
fn is_standard_castling(fen: &str) -> bool {
    match fen.split_ascii_whitespace().nth(2) {
        Some("-") | None => true,
        Some(castling) => castling.bytes().all(|ch| matches!(ch, b'K' | b'Q' | b'k' | b'q')),
    }
}
