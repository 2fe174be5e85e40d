use std::{error::Error, fmt, num::NonZeroU32, str::FromStr};

use shakmaty::{CastlingMode, Chess, Color, Outcome, Position};

use crate::{header::Headers, tree::Variation};

/// Result of a game, as given by its terminator.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum GameResult {
    /// `1-0`
    WhiteWins,
    /// `0-1`
    BlackWins,
    /// `1/2-1/2`
    Draw,
    /// `*`, the game is not finished or the result is unknown.
    #[default]
    LineInProgress,
}

impl GameResult {
    /// Parses a game terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ParseGameResultError`] if `s` is not one of `1-0`, `0-1`,
    /// `1/2-1/2` or `*`.
    pub fn from_ascii(s: &[u8]) -> Result<GameResult, ParseGameResultError> {
        match s {
            b"1-0" => Ok(GameResult::WhiteWins),
            b"0-1" => Ok(GameResult::BlackWins),
            b"1/2-1/2" => Ok(GameResult::Draw),
            b"*" => Ok(GameResult::LineInProgress),
            _ => Err(ParseGameResultError),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::LineInProgress => "*",
        }
    }

    /// The corresponding [`Outcome`], or `None` if the game is still in
    /// progress.
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            GameResult::WhiteWins => Some(Outcome::Decisive {
                winner: Color::White,
            }),
            GameResult::BlackWins => Some(Outcome::Decisive {
                winner: Color::Black,
            }),
            GameResult::Draw => Some(Outcome::Draw),
            GameResult::LineInProgress => None,
        }
    }

    /// All results, in the order they are tried by the tokenizer.
    pub const ALL: [GameResult; 4] = [
        GameResult::WhiteWins,
        GameResult::BlackWins,
        GameResult::Draw,
        GameResult::LineInProgress,
    ];
}

impl From<Option<Outcome>> for GameResult {
    fn from(outcome: Option<Outcome>) -> GameResult {
        match outcome {
            Some(Outcome::Decisive {
                winner: Color::White,
            }) => GameResult::WhiteWins,
            Some(Outcome::Decisive {
                winner: Color::Black,
            }) => GameResult::BlackWins,
            Some(Outcome::Draw) => GameResult::Draw,
            None => GameResult::LineInProgress,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameResult {
    type Err = ParseGameResultError;

    fn from_str(s: &str) -> Result<GameResult, ParseGameResultError> {
        GameResult::from_ascii(s.as_bytes())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for GameResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for GameResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct GameResultVisitor;

        impl serde::de::Visitor<'_> for GameResultVisitor {
            type Value = GameResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("1-0, 0-1, 1/2-1/2 or *")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(GameResultVisitor)
    }
}

/// Error when parsing an invalid game result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseGameResultError;

impl fmt::Display for ParseGameResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid game result")
    }
}

impl Error for ParseGameResultError {}

/// Rules a game is played with.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Variant {
    /// Standard chess.
    #[default]
    Regular,
    /// Chess960 (Fischer Random). Castling rights may refer to rooks on any
    /// file.
    Chess960,
}

impl Variant {
    pub const fn castling_mode(self) -> CastlingMode {
        match self {
            Variant::Regular => CastlingMode::Standard,
            Variant::Chess960 => CastlingMode::Chess960,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Variant::Regular => "regular",
            Variant::Chess960 => "chess960",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ParseVariantError;

    /// Parses a variant name, ignoring case. `fischerandom` is accepted as
    /// an alias of `chess960`.
    fn from_str(s: &str) -> Result<Variant, ParseVariantError> {
        if s.eq_ignore_ascii_case("chess960") || s.eq_ignore_ascii_case("fischerandom") {
            Ok(Variant::Chess960)
        } else if s.eq_ignore_ascii_case("regular") {
            Ok(Variant::Regular)
        } else {
            Err(ParseVariantError)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Variant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Variant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct VariantVisitor;

        impl serde::de::Visitor<'_> for VariantVisitor {
            type Value = Variant;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("variant name")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(VariantVisitor)
    }
}

/// Error when parsing an unknown variant name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseVariantError;

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown variant")
    }
}

impl Error for ParseVariantError {}

/// A fully read game: headers, initial position, the tree of moves and the
/// result.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    headers: Headers,
    variant: Variant,
    main: Variation,
    result: GameResult,
}

impl Game {
    pub(crate) fn new(
        headers: Headers,
        variant: Variant,
        main: Variation,
        result: GameResult,
    ) -> Game {
        Game {
            headers,
            variant,
            main,
            result,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Position before the first move of the main line.
    pub fn initial_position(&self) -> &Chess {
        self.main.initial_position()
    }

    /// Move number of the first move, `1` unless set up by a FEN.
    pub fn initial_fullmoves(&self) -> NonZeroU32 {
        self.initial_position().fullmoves()
    }

    pub fn main_variation(&self) -> &Variation {
        &self.main
    }

    pub fn result(&self) -> GameResult {
        self.result
    }
}
