use std::{error::Error, fmt};

/// The kind of a [`PgnError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PgnErrorKind {
    /// No token can be recognized at the error position.
    InvalidPgnToken,
    /// A header appeared after the move text of the game started.
    UnexpectedPgnHeader,
    /// A move is syntactically valid, but illegal or ambiguous in the
    /// position where it is played.
    InvalidMoveInPgnText,
    /// A variation was opened where no move precedes it.
    UnexpectedBeginOfVariation,
    /// A variation was closed, but none is open.
    UnexpectedEndOfVariation,
    /// A game terminator appeared while a variation is still open.
    UnexpectedEndOfGame,
    /// The text ended in the middle of a game.
    UnexpectedEndOfText,
    /// The `Variant` header names an unsupported variant.
    UnknownVariant,
    /// The `FEN` header does not describe a valid position.
    InvalidFenInPgnText,
    /// The requested game does not exist.
    InvalidGameIndex {
        /// Index that was requested.
        index: usize,
        /// Number of games that were found before the end of the text.
        found: usize,
    },
}

/// Error when reading PGN text.
///
/// Every error aborts the current read. The error records where in the text
/// it happened, so that the offending part can be pointed out to the user.
#[derive(Debug)]
pub struct PgnError {
    kind: PgnErrorKind,
    pos: Option<usize>,
    token: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl PgnError {
    pub(crate) fn new(kind: PgnErrorKind, pos: usize, token: impl Into<String>) -> PgnError {
        PgnError {
            kind,
            pos: Some(pos),
            token: token.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_game_index(index: usize, found: usize) -> PgnError {
        PgnError {
            kind: PgnErrorKind::InvalidGameIndex { index, found },
            pos: None,
            token: String::new(),
            source: None,
        }
    }

    pub(crate) fn with_source<E>(mut self, source: E) -> PgnError
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> PgnErrorKind {
        self.kind
    }

    /// Byte offset of the offending text, or `None` if the error is not
    /// tied to a position ([`PgnErrorKind::InvalidGameIndex`]).
    pub fn position(&self) -> Option<usize> {
        self.pos
    }

    /// The offending text: the token, move notation, variant name or FEN
    /// that caused the error. Empty if there is nothing to point at.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for PgnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PgnErrorKind::InvalidPgnToken => write!(f, "invalid pgn token {:?}", self.token)?,
            PgnErrorKind::UnexpectedPgnHeader => f.write_str("unexpected pgn header")?,
            PgnErrorKind::InvalidMoveInPgnText => write!(f, "invalid move {}", self.token)?,
            PgnErrorKind::UnexpectedBeginOfVariation => {
                f.write_str("unexpected begin of variation")?
            }
            PgnErrorKind::UnexpectedEndOfVariation => f.write_str("unexpected end of variation")?,
            PgnErrorKind::UnexpectedEndOfGame => {
                f.write_str("unexpected end of game: variation not closed")?
            }
            PgnErrorKind::UnexpectedEndOfText => f.write_str("unexpected end of text")?,
            PgnErrorKind::UnknownVariant => write!(f, "unknown variant {:?}", self.token)?,
            PgnErrorKind::InvalidFenInPgnText => write!(f, "invalid fen {:?}", self.token)?,
            PgnErrorKind::InvalidGameIndex { index, found } => {
                return write!(f, "invalid game index {index} (found {found} games)");
            }
        }
        if let Some(ref source) = self.source {
            write!(f, " ({source})")?;
        }
        if let Some(pos) = self.pos {
            write!(f, " at offset {pos}")?;
        }
        Ok(())
    }
}

impl Error for PgnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn Error + 'static))
    }
}
