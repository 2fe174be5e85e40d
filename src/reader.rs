use std::{iter::FusedIterator, mem};

use shakmaty::{san::SanError, CastlingMode, Chess};
use tracing::{debug, trace};

use crate::{
    comment::Comment,
    errors::{PgnError, PgnErrorKind},
    game::Game,
    header::{Headers, StartingPosition},
    nag::Nag,
    token::{Spanned, Token, Tokenizer},
    tree::{Annotations, Node, Variation},
};

/// Reads games from PGN text, one at a time.
///
/// # Examples
///
/// ```
/// use pgn_tree::{GameResult, Reader};
///
/// let pgn = "1. e4 e5 2. Nf3 1-0\n\n1. d4 d5 0-1";
///
/// let mut reader = Reader::new(pgn);
/// assert!(reader.skip_game()?);
///
/// let game = reader.read_game()?.expect("second game");
/// assert_eq!(game.main_variation().len(), 2);
/// assert_eq!(game.result(), GameResult::BlackWins);
///
/// assert!(reader.read_game()?.is_none());
/// # Ok::<_, pgn_tree::PgnError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    tokens: Tokenizer<'a>,
    failed: bool,
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str) -> Reader<'a> {
        Reader {
            tokens: Tokenizer::new(text),
            failed: false,
        }
    }

    /// Byte offset up to which the text has been consumed.
    pub fn position(&self) -> usize {
        self.tokens.position()
    }

    /// Reads the next game, or `None` if there are no more games.
    ///
    /// # Errors
    ///
    /// Returns a [`PgnError`] if the game is not valid. The reader should
    /// not be used any further in this case.
    pub fn read_game(&mut self) -> Result<Option<Game>, PgnError> {
        let mut headers = Headers::default();
        let mut start = StartingPosition::default();
        let mut in_game = false;

        let first = loop {
            match self.tokens.next_token()? {
                Some(Spanned {
                    token: Token::Header { key, value },
                    pos,
                    ..
                }) => {
                    in_game = true;
                    headers.apply(&mut start, key, &value.decode(), pos)?;
                }
                Some(token) => break token,
                None if in_game => return Err(self.unexpected_end_of_text()),
                None => return Ok(None),
            }
        };

        let variant = start.variant();
        let mut builder = TreeBuilder::new(start.into_position()?, variant.castling_mode());
        trace!(pos = first.pos, %variant, "move text");

        let mut spanned = first;
        loop {
            let Spanned {
                token,
                pos,
                after_blank_line,
            } = spanned;
            match token {
                Token::Header { key, .. } => {
                    return Err(PgnError::new(PgnErrorKind::UnexpectedPgnHeader, pos, key));
                }
                Token::Move(notation) => builder.play(notation).map_err(|err| {
                    PgnError::new(PgnErrorKind::InvalidMoveInPgnText, pos, notation)
                        .with_source(err)
                })?,
                Token::Nag(nag) => builder.nag(nag),
                Token::Comment(comment) => builder.comment(comment.decode(), after_blank_line),
                Token::BeginVariation => {
                    if !builder.begin_variation(after_blank_line) {
                        return Err(PgnError::new(
                            PgnErrorKind::UnexpectedBeginOfVariation,
                            pos,
                            "(",
                        ));
                    }
                }
                Token::EndVariation => {
                    if !builder.end_variation() {
                        return Err(PgnError::new(
                            PgnErrorKind::UnexpectedEndOfVariation,
                            pos,
                            ")",
                        ));
                    }
                }
                Token::EndOfGame(result) => {
                    return match builder.finish() {
                        Some(main) => Ok(Some(Game::new(headers, variant, main, result))),
                        None => Err(PgnError::new(
                            PgnErrorKind::UnexpectedEndOfGame,
                            pos,
                            result.as_str(),
                        )),
                    };
                }
            }

            spanned = match self.tokens.next_token()? {
                Some(spanned) => spanned,
                None => return Err(self.unexpected_end_of_text()),
            };
        }
    }

    /// Skips the next game without interpreting it. Returns `false` if
    /// there are no more games.
    ///
    /// Only the syntax of the tokens is checked: headers, moves and
    /// comments are not decoded.
    ///
    /// # Errors
    ///
    /// Returns a [`PgnError`] if the text contains an invalid token.
    pub fn skip_game(&mut self) -> Result<bool, PgnError> {
        while let Some(spanned) = self.tokens.next_token()? {
            if let Token::EndOfGame(_) = spanned.token {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn unexpected_end_of_text(&self) -> PgnError {
        PgnError::new(PgnErrorKind::UnexpectedEndOfText, self.tokens.end(), "")
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<Game, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let game = self.read_game().transpose();
        self.failed = matches!(game, Some(Err(_)));
        game
    }
}

impl FusedIterator for Reader<'_> {}

/// Reads all games.
///
/// # Examples
///
/// ```
/// let games = pgn_tree::read_games("1. e4 e5 *\n\n1. d4 1-0")?;
/// assert_eq!(games.len(), 2);
/// # Ok::<_, pgn_tree::PgnError>(())
/// ```
///
/// # Errors
///
/// Returns the first [`PgnError`] encountered. No games are returned in
/// this case.
pub fn read_games(text: &str) -> Result<Vec<Game>, PgnError> {
    let games = Reader::new(text).collect::<Result<Vec<_>, _>>();
    match games {
        Ok(ref games) => debug!(games = games.len(), "read pgn"),
        Err(ref err) => debug!(%err, "invalid pgn"),
    }
    games
}

/// Reads only the game at `index`, skipping over the games before it.
///
/// # Examples
///
/// ```
/// use pgn_tree::{read_game, PgnErrorKind};
///
/// let pgn = "1. e4 e5 *\n\n1. d4 1-0";
/// assert_eq!(read_game(pgn, 1)?.main_variation().len(), 1);
///
/// let err = read_game(pgn, 2).expect_err("only two games");
/// assert_eq!(err.kind(), PgnErrorKind::InvalidGameIndex { index: 2, found: 2 });
/// # Ok::<_, pgn_tree::PgnError>(())
/// ```
///
/// # Errors
///
/// Returns [`PgnErrorKind::InvalidGameIndex`] if there are not enough
/// games, or any [`PgnError`] of the skipped games and the game itself.
pub fn read_game(text: &str, index: usize) -> Result<Game, PgnError> {
    let mut reader = Reader::new(text);
    for skipped in 0..index {
        if !reader.skip_game()? {
            debug!(index, found = skipped, "game index out of range");
            return Err(PgnError::invalid_game_index(index, skipped));
        }
        trace!(skipped, pos = reader.position(), "skipped game");
    }
    match reader.read_game()? {
        Some(game) => Ok(game),
        None => {
            debug!(index, found = index, "game index out of range");
            Err(PgnError::invalid_game_index(index, index))
        }
    }
}

/// Builds the tree of moves of a game.
///
/// The variation that receives the next move is owned by the builder. The
/// variations it branches from wait on a stack, each until its child is
/// closed and attached to its last node.
#[derive(Debug)]
struct TreeBuilder {
    current: Variation,
    parents: Vec<Variation>,
    mode: CastlingMode,
}

impl TreeBuilder {
    fn new(initial: Chess, mode: CastlingMode) -> TreeBuilder {
        TreeBuilder {
            current: Variation::new(initial, false),
            parents: Vec::new(),
            mode,
        }
    }

    /// Annotations of the last move, or of the variation itself if no move
    /// has been played in it yet.
    fn annotations(&mut self) -> &mut Annotations {
        let variation = &mut self.current;
        match variation.len().checked_sub(1) {
            Some(last) => variation.nodes_mut()[last].annotations_mut(),
            None => variation.annotations_mut(),
        }
    }

    fn play(&mut self, notation: &str) -> Result<(), SanError> {
        let node = Node::play(self.current.final_position(), notation, self.mode)?;
        self.current.nodes_mut().push(node);
        Ok(())
    }

    fn nag(&mut self, nag: Nag) {
        self.annotations().add_nag(nag);
    }

    fn comment(&mut self, comment: Comment, long: bool) {
        let annotations = self.annotations();
        for (key, value) in comment.tags {
            annotations.set_tag(key, value);
        }
        annotations.set_comment(comment.text, long);
    }

    /// Opens an alternative to the last move. Returns `false` if there is
    /// no move to branch from.
    fn begin_variation(&mut self, long: bool) -> bool {
        let Some(last) = self.current.len().checked_sub(1) else {
            return false;
        };
        let initial = self.current.position_before(last).clone();
        let parent = mem::replace(&mut self.current, Variation::new(initial, long));
        self.parents.push(parent);
        true
    }

    /// Closes the innermost variation. Returns `false` if no variation is
    /// open.
    fn end_variation(&mut self) -> bool {
        let Some(parent) = self.parents.pop() else {
            return false;
        };
        let child = mem::replace(&mut self.current, parent);
        // A parent always has the move its child branched from.
        if let Some(node) = self.current.nodes_mut().last_mut() {
            node.variations_mut().push(child);
        }
        true
    }

    /// The main variation, or `None` if a variation is still open.
    fn finish(self) -> Option<Variation> {
        self.parents.is_empty().then_some(self.current)
    }
}
