//! A PGN parser that builds the complete tree of a chess game: headers,
//! moves, variations, comments and annotations. Every move is validated with
//! [`shakmaty`] as it is read.
//!
//! # Examples
//!
//! Read all games:
//!
//! ```
//! use pgn_tree::{Color, GameResult};
//!
//! let pgn = r#"[White "Kasparov, G."]
//! [Black "Deep Blue"]
//!
//! 1. e4 c6 2. d4 d5 (2... e5 $2) 3. Nc3 {Main line} *"#;
//!
//! let games = pgn_tree::read_games(pgn)?;
//! assert_eq!(games.len(), 1);
//!
//! let game = &games[0];
//! assert_eq!(game.headers().player(Color::White).name(), Some("Kasparov, G."));
//! assert_eq!(game.result(), GameResult::LineInProgress);
//!
//! let main = game.main_variation();
//! assert_eq!(main.len(), 5);
//! assert_eq!(main.nodes()[3].variations()[0].nodes()[0].san().to_string(), "e5");
//! assert_eq!(main.nodes()[4].annotations().comment(), Some("Main line"));
//! # Ok::<_, pgn_tree::PgnError>(())
//! ```
//!
//! Errors point at the offending part of the text:
//!
//! ```
//! use pgn_tree::PgnErrorKind;
//!
//! let err = pgn_tree::read_games("1. e4 e5 2. Ke3 *").expect_err("illegal move");
//! assert_eq!(err.kind(), PgnErrorKind::InvalidMoveInPgnText);
//! assert_eq!(err.position(), Some(9));
//! assert_eq!(err.token(), "Ke3");
//! ```
//!
//! # Feature flags
//!
//! * `serde`: Implements [`serde::Serialize`](https://docs.rs/serde/1/serde/trait.Serialize.html)
//!   and [`serde::Deserialize`](https://docs.rs/serde/1/serde/trait.Deserialize.html) for
//!   types with unique natural representations.
//!
//! # Logging
//!
//! Reading events are reported through [`tracing`](https://docs.rs/tracing/0.1)
//! at `debug` and `trace` level. No subscriber is installed by this crate.

#![doc(html_root_url = "https://docs.rs/pgn-tree/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docs_rs, feature(doc_auto_cfg))]

mod errors;
mod game;
mod reader;
mod tree;

pub mod comment;
pub mod header;
pub mod nag;
pub mod token;

pub use errors::{PgnError, PgnErrorKind};
pub use game::{Game, GameResult, ParseGameResultError, ParseVariantError, Variant};
pub use header::{Date, Headers, ParseDateError, Player};
pub use nag::{InvalidNag, Nag};
pub use reader::{read_game, read_games, Reader};
pub use shakmaty;
pub use shakmaty::{Chess, Color};
pub use tree::{Annotations, Node, Variation};
