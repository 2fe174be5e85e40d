#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgn_tree::{read_game, read_games, PgnErrorKind};

#[derive(Debug, Arbitrary)]
struct TestCase {
    pgn: String,
    index: u8,
}

fuzz_target!(|data: TestCase| {
    let Ok(games) = read_games(&data.pgn) else {
        return;
    };

    // Skipping must agree with reading.
    let index = usize::from(data.index);
    match read_game(&data.pgn, index) {
        Ok(game) => assert_eq!(Some(&game), games.get(index)),
        Err(err) => {
            assert!(index >= games.len());
            assert_eq!(
                err.kind(),
                PgnErrorKind::InvalidGameIndex {
                    index,
                    found: games.len()
                }
            );
        }
    }
});
