#![no_main]

use libfuzzer_sys::fuzz_target;
use pgn_tree::token::Tokenizer;

fuzz_target!(|data: &str| {
    let mut last = 0;
    for token in Tokenizer::new(data) {
        match token {
            Ok(spanned) => {
                assert!(spanned.pos >= last);
                assert!(data.is_char_boundary(spanned.pos));
                last = spanned.pos;
            }
            Err(err) => {
                let pos = err.position().expect("token error has a position");
                assert!(pos <= data.len());
                break;
            }
        }
    }
});
