#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_grammar::grammar::{mode_pairs, parse_mode_string};
use slirc_grammar::{ByteCursor, TokenPool};

fuzz_target!(|data: &[u8]| {
    let mut cur = ByteCursor::copy_from_slice(data);
    let mut pool = TokenPool::new();
    if let Ok(tree) = parse_mode_string(&mut cur, &mut pool) {
        let _ = mode_pairs(&tree);
        pool.release(tree);
    }
});
