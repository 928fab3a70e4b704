#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_grammar::{ByteCursor, TokenPool};

fuzz_target!(|data: &[u8]| {
    let mut cur = ByteCursor::copy_from_slice(data);
    let mut pool = TokenPool::new();
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.remainder <= data.len());
    if let Some(chain) = parsed.messages {
        // Exercise traversal and extraction on whatever parsed.
        for token in chain.walk() {
            let _ = token.to_text();
        }
        pool.release(chain);
    }
});
