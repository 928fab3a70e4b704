#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_grammar::grammar::parse_isupport;
use slirc_grammar::{ByteCursor, Isupport, TokenPool};

fuzz_target!(|data: &[u8]| {
    let mut cur = ByteCursor::copy_from_slice(data);
    let mut pool = TokenPool::new();
    if let Ok(chain) = parse_isupport(&mut cur, &mut pool) {
        let _ = Isupport::from_tokens(&chain);
        pool.release(chain);
    }
});
