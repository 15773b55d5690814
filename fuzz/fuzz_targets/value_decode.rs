//! Arbitrary bytes into the tagged value decoder

#![no_main]

use fieldwave_wire::{decode_value, encoded_len, MAX_NESTING};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = data;
    if let Ok(value) = decode_value(&mut buf) {
        assert!(value.depth() <= MAX_NESTING);
        assert!(encoded_len(&value) <= data.len());
    }
});
