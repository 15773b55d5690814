//! Arbitrary bytes into the frame decoder: never panic, and every accepted
//! frame re-encodes to a frame that decodes to the same message.

#![no_main]

use fieldwave_wire::{decode_message, encode_message};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = decode_message(data) else {
        return;
    };
    let frame = encode_message(&message).expect("decoded message must re-encode");
    let again = decode_message(&frame).expect("re-encoded frame must decode");
    assert_eq!(again.sender, message.sender);
    assert_eq!(again.bundle.len(), message.bundle.len());
});
