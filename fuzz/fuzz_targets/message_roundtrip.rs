//! Structured messages through encode and decode

#![no_main]

use arbitrary::Arbitrary;
use fieldwave_core::{AlignmentId, DeviceId, ExportBundle, LogicalTime, Message, Value};
use fieldwave_wire::{decode_message, encode_message};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Leaf {
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    Device(u64),
}

#[derive(Debug, Arbitrary)]
struct Entry {
    alignment: u64,
    leaves: Vec<Leaf>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    sender: u64,
    timestamp: f64,
    entries: Vec<Entry>,
}

fn leaf(leaf: &Leaf) -> Value {
    match leaf {
        Leaf::Unit => Value::Unit,
        Leaf::Bool(b) => Value::Bool(*b),
        Leaf::Int(i) => Value::Int(*i),
        Leaf::Real(r) => Value::Real(*r),
        Leaf::Device(d) => Value::Device(DeviceId::new(*d)),
    }
}

fuzz_target!(|input: Input| {
    let bundle: ExportBundle = input
        .entries
        .iter()
        .map(|entry| {
            let value = match entry.leaves.as_slice() {
                [single] => leaf(single),
                leaves => Value::Tuple(leaves.iter().map(leaf).collect()),
            };
            (AlignmentId::new(entry.alignment), value)
        })
        .collect();
    let message = Message::new(
        DeviceId::new(input.sender),
        LogicalTime::from_secs(input.timestamp),
        bundle,
    );

    let Ok(frame) = encode_message(&message) else {
        return;
    };
    let decoded = decode_message(&frame).expect("encoded frame must decode");
    assert_eq!(decoded.sender, message.sender);
    assert_eq!(
        decoded.timestamp.to_bytes(),
        message.timestamp.to_bytes()
    );
    let ids: Vec<_> = decoded.bundle.ids().collect();
    assert_eq!(ids, message.bundle.ids().collect::<Vec<_>>());
});
