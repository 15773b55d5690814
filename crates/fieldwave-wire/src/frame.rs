//! Complete message frame
//!
//! Frame = Fixed Header + Entries, where each entry is
//! [ALIGNMENT ID:8][TAGGED VALUE]

use bytes::{BufMut, Bytes, BytesMut};
use fieldwave_core::{
    AlignmentId, ExportBundle, FieldwaveError, FieldwaveResult, Message,
};

use crate::{decode_value, encode_value, encoded_len, MessageHeader, FIXED_HEADER_SIZE};

/// Maximum frame size
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Smallest possible entry: alignment id and a unit value
const MIN_ENTRY_SIZE: usize = 8 + 1;

/// Encoded size of a message
pub fn frame_size(message: &Message) -> usize {
    FIXED_HEADER_SIZE
        + message
            .bundle
            .iter()
            .map(|(_, value)| 8 + encoded_len(value))
            .sum::<usize>()
}

/// Serialize a message to a frame
pub fn encode_message(message: &Message) -> FieldwaveResult<Bytes> {
    let size = frame_size(message);
    if size > MAX_FRAME_SIZE {
        return Err(FieldwaveError::FrameTooLarge {
            size,
            max: MAX_FRAME_SIZE,
        });
    }

    let entry_count = u32::try_from(message.bundle.len()).map_err(|_| {
        FieldwaveError::InvalidWireFormat(format!("Too many entries: {}", message.bundle.len()))
    })?;
    let header = MessageHeader::new(message.sender, message.timestamp, entry_count);

    let mut buf = BytesMut::with_capacity(size);
    buf.put_slice(&header.to_bytes());
    for (id, value) in message.bundle.iter() {
        buf.put_slice(&id.to_bytes());
        encode_value(value, &mut buf)?;
    }

    Ok(buf.freeze())
}

/// Parse a frame back into a message
pub fn decode_message(buf: &[u8]) -> FieldwaveResult<Message> {
    if buf.len() > MAX_FRAME_SIZE {
        return Err(FieldwaveError::FrameTooLarge {
            size: buf.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let header = MessageHeader::parse(buf)?;
    let mut rest = &buf[FIXED_HEADER_SIZE..];

    let entry_count = header.entry_count as usize;
    if entry_count.saturating_mul(MIN_ENTRY_SIZE) > rest.len() {
        return Err(FieldwaveError::InvalidWireFormat(format!(
            "Entry count {} exceeds frame",
            entry_count
        )));
    }

    let mut bundle = ExportBundle::new();
    for _ in 0..entry_count {
        if rest.len() < 8 {
            return Err(FieldwaveError::BufferTooShort {
                expected: 8,
                actual: rest.len(),
            });
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&rest[..8]);
        rest = &rest[8..];

        let id = AlignmentId::from_bytes(word);
        if bundle.contains(id) {
            return Err(FieldwaveError::InvalidWireFormat(format!(
                "Duplicate alignment id {}",
                id
            )));
        }
        let value = decode_value(&mut rest)?;
        bundle.insert(id, value);
    }

    if !rest.is_empty() {
        return Err(FieldwaveError::InvalidWireFormat(format!(
            "{} trailing bytes",
            rest.len()
        )));
    }

    Ok(Message::new(header.sender, header.timestamp, bundle))
}
