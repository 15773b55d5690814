//! Tagged value encoding
//!
//! Format: [TAG:1][PAYLOAD]
//! - Unit: no payload
//! - Bool: 1 byte (0 or 1)
//! - Int: i64 (LE)
//! - Real: f64 bits (LE)
//! - Device: u64 (LE)
//! - Tuple / List: [COUNT:4] then COUNT values
//! - Map: [COUNT:4] then COUNT key/value pairs

use bytes::{Buf, BufMut};
use fieldwave_core::{DeviceId, FieldwaveError, FieldwaveResult, Value, ValueKind};

/// Deepest container nesting accepted on either side of the wire
pub const MAX_NESTING: usize = 32;

/// Size of `value` once encoded
pub fn encoded_len(value: &Value) -> usize {
    1 + match value {
        Value::Unit => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Real(_) | Value::Device(_) => 8,
        Value::Tuple(items) | Value::List(items) => {
            4 + items.iter().map(encoded_len).sum::<usize>()
        }
        Value::Map(entries) => {
            4 + entries
                .iter()
                .map(|(k, v)| encoded_len(k) + encoded_len(v))
                .sum::<usize>()
        }
    }
}

/// Append the encoding of `value` to `buf`
pub fn encode_value<B: BufMut>(value: &Value, buf: &mut B) -> FieldwaveResult<()> {
    if value.depth() > MAX_NESTING {
        return Err(FieldwaveError::NestingTooDeep(MAX_NESTING));
    }
    put_value(value, buf)
}

fn put_value<B: BufMut>(value: &Value, buf: &mut B) -> FieldwaveResult<()> {
    buf.put_u8(value.kind().to_byte());
    match value {
        Value::Unit => {}
        Value::Bool(b) => buf.put_u8(*b as u8),
        Value::Int(i) => buf.put_i64_le(*i),
        Value::Real(r) => buf.put_f64_le(*r),
        Value::Device(id) => buf.put_u64_le(id.0),
        Value::Tuple(items) | Value::List(items) => {
            buf.put_u32_le(count_to_u32(items.len())?);
            for item in items {
                put_value(item, buf)?;
            }
        }
        Value::Map(entries) => {
            buf.put_u32_le(count_to_u32(entries.len())?);
            for (k, v) in entries {
                put_value(k, buf)?;
                put_value(v, buf)?;
            }
        }
    }
    Ok(())
}

fn count_to_u32(count: usize) -> FieldwaveResult<u32> {
    u32::try_from(count)
        .map_err(|_| FieldwaveError::InvalidWireFormat(format!("Too many elements: {}", count)))
}

/// Decode one value from the front of `buf`, advancing it
pub fn decode_value<B: Buf>(buf: &mut B) -> FieldwaveResult<Value> {
    get_value(buf, 0)
}

fn need<B: Buf>(buf: &B, expected: usize) -> FieldwaveResult<()> {
    if buf.remaining() < expected {
        return Err(FieldwaveError::BufferTooShort {
            expected,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

/// Read a container count and reject counts the remaining bytes cannot hold
fn get_count<B: Buf>(buf: &mut B, min_item_size: usize) -> FieldwaveResult<usize> {
    need(buf, 4)?;
    let count = buf.get_u32_le() as usize;
    if count.saturating_mul(min_item_size) > buf.remaining() {
        return Err(FieldwaveError::InvalidWireFormat(format!(
            "Count {} exceeds remaining {} bytes",
            count,
            buf.remaining()
        )));
    }
    Ok(count)
}

fn get_value<B: Buf>(buf: &mut B, depth: usize) -> FieldwaveResult<Value> {
    if depth > MAX_NESTING {
        return Err(FieldwaveError::NestingTooDeep(MAX_NESTING));
    }

    need(buf, 1)?;
    let tag = buf.get_u8();
    let kind = ValueKind::from_byte(tag).ok_or(FieldwaveError::UnknownValueTag(tag))?;

    let value = match kind {
        ValueKind::Unit => Value::Unit,
        ValueKind::Bool => {
            need(buf, 1)?;
            match buf.get_u8() {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(FieldwaveError::InvalidWireFormat(format!(
                        "Invalid bool byte: {}",
                        other
                    )))
                }
            }
        }
        ValueKind::Int => {
            need(buf, 8)?;
            Value::Int(buf.get_i64_le())
        }
        ValueKind::Real => {
            need(buf, 8)?;
            Value::Real(buf.get_f64_le())
        }
        ValueKind::Device => {
            need(buf, 8)?;
            Value::Device(DeviceId::new(buf.get_u64_le()))
        }
        ValueKind::Tuple | ValueKind::List => {
            let count = get_count(buf, 1)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(get_value(buf, depth + 1)?);
            }
            if kind == ValueKind::Tuple {
                Value::Tuple(items)
            } else {
                Value::List(items)
            }
        }
        ValueKind::Map => {
            let count = get_count(buf, 2)?;
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let key = get_value(buf, depth + 1)?;
                let value = get_value(buf, depth + 1)?;
                entries.push((key, value));
            }
            Value::Map(entries)
        }
    };

    Ok(value)
}
