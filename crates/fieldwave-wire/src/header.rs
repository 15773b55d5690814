//! Fixed header for fieldwave messages
//!
//! Fixed header is 22 bytes:
//! - Byte 0: Version
//! - Byte 1: Flags (reserved, 0)
//! - Bytes 2-9: Sender device ID (LE)
//! - Bytes 10-17: Timestamp (LE, f64 bits)
//! - Bytes 18-21: Entry count (LE)

use fieldwave_core::{DeviceId, FieldwaveError, FieldwaveResult, LogicalTime};

/// Fixed header size in bytes
pub const FIXED_HEADER_SIZE: usize = 22;

/// Current wire protocol version
pub const WIRE_VERSION: u8 = 1;

/// Fixed header structure
#[derive(Clone, Debug, PartialEq)]
pub struct MessageHeader {
    pub version: u8,
    pub flags: u8,
    pub sender: DeviceId,
    pub timestamp: LogicalTime,
    pub entry_count: u32,
}

impl MessageHeader {
    pub fn new(sender: DeviceId, timestamp: LogicalTime, entry_count: u32) -> Self {
        MessageHeader {
            version: WIRE_VERSION,
            flags: 0,
            sender,
            timestamp,
            entry_count,
        }
    }

    /// Parse header from bytes
    pub fn parse(buf: &[u8]) -> FieldwaveResult<Self> {
        if buf.len() < FIXED_HEADER_SIZE {
            return Err(FieldwaveError::BufferTooShort {
                expected: FIXED_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        // Byte 0: Version
        let version = buf[0];
        if version != WIRE_VERSION {
            return Err(FieldwaveError::UnsupportedVersion(version));
        }

        // Byte 1: Flags
        let flags = buf[1];

        let mut word = [0u8; 8];

        // Bytes 2-9: Sender
        word.copy_from_slice(&buf[2..10]);
        let sender = DeviceId::from_bytes(word);

        // Bytes 10-17: Timestamp
        word.copy_from_slice(&buf[10..18]);
        let timestamp = LogicalTime::from_bytes(word);

        // Bytes 18-21: Entry count
        let entry_count = u32::from_le_bytes([buf[18], buf[19], buf[20], buf[21]]);

        Ok(MessageHeader {
            version,
            flags,
            sender,
            timestamp,
            entry_count,
        })
    }

    /// Serialize header to bytes
    pub fn serialize(&self, buf: &mut [u8]) -> FieldwaveResult<()> {
        if buf.len() < FIXED_HEADER_SIZE {
            return Err(FieldwaveError::BufferTooShort {
                expected: FIXED_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        buf[0] = self.version;
        buf[1] = self.flags;
        buf[2..10].copy_from_slice(&self.sender.to_bytes());
        buf[10..18].copy_from_slice(&self.timestamp.to_bytes());
        buf[18..22].copy_from_slice(&self.entry_count.to_le_bytes());

        Ok(())
    }

    /// Serialize header to a fixed array
    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_SIZE] {
        let mut buf = [0u8; FIXED_HEADER_SIZE];
        buf[0] = self.version;
        buf[1] = self.flags;
        buf[2..10].copy_from_slice(&self.sender.to_bytes());
        buf[10..18].copy_from_slice(&self.timestamp.to_bytes());
        buf[18..22].copy_from_slice(&self.entry_count.to_le_bytes());
        buf
    }
}
