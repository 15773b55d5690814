//! Identity types for the fieldwave runtime
//!
//! All identifiers are 64-bit so they fit the wire header and bundle entries
//! without any length prefix.

use std::fmt;

/// Device identity - unique within a network
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(pub u64);

impl DeviceId {
    pub const ZERO: DeviceId = DeviceId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        DeviceId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        DeviceId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Alignment identity - names one point of a program where values are shared
///
/// Derived from the call path only: the parent scope, the name of the routine
/// (or primitive) entered, and how many times that name was already entered
/// inside the parent scope during the current round. Never from runtime data,
/// so two devices running the same program agree on every id they both reach.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlignmentId(pub u64);

impl AlignmentId {
    /// The program root
    pub const ROOT: AlignmentId = AlignmentId(FNV_OFFSET);

    #[inline]
    pub fn new(id: u64) -> Self {
        AlignmentId(id)
    }

    /// Id of the `occurrence`-th entry into `name` below this scope
    pub fn child(self, name: &str, occurrence: u32) -> AlignmentId {
        let mut hash = fnv1a(FNV_OFFSET, &self.0.to_le_bytes());
        hash = fnv1a(hash, name.as_bytes());
        // separator so ("ab", 1) and ("a", ..) never share a byte stream
        hash = fnv1a(hash, &[0xff]);
        hash = fnv1a(hash, &occurrence.to_le_bytes());
        AlignmentId(hash)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        AlignmentId(u64::from_le_bytes(bytes))
    }
}

impl Default for AlignmentId {
    fn default() -> Self {
        AlignmentId::ROOT
    }
}

impl fmt::Debug for AlignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Align({:016x})", self.0)
    }
}

impl fmt::Display for AlignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
